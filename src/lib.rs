pub mod checker;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod records;
pub mod terms;
