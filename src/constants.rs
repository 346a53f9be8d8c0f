/// Column names every rail terms file must carry, in order
pub const EXPECTED_HEADERS: [&str; 6] = [
    "id",
    "term",
    "fullForm",
    "category",
    "description",
    "commonUse",
];

/// File checked when no path is given on the command line or in config
pub const DEFAULT_CSV_FILE: &str = "BritishRailTerms.csv";

/// Optional config file looked up in the working directory
pub const CONFIG_FILE: &str = "rail_terms.toml";

pub const DEFAULT_LOG_FILTER: &str = "rail_terms=warn";

/// Zero-based index of the category cell in a data row
pub const CATEGORY_COLUMN: usize = 3;

// Category filter values
pub const ALL_CATEGORIES: &str = "all";
pub const UNCATEGORIZED: &str = "uncategorized";

/// Description preview length used by the term listings
pub const PREVIEW_CHARS: usize = 100;
