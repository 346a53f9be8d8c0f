use csv::StringRecord;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

use crate::constants::{CATEGORY_COLUMN, EXPECTED_HEADERS};
use crate::error::{CheckError, Result};
use crate::records::PhysicalRecords;

/// Opens `path`, reporting a missing file as [`CheckError::NotFound`].
pub(crate) fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CheckError::NotFound(path.to_path_buf()),
        _ => CheckError::Io(e),
    })
}

/// Row counts per category, iterated in the order categories were first seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTally {
    counts: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, category: &str) {
        match self.positions.get(category) {
            Some(&pos) => self.counts[pos].1 += 1,
            None => {
                self.positions
                    .insert(category.to_string(), self.counts.len());
                self.counts.push((category.to_string(), 1));
            }
        }
    }

    pub fn count(&self, category: &str) -> usize {
        self.positions
            .get(category)
            .map_or(0, |&pos| self.counts[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(name, n)| (name.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of rows that contributed to the tally
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Header row as found in the file, compared against [`EXPECTED_HEADERS`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCheck {
    pub found: Vec<String>,
}

impl HeaderCheck {
    pub fn new(record: &StringRecord) -> Self {
        Self {
            found: record.iter().map(str::to_string).collect(),
        }
    }

    /// Exact, ordered, case-sensitive comparison
    pub fn matches(&self) -> bool {
        self.found
            .iter()
            .map(String::as_str)
            .eq(EXPECTED_HEADERS.iter().copied())
    }
}

impl fmt::Display for HeaderCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Headers found: {:?}", self.found)?;
        writeln!(f, "Expected headers: {:?}", EXPECTED_HEADERS)?;
        if self.matches() {
            writeln!(f, "CSV structure is correct!")
        } else {
            writeln!(f, "CSV structure doesn't match expected format")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataStats {
    pub total_rows: usize,
    pub categories: CategoryTally,
}

impl DataStats {
    /// Counts the row; rows too short to carry a category only count toward the total.
    pub fn add_row(&mut self, row: &StringRecord) {
        self.total_rows += 1;
        if let Some(category) = row.get(CATEGORY_COLUMN) {
            self.categories.record(category);
        }
    }
}

impl fmt::Display for DataStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Data stats:")?;
        writeln!(f, "  Total terms: {}", self.total_rows)?;
        writeln!(f)?;
        writeln!(f, "Terms by category:")?;
        for (category, count) in self.categories.iter() {
            writeln!(f, "  {}: {} terms", category, count)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    pub header: HeaderCheck,
    pub stats: DataStats,
}

impl StructureReport {
    pub fn is_valid(&self) -> bool {
        self.header.matches()
    }
}

/// Result of a check as seen by the caller. The console message has already
/// been written when this is returned.
#[derive(Debug)]
pub enum CheckOutcome {
    Checked(StructureReport),
    FileNotFound,
    Failed(String),
}

/// Reads CSV from `reader`, writing the header section to `out` as soon as the
/// header is parsed and the statistics section once every row has been read.
/// Blank lines are data rows with no cells.
pub fn check_reader<R: Read, W: Write>(reader: R, out: &mut W) -> Result<StructureReport> {
    let mut records = PhysicalRecords::new(BufReader::new(reader));

    let header_record = records.next().ok_or(CheckError::MissingHeader)??;
    let header = HeaderCheck::new(&header_record);
    // Rows are decoded lazily, so a bad byte further down is reported after
    // this section rather than instead of it.
    write!(out, "{}", header)?;
    if !header.matches() {
        warn!(found = ?header.found, "header does not match expected schema");
    }

    let mut stats = DataStats::default();
    for result in records {
        let row = result?;
        stats.add_row(&row);
    }
    debug!(
        rows = stats.total_rows,
        categorized = stats.categories.total(),
        "rows tallied"
    );
    write!(out, "{}", stats)?;

    Ok(StructureReport { header, stats })
}

pub fn check_csv_structure<W: Write>(path: &Path, out: &mut W) -> Result<StructureReport> {
    let file = open_file(path)?;
    check_reader(file, out)
}

/// Checks the file at `path`, reporting every outcome on `out`. Errors are
/// printed and folded into the returned [`CheckOutcome`], never propagated.
#[instrument(skip(path, out), fields(path = %path.display()))]
pub fn run_check<W: Write>(path: &Path, out: &mut W) -> CheckOutcome {
    match check_csv_structure(path, out) {
        Ok(report) => {
            info!(
                rows = report.stats.total_rows,
                categories = report.stats.categories.len(),
                valid = report.is_valid(),
                "check finished"
            );
            CheckOutcome::Checked(report)
        }
        Err(err) => {
            let message = err.user_message();
            let _ = writeln!(out, "{}", message);
            match err {
                CheckError::NotFound(_) => {
                    warn!("file not found");
                    CheckOutcome::FileNotFound
                }
                other => {
                    error!(error = %other, "check failed");
                    CheckOutcome::Failed(message)
                }
            }
        }
    }
}
