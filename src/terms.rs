use csv::{ReaderBuilder, Trim};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

use crate::checker::open_file;
use crate::constants::{ALL_CATEGORIES, PREVIEW_CHARS, UNCATEGORIZED};
use crate::error::Result;

/// One rail term, keyed by the file's own header names
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Term {
    pub id: String,
    pub term: String,
    pub full_form: String,
    pub category: String,
    pub description: String,
    pub common_use: String,
}

impl Term {
    pub fn display_category(&self) -> String {
        format_category(&self.category)
    }

    fn matches_query(&self, normalized_query: &str) -> bool {
        let search_text = format!(
            "{} {} {} {} {}",
            self.term, self.full_form, self.description, self.common_use, self.category
        )
        .to_lowercase();
        search_text.contains(normalized_query)
    }
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Parses every data row of a terms CSV. Rows that cannot be read as a
/// [`Term`] are logged and skipped. A missing id becomes the row's position
/// among the non-blank data rows, starting at 1.
pub fn read_terms<R: Read>(reader: R) -> Result<Vec<Term>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    debug!(headers = ?headers, "term headers");

    let mut terms = Vec::new();
    let mut row_index: usize = 0;
    for result in rdr.records() {
        let mut record = match result {
            Ok(record) => record,
            Err(e) => {
                row_index += 1;
                warn!(row = row_index, error = %e, "skipping unreadable row");
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        row_index += 1;

        while record.len() < headers.len() {
            record.push_field("");
        }
        match record.deserialize::<Term>(Some(&headers)) {
            Ok(mut term) => {
                if term.id.is_empty() {
                    term.id = row_index.to_string();
                }
                terms.push(term);
            }
            Err(e) => warn!(row = row_index, error = %e, "skipping malformed term"),
        }
    }

    Ok(terms)
}

#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_terms(path: &Path) -> Result<Vec<Term>> {
    let file = open_file(path)?;
    let terms = read_terms(file)?;
    debug!(count = terms.len(), "terms loaded");
    Ok(terms)
}

/// Case-insensitive substring search over term, full form, description,
/// common use and category. An empty query returns every term.
pub fn search<'a>(terms: &'a [Term], query: &str) -> Vec<&'a Term> {
    let normalized_query = query.trim().to_lowercase();
    if normalized_query.is_empty() {
        return terms.iter().collect();
    }
    terms
        .iter()
        .filter(|t| t.matches_query(&normalized_query))
        .collect()
}

/// Exactly `all` selects every term, anything else is a case-insensitive
/// category match.
pub fn filter_by_category<'a>(terms: &'a [Term], category: &str) -> Vec<&'a Term> {
    if category == ALL_CATEGORIES {
        return terms.iter().collect();
    }
    let wanted = category.to_lowercase();
    terms
        .iter()
        .filter(|t| !t.category.is_empty() && t.category.to_lowercase() == wanted)
        .collect()
}

/// Looks a term up by exact id, then by case-insensitive acronym.
pub fn find_term<'a>(terms: &'a [Term], key: &str) -> Option<&'a Term> {
    let key = key.trim();
    terms.iter().find(|t| t.id == key).or_else(|| {
        terms
            .iter()
            .find(|t| !t.term.is_empty() && t.term.eq_ignore_ascii_case(key))
    })
}

pub fn pick_random<'a, R: Rng + ?Sized>(selection: &[&'a Term], rng: &mut R) -> Option<&'a Term> {
    selection.choose(rng).copied()
}

/// `rolling-stock` -> `Rolling Stock`
pub fn format_category(category: &str) -> String {
    if category.is_empty() || category == UNCATEGORIZED {
        return "Uncategorized".to_string();
    }
    category
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// One line per term plus a description preview, then the match count.
pub fn write_listing<W: Write>(out: &mut W, matches: &[&Term]) -> io::Result<()> {
    for term in matches {
        writeln!(
            out,
            "{} - {} [{}]",
            term.term,
            or_fallback(&term.full_form, "No full form"),
            term.display_category()
        )?;
        writeln!(
            out,
            "    {}",
            preview(or_fallback(&term.description, "No description"), PREVIEW_CHARS)
        )?;
    }
    let plural = if matches.len() == 1 { "" } else { "s" };
    writeln!(out, "\n{} term{}", matches.len(), plural)
}

pub fn write_detail<W: Write>(out: &mut W, term: &Term) -> io::Result<()> {
    writeln!(out, "{}", or_fallback(&term.full_form, "Unknown Term"))?;
    if !term.term.is_empty() {
        writeln!(out, "  {}", term.term)?;
    }
    writeln!(out, "Category: {}", term.display_category())?;
    writeln!(out)?;
    writeln!(out, "Definition")?;
    writeln!(
        out,
        "  {}",
        or_fallback(&term.description, "No description available")
    )?;
    if !term.common_use.is_empty() {
        writeln!(out)?;
        writeln!(out, "Common Use")?;
        writeln!(out, "  {}", term.common_use)?;
    }
    writeln!(out)?;
    writeln!(out, "ID: {}", or_fallback(&term.id, "N/A"))
}

/// Loads the terms at `path` and hands them to `render`. Load failures are
/// printed with the checker's messages instead of being returned.
fn with_terms<W, F>(path: &Path, out: &mut W, render: F) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&[Term], &mut W) -> io::Result<()>,
{
    match load_terms(path) {
        Ok(terms) => render(&terms, out),
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to load terms");
            writeln!(out, "{}", e.user_message())
        }
    }
}

pub fn list_terms<W, F>(path: &Path, out: &mut W, select: F) -> io::Result<()>
where
    W: Write,
    F: for<'a> Fn(&'a [Term]) -> Vec<&'a Term>,
{
    with_terms(path, out, |terms, out| {
        let matches = select(terms);
        info!(loaded = terms.len(), matched = matches.len(), "terms selected");
        write_listing(out, &matches)
    })
}

pub fn show_term<W: Write>(path: &Path, key: &str, out: &mut W) -> io::Result<()> {
    with_terms(path, out, |terms, out| match find_term(terms, key) {
        Some(term) => write_detail(out, term),
        None => writeln!(out, "No term matching '{}'", key),
    })
}

/// Shows a random term, optionally restricted to one category.
pub fn lucky_term<W, R>(path: &Path, category: Option<&str>, rng: &mut R, out: &mut W) -> io::Result<()>
where
    W: Write,
    R: Rng + ?Sized,
{
    with_terms(path, out, |terms, out| {
        let selection = filter_by_category(terms, category.unwrap_or(ALL_CATEGORIES));
        match pick_random(&selection, rng) {
            Some(term) => {
                debug!(term = %term.term, "random term selected");
                write_detail(out, term)
            }
            None => writeln!(out, "No terms to pick from"),
        }
    })
}
