use csv::{ReaderBuilder, StringRecord};
use std::io::{BufRead, Lines};

use crate::error::Result;

const BOM: char = '\u{feff}';

/// Yields one [`StringRecord`] per CSV record in the input, blank lines
/// included as records with no cells. A quoted field may span lines. A byte
/// order mark at the start of a record stays on its first cell.
pub struct PhysicalRecords<R> {
    lines: Lines<R>,
}

impl<R: BufRead> PhysicalRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for PhysicalRecords<R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        while ends_inside_quotes(&text) {
            match self.lines.next() {
                Some(Ok(line)) => {
                    text.push('\n');
                    text.push_str(&line);
                }
                Some(Err(e)) => return Some(Err(e.into())),
                // unterminated quote at end of input
                None => break,
            }
        }

        let keep_bom = text.starts_with(BOM);
        Some(parse_record(&text, keep_bom))
    }
}

fn parse_record(text: &str, keep_bom: bool) -> Result<StringRecord> {
    if text.is_empty() {
        return Ok(StringRecord::new());
    }
    let body = if keep_bom { &text[BOM.len_utf8()..] } else { text };

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    let mut record = StringRecord::new();
    rdr.read_record(&mut record)?;

    if !keep_bom {
        return Ok(record);
    }
    // the csv reader drops a BOM, put it back on the first cell
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    match fields.first_mut() {
        Some(first) => first.insert(0, BOM),
        None => fields.push(BOM.to_string()),
    }
    Ok(StringRecord::from(fields))
}

/// True when `text` ends inside a quoted field. Quotes only open a field at
/// its first character; `""` inside a quoted field is an escaped quote.
fn ends_inside_quotes(text: &str) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            ',' | '\n' => field_start = true,
            _ => field_start = false,
        }
    }
    in_quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckError;

    fn records(input: &str) -> Vec<Vec<String>> {
        PhysicalRecords::new(input.as_bytes())
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn blank_lines_become_empty_records() {
        let rows = records("a,b\n\n1,2\n\n");
        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec!["1", "2"]);
        assert!(rows[3].is_empty());
    }

    #[test]
    fn crlf_lines_are_split() {
        let rows = records("a,b\r\n\r\n1,2\r\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec![], vec!["1", "2"]]);
    }

    #[test]
    fn quoted_field_spans_lines() {
        let rows = records("id,desc\n1,\"first line\n\nthird, line\"\n2,x\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], "first line\n\nthird, line");
        assert_eq!(rows[2], vec!["2", "x"]);
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let rows = records("1,5'6\" tall,x\n2,y\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "5'6\" tall");
    }

    #[test]
    fn escaped_quotes_do_not_close_field() {
        assert!(!ends_inside_quotes("1,\"say \"\"hi\"\"\",2"));
        assert!(ends_inside_quotes("1,\"say \"\"hi"));
    }

    #[test]
    fn bom_is_kept_on_first_cell() {
        let rows = records("\u{feff}id,term\nx,\u{feff}y\n");
        assert_eq!(rows[0], vec!["\u{feff}id", "term"]);
        assert_eq!(rows[1], vec!["x", "\u{feff}y"]);

        let rows = records("\u{feff}\n1\n");
        assert_eq!(rows[0], vec!["\u{feff}"]);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let input: &[u8] = b"id\n\xff\xfe\n";
        let mut iter = PhysicalRecords::new(input);
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(iter.next().unwrap(), Err(CheckError::Io(_))));
    }
}
