// src/pipeline/parse.rs

//! Record parser for the sheet's CSV export.

use std::collections::BTreeMap;

use csv::{ReaderBuilder, Trim};

use crate::error::{AppError, Result};

/// One data row keyed by header name.
pub type SheetRow = BTreeMap<String, String>;

/// Parse delimited text with a header row into one mapping per data row.
///
/// - Empty lines and rows whose cells are all blank are skipped.
/// - Headers and values are trimmed.
/// - A row shorter than the header leaves the missing fields unset; cells
///   beyond the last header are dropped.
/// - Unbalanced quoting is rejected.
pub fn parse_records(text: &str) -> Result<Vec<SheetRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    check_quoting(text)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() > headers.len() {
            log::warn!(
                "Row {} has {} cells but the header has {}; extra cells dropped",
                index + 2,
                record.len(),
                headers.len()
            );
        }

        let row: SheetRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Every quote in well-formed CSV is either a field delimiter or half of an
/// escaped pair, so the total count is even.
fn check_quoting(text: &str) -> Result<()> {
    let mut open_line = None;
    let mut inside = false;
    for (line_no, line) in text.lines().enumerate() {
        for c in line.chars() {
            if c == '"' {
                inside = !inside;
                if inside {
                    open_line = Some(line_no + 1);
                }
            }
        }
    }

    if inside {
        return Err(AppError::parse(format!(
            "unbalanced quoting: quote opened on line {} is never closed",
            open_line.unwrap_or(1)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_and_rows() {
        let rows = parse_records(
            "NAME,ROLL_NO,DEPARTMENT,CUMULATIVE_REWARD_POINTS\nJohn Doe,21CS01,COMPUTER SCIENCE,2200",
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["NAME"], "John Doe");
        assert_eq!(rows[0]["ROLL_NO"], "21CS01");
        assert_eq!(rows[0]["DEPARTMENT"], "COMPUTER SCIENCE");
        assert_eq!(rows[0]["CUMULATIVE_REWARD_POINTS"], "2200");
    }

    #[test]
    fn test_skips_empty_lines_and_blank_rows() {
        let rows = parse_records("a,b\n\n1,2\n   \n,\n3,4\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], "3");
    }

    #[test]
    fn test_trims_headers_and_values() {
        let rows = parse_records(" name , points \n  Ada Lovelace ,  1800 ").unwrap();
        assert_eq!(rows[0]["name"], "Ada Lovelace");
        assert_eq!(rows[0]["points"], "1800");
    }

    #[test]
    fn test_quoted_fields() {
        let rows =
            parse_records("name,note\n\"Doe, John\",\"said \"\"hi\"\"\nthen left\"").unwrap();
        assert_eq!(rows[0]["name"], "Doe, John");
        assert_eq!(rows[0]["note"], "said \"hi\"\nthen left");
    }

    #[test]
    fn test_short_row_leaves_fields_unset() {
        let rows = parse_records("a,b,c\n1,2").unwrap();
        assert_eq!(rows[0].get("a").map(String::as_str), Some("1"));
        assert_eq!(rows[0].get("b").map(String::as_str), Some("2"));
        assert!(rows[0].get("c").is_none());
    }

    #[test]
    fn test_long_row_drops_extra_cells() {
        let rows = parse_records("a,b\n1,2,3,4").unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_unbalanced_quote_is_parse_error() {
        let err = parse_records("a,b\n\"open,2\n3,4").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_header_only_and_empty_input() {
        assert!(parse_records("a,b,c\n").unwrap().is_empty());
        assert!(parse_records("").unwrap().is_empty());
    }

    #[test]
    fn test_strips_byte_order_mark() {
        let rows = parse_records("\u{feff}STUDENT_NAME\nAda").unwrap();
        assert_eq!(rows[0]["STUDENT_NAME"], "Ada");
    }
}
