// src/services/normalize.rs

//! Raw document to `Student` projection.
//!
//! Sheet columns drift between exports, so each canonical attribute is read
//! from an ordered alias list. Exact field names are tried first; if none is
//! present the same aliases are matched ignoring case (`NAME` finds `name`).

use unicode_segmentation::UnicodeSegmentation;

use crate::models::{RawDocument, Status, Student};
use crate::services::departments;

pub const NAME_ALIASES: &[&str] = &["STUDENT_NAME", "name"];
pub const SCORE_ALIASES: &[&str] = &["CUMULATIVE_REWARD_POINTS", "rp", "reward_points", "points"];
pub const IDENTIFIER_ALIASES: &[&str] = &["ROLL_NO"];
pub const CATEGORY_ALIASES: &[&str] = &["DEPARTMENT", "department"];
pub const EMAIL_ALIASES: &[&str] = &["email"];
pub const MENTOR_ALIASES: &[&str] = &["MENTOR_NAME"];
pub const YEAR_ALIASES: &[&str] = &["YEAR"];

/// Category used when a document has no department field.
pub const DEFAULT_CATEGORY: &str = "Unknown";

/// Lowest score classified as active.
pub const ACTIVE_MIN_SCORE: u64 = 2000;
/// Lowest score classified as warning.
pub const WARNING_MIN_SCORE: u64 = 1500;

/// Classify a score against the fixed thresholds.
pub fn classify(score: u64) -> Status {
    if score >= ACTIVE_MIN_SCORE {
        Status::Active
    } else if score >= WARNING_MIN_SCORE {
        Status::Warning
    } else {
        Status::AtRisk
    }
}

/// Read the leading integer of `input`.
///
/// `"2200.5"` reads as 2200 and `"1500 pts"` as 1500. Negative or
/// non-numeric input reads as 0; values beyond `u64` saturate.
pub fn parse_score(input: &str) -> u64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: u64 = 0;
    let mut any = false;
    for digit in digits {
        any = true;
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(digit - b'0'));
    }

    if !any || negative { 0 } else { value }
}

/// Display initials: first grapheme of up to two words, uppercased.
pub fn initials(name: &str) -> String {
    let joined: String = name
        .split_whitespace()
        .filter_map(|word| word.graphemes(true).next())
        .collect::<String>()
        .to_uppercase();

    if joined.is_empty() {
        return "?".to_string();
    }
    joined.graphemes(true).take(2).collect()
}

/// First alias present in `document`, exact names before case-folded ones.
fn resolve(document: &RawDocument, aliases: &[&str]) -> Option<String> {
    document.first_text(aliases).or_else(|| {
        aliases.iter().find_map(|alias| {
            document
                .fields()
                .keys()
                .find(|key| key.eq_ignore_ascii_case(alias))
                .and_then(|key| document.text(key))
        })
    })
}

/// Project a raw document onto a `Student`. Never fails.
pub fn normalize(document: &RawDocument) -> Student {
    let name = resolve(document, NAME_ALIASES).unwrap_or_default();
    let score = resolve(document, SCORE_ALIASES)
        .map(|s| parse_score(&s))
        .unwrap_or(0);
    let category = resolve(document, CATEGORY_ALIASES)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Student {
        initials: initials(&name),
        identifier: resolve(document, IDENTIFIER_ALIASES).unwrap_or_default(),
        category: departments::canonicalize(&category),
        status: classify(score),
        score,
        email: resolve(document, EMAIL_ALIASES).unwrap_or_default(),
        mentor: resolve(document, MENTOR_ALIASES).unwrap_or_default(),
        year: resolve(document, YEAR_ALIASES).unwrap_or_default(),
        name,
        raw: document.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Department};
    use serde_json::{Value, json};

    fn doc(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => RawDocument::from(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0), Status::AtRisk);
        assert_eq!(classify(1499), Status::AtRisk);
        assert_eq!(classify(1500), Status::Warning);
        assert_eq!(classify(1999), Status::Warning);
        assert_eq!(classify(2000), Status::Active);
        assert_eq!(classify(u64::MAX), Status::Active);
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("2200"), 2200);
        assert_eq!(parse_score(" 2200.5"), 2200);
        assert_eq!(parse_score("1500 pts"), 1500);
        assert_eq!(parse_score("+12"), 12);
        assert_eq!(parse_score("-40"), 0);
        assert_eq!(parse_score("n/a"), 0);
        assert_eq!(parse_score(""), 0);
        assert_eq!(parse_score("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("John Doe"), "JD");
        assert_eq!(initials("ada"), "A");
        assert_eq!(initials("  mary   jane watson "), "MJ");
        assert_eq!(initials(""), "?");
        assert_eq!(initials("   "), "?");
        assert_eq!(initials("émile zola"), "ÉZ");
    }

    #[test]
    fn test_alias_precedence() {
        let student = normalize(&doc(json!({
            "STUDENT_NAME": "Grace Hopper",
            "name": "ignored",
            "CUMULATIVE_REWARD_POINTS": "",
            "rp": "1800",
            "points": "5000",
        })));
        assert_eq!(student.name, "Grace Hopper");
        assert_eq!(student.score, 1800);
        assert_eq!(student.status, Status::Warning);
    }

    #[test]
    fn test_case_folded_alias() {
        let student = normalize(&doc(json!({
            "NAME": "John Doe",
            "ROLL_NO": "21CS01",
            "DEPARTMENT": "COMPUTER SCIENCE",
            "CUMULATIVE_REWARD_POINTS": "2200",
        })));
        assert_eq!(student.name, "John Doe");
        assert_eq!(student.identifier, "21CS01");
        assert_eq!(student.category, Category::Known(Department::Cse));
        assert_eq!(student.score, 2200);
        assert_eq!(student.status, Status::Active);
        assert_eq!(student.initials, "JD");
    }

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let student = normalize(&doc(json!({"ROLL_NO": "21IT07"})));
        assert_eq!(student.score, 0);
        assert_eq!(student.status, Status::AtRisk);
        assert_eq!(student.name, "");
        assert_eq!(student.initials, "?");
        assert_eq!(student.category, Category::Other("Unknown".into()));
    }

    #[test]
    fn test_numeric_json_score() {
        let student = normalize(&doc(json!({"rp": 2050, "department": "ECE"})));
        assert_eq!(student.score, 2050);
        assert_eq!(student.category, Category::Known(Department::Ece));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = doc(json!({
            "STUDENT_NAME": "Linus Torvalds",
            "DEPARTMENT": "Civil",
            "points": "1499",
            "extra": [1, 2],
        }));
        assert_eq!(normalize(&input), normalize(&input));
        assert_eq!(
            serde_json::to_value(normalize(&input)).unwrap(),
            serde_json::to_value(normalize(&input)).unwrap()
        );
    }

    #[test]
    fn test_derived_fields_win_on_output() {
        let student = normalize(&doc(json!({
            "name": "Ada Lovelace",
            "status": "stale",
            "rp": "2000",
            "MENTOR_NAME": "Babbage",
        })));
        let value = serde_json::to_value(&student).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["score"], 2000);
        assert_eq!(value["mentor"], "Babbage");
        assert_eq!(value["MENTOR_NAME"], "Babbage");
        assert_eq!(value["category"], "Unknown");
    }

    #[test]
    fn test_client_keys_mirror_derived_fields() {
        let student = normalize(&doc(json!({
            "STUDENT_NAME": "Grace Hopper",
            "ROLL_NO": "21CS02",
            "department": "computer science",
            "rp": "1500 pts",
            "avatar": "stale.png",
        })));
        let value = serde_json::to_value(&student).unwrap();
        assert_eq!(value["rp"], 1500);
        assert_eq!(value["avatar"], "GH");
        assert_eq!(value["rollNo"], "21CS02");
        assert_eq!(value["department"], "CSE");
        assert_eq!(value["rp"], value["score"]);
        assert_eq!(value["department"], value["category"]);
    }
}
