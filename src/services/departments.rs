// src/services/departments.rs

//! Department code and program name lookup.

use crate::models::{Category, Department};
use crate::utils::fold_key;

/// Find the department whose code or full program name matches `input`.
pub fn find(input: &str) -> Option<Department> {
    let folded = fold_key(input);
    if folded.is_empty() {
        return None;
    }
    Department::ALL
        .into_iter()
        .find(|dept| dept.code() == folded || dept.full_name() == folded)
}

/// Map a raw department value onto a category.
///
/// Known codes and program names become `Category::Known`; anything else is
/// kept verbatim.
pub fn canonicalize(raw: &str) -> Category {
    match find(raw) {
        Some(dept) => Category::Known(dept),
        None => Category::Other(raw.to_string()),
    }
}

/// Values a stored department field may hold for `input`.
///
/// For a known department this is both the code and the program name, so a
/// lookup by either finds rows written either way. Unknown inputs match
/// only themselves.
pub fn lookup_values(input: &str) -> Vec<String> {
    match find(input) {
        Some(dept) => vec![dept.code().to_string(), dept.full_name().to_string()],
        None => vec![input.trim().to_string()],
    }
}
