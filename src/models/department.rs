// src/models/department.rs

//! Department categories.

use std::fmt;

use serde::{Serialize, Serializer};

/// Departments with a canonical short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
    Csbs,
    Cse,
    It,
    Ece,
    Mech,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Csbs,
        Department::Cse,
        Department::It,
        Department::Ece,
        Department::Mech,
    ];

    /// Short code used as the grouping key.
    pub fn code(self) -> &'static str {
        match self {
            Department::Csbs => "CSBS",
            Department::Cse => "CSE",
            Department::It => "IT",
            Department::Ece => "ECE",
            Department::Mech => "MECH",
        }
    }

    /// Program name as it appears in the sheet export.
    pub fn full_name(self) -> &'static str {
        match self {
            Department::Csbs => "COMPUTER SCIENCE AND BUSINESS",
            Department::Cse => "COMPUTER SCIENCE",
            Department::It => "INFORMATION TECHNOLOGY",
            Department::Ece => "ELECTRONICS AND COMMUNICATION",
            Department::Mech => "MECHANICAL ENGINEERING",
        }
    }
}

/// A student's category: a known department, or the raw value verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Known(Department),
    Other(String),
}

impl Category {
    /// Grouping key: the short code, or the raw value.
    pub fn code(&self) -> &str {
        match self {
            Category::Known(dept) => dept.code(),
            Category::Other(raw) => raw,
        }
    }

    pub fn department(&self) -> Option<Department> {
        match self {
            Category::Known(dept) => Some(*dept),
            Category::Other(_) => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
