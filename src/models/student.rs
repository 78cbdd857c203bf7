// src/models/student.rs

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::{Category, RawDocument};

/// Standing derived from a student's reward points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Active,
    Warning,
    AtRisk,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Warning => "warning",
            Status::AtRisk => "at-risk",
        }
    }
}

/// A normalized view of one raw document.
///
/// Computed on every read and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub name: String,
    pub identifier: String,
    pub category: Category,
    pub score: u64,
    pub status: Status,
    pub initials: String,
    pub email: String,
    pub mentor: String,
    pub year: String,
    /// Source document, merged beneath the derived fields on output.
    pub raw: RawDocument,
}

impl Student {
    pub fn id(&self) -> Option<&str> {
        self.raw.id()
    }
}

impl Serialize for Student {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.raw.fields().clone();
        let derived = [
            ("name", Value::from(self.name.as_str())),
            ("identifier", Value::from(self.identifier.as_str())),
            ("category", Value::from(self.category.code())),
            ("score", Value::from(self.score)),
            ("status", Value::from(self.status.as_str())),
            ("initials", Value::from(self.initials.as_str())),
            ("email", Value::from(self.email.as_str())),
            ("mentor", Value::from(self.mentor.as_str())),
            ("year", Value::from(self.year.as_str())),
            // Keys the dashboard client reads
            ("rp", Value::from(self.score)),
            ("avatar", Value::from(self.initials.as_str())),
            ("rollNo", Value::from(self.identifier.as_str())),
            ("department", Value::from(self.category.code())),
        ];
        for (key, value) in derived {
            map.insert(key.to_string(), value);
        }
        map.serialize(serializer)
    }
}
