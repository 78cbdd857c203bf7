// src/services/aggregate.rs

//! Read-side views over the document store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Student, SyncMetadata, SyncStatus};
use crate::services::normalize::{CATEGORY_ALIASES, normalize};
use crate::services::departments;
use crate::storage::{DocumentStore, FieldMatch, Filter};

/// Category code to its students, in store order.
pub type DepartmentGroups = BTreeMap<String, Vec<Student>>;

/// Students of one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    /// Canonical code, or the input verbatim when it is not a known department
    pub category: String,
    pub count: usize,
    pub students: Vec<Student>,
}

/// Collection overview for the metadata endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    pub collection_name: String,
    pub record_count: usize,
    pub categories: Vec<String>,
    pub generation: u64,
    pub last_accessed: DateTime<Utc>,
    pub last_sync: Option<SyncMetadata>,
}

/// Aggregation service. Holds no state of its own beyond handles.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn DocumentStore>,
    status: SyncStatus,
    collection: String,
}

impl Aggregator {
    pub fn new(store: Arc<dyn DocumentStore>, status: SyncStatus, collection: impl Into<String>) -> Self {
        Self {
            store,
            status,
            collection: collection.into(),
        }
    }

    /// Every student, grouped by category code.
    pub async fn get_all(&self) -> Result<DepartmentGroups> {
        let documents = self.store.find_all(&Filter::All).await?;

        let mut groups = DepartmentGroups::new();
        for document in &documents {
            let student = normalize(document);
            groups
                .entry(student.category.code().to_string())
                .or_default()
                .push(student);
        }

        log::debug!(
            "Grouped {} documents into {} categories",
            documents.len(),
            groups.len()
        );
        Ok(groups)
    }

    /// Students whose department field holds either form of `code`.
    pub async fn get_by_category(&self, code: &str) -> Result<CategoryListing> {
        // Known departments match the way `get_all` groups them: case and
        // spacing ignored. Other values match verbatim.
        let known = departments::find(code).is_some();
        let values = departments::lookup_values(code);
        let filter = Filter::AnyOf(
            CATEGORY_ALIASES
                .iter()
                .map(|field| {
                    if known {
                        FieldMatch::folded(*field, values.clone())
                    } else {
                        FieldMatch::new(*field, values.clone())
                    }
                })
                .collect(),
        );

        let students: Vec<Student> = self
            .store
            .find_all(&filter)
            .await?
            .iter()
            .map(normalize)
            .collect();

        let category = departments::canonicalize(code.trim()).code().to_string();
        log::debug!("Retrieved {} students for {}", students.len(), category);

        Ok(CategoryListing {
            category,
            count: students.len(),
            students,
        })
    }

    /// Record count, canonical categories present, and the last sync.
    pub async fn get_stats(&self) -> Result<StoreMetadata> {
        let (stats, upper, lower) = futures::try_join!(
            self.store.stats(),
            self.store.distinct_values(CATEGORY_ALIASES[0]),
            self.store.distinct_values(CATEGORY_ALIASES[1]),
        )?;

        let categories: BTreeSet<String> = upper
            .iter()
            .chain(lower.iter())
            .map(|raw| departments::canonicalize(raw).code().to_string())
            .collect();

        Ok(StoreMetadata {
            collection_name: self.collection.clone(),
            record_count: stats.count,
            categories: categories.into_iter().collect(),
            generation: stats.generation,
            last_accessed: Utc::now(),
            last_sync: self.status.get(),
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawDocument;
    use crate::storage::MemoryStore;

    fn doc(pairs: &[(&str, &str)]) -> RawDocument {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn seeded() -> Aggregator {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_all(vec![
                doc(&[("STUDENT_NAME", "Ada"), ("DEPARTMENT", "COMPUTER SCIENCE AND BUSINESS"), ("rp", "2100")]),
                doc(&[("STUDENT_NAME", "Grace"), ("department", "CSBS"), ("rp", "1600")]),
                doc(&[("STUDENT_NAME", "Linus"), ("DEPARTMENT", "COMPUTER SCIENCE")]),
                doc(&[("STUDENT_NAME", "Ken"), ("DEPARTMENT", "Civil")]),
                doc(&[("STUDENT_NAME", "Dennis")]),
            ])
            .await
            .unwrap();
        Aggregator::new(store, SyncStatus::new(), "gsheets")
    }

    #[tokio::test]
    async fn test_get_all_groups_by_code() {
        let groups = seeded().await.get_all().await.unwrap();
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["CSBS", "CSE", "Civil", "Unknown"]);

        let csbs: Vec<_> = groups["CSBS"].iter().map(|s| s.name.as_str()).collect();
        assert_eq!(csbs, vec!["Ada", "Grace"]);
    }

    #[tokio::test]
    async fn test_code_and_full_name_are_equivalent() {
        let aggregator = seeded().await;
        let by_code = aggregator.get_by_category("CSBS").await.unwrap();
        let by_name = aggregator
            .get_by_category("COMPUTER SCIENCE AND BUSINESS")
            .await
            .unwrap();

        assert_eq!(by_code.category, "CSBS");
        assert_eq!(by_name.category, "CSBS");
        assert_eq!(by_code.count, 2);
        let ids = |l: &CategoryListing| l.students.iter().map(|s| s.id().map(str::to_string)).collect::<Vec<_>>();
        assert_eq!(ids(&by_code), ids(&by_name));
    }

    #[tokio::test]
    async fn test_unknown_category_is_empty_not_error() {
        let listing = seeded().await.get_by_category("AERO").await.unwrap();
        assert_eq!(listing.category, "AERO");
        assert_eq!(listing.count, 0);
    }

    #[tokio::test]
    async fn test_by_category_agrees_with_grouping_for_mixed_case() {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_all(vec![
                doc(&[("STUDENT_NAME", "Ada"), ("DEPARTMENT", "Computer Science")]),
                doc(&[("STUDENT_NAME", "Bob"), ("DEPARTMENT", "cse")]),
                doc(&[("STUDENT_NAME", "Cy"), ("department", " Cse ")]),
                doc(&[("STUDENT_NAME", "Dee"), ("DEPARTMENT", "civil")]),
            ])
            .await
            .unwrap();
        let aggregator = Aggregator::new(store, SyncStatus::new(), "gsheets");

        let groups = aggregator.get_all().await.unwrap();
        let listing = aggregator.get_by_category("CSE").await.unwrap();
        assert_eq!(listing.count, 3);
        assert_eq!(listing.count, groups["CSE"].len());
        assert_eq!(aggregator.get_by_category("cse").await.unwrap().count, 3);

        // Unrecognized values group verbatim, so they match verbatim.
        assert_eq!(aggregator.get_by_category("civil").await.unwrap().count, 1);
        assert_eq!(aggregator.get_by_category("Civil").await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_stats_canonicalizes_categories() {
        let meta = seeded().await.get_stats().await.unwrap();
        assert_eq!(meta.record_count, 5);
        assert_eq!(meta.categories, vec!["CSBS", "CSE", "Civil"]);
        assert_eq!(meta.collection_name, "gsheets");
        assert!(meta.last_sync.is_none());
    }
}
