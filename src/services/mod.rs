//! Service layer for the sync service.
//!
//! - Department lookup (`departments`)
//! - Raw document normalization (`normalize`)
//! - Grouped and filtered read views (`Aggregator`)

pub mod aggregate;
pub mod departments;
pub mod normalize;

pub use aggregate::{Aggregator, CategoryListing, DepartmentGroups, StoreMetadata};
pub use normalize::normalize;
