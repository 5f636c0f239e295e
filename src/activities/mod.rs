//! Activity table engine
//!
//! KPI/progress metrics, sort engine, filter state, row/card derivation and
//! the per-view orchestration that ties them together.

pub mod filtering;
pub mod metrics;
pub mod presentation;
pub mod registry;
pub mod sorting;
pub mod view;

pub use registry::ViewRegistry;
pub use view::{prepare, ActivityView, ViewSnapshot};
