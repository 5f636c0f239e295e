//! Service layer modules for external integrations.
//!
//! Contains clients for the ActivityService (data source) and the export
//! service (PDF/Excel rendering).

pub mod activity_client;
pub mod export_client;

pub use activity_client::{ActivityServiceClient, ActivitySource, FetchContext};
pub use export_client::{ExportServiceClient, ExportSink};
