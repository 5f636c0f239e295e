//! Domain types and DTOs
//!
//! These types define the data structures exchanged with the ActivityService,
//! the export service and the front-end.

pub mod activities;
pub mod exports;
pub mod filters;

