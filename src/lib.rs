//! Turns the aggregated-score and question-detail exports into a per-student
//! dashboard view model.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod detail;
pub mod error;
pub mod filter;
pub mod identity;
pub mod ingest;
pub mod models;
pub mod report;
pub mod session;
pub mod store;
pub mod view;

pub use session::{Session, StudentLookup};
pub use store::RecordStore;
pub use view::StudentViewModel;
