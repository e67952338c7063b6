//! Property market exploration: load the static tables once, resolve a region,
//! derive its metrics, then render views or downloadable reports.

pub mod dataset;
pub mod format;
pub mod metrics;
pub mod report;
pub mod resolver;
pub mod router;
pub mod views;

pub use dataset::{DatasetBuilder, DatasetBundle, LoadSummary};
pub use router::market_router;
