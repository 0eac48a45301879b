// Core algorithm exports
pub mod address;
pub mod batch;
pub mod builder;
pub mod distance;
pub mod enrich;
pub mod ppsf;

pub use address::normalize_address;
pub use batch::{valuate, valuate_subject, BatchOptions, BatchProcessor, BatchReport, BatchSummary, ValuationError};
pub use builder::{build_valuation, flat_table};
pub use distance::{haversine_miles, distance_between};
pub use enrich::{enrich_subject, EnrichOutcome, EnrichmentIndex};
pub use ppsf::estimate_arv;
