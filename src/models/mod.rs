// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    PropertyAttributes, SubjectProperty, ComparableSale, EstimatorParams, PpsfEstimate,
    CompMetrics, ValuationResult, FlatValue, FlatTable,
};
pub use requests::{CompsFeedEntry, ResultFormat, ValuationRequest};
pub use responses::{ValuationResponse, HealthResponse, ErrorResponse};
