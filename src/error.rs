//! Typed error taxonomy for the bill parser and the recommender.
//!
//! Every failure mode a caller must branch on has a named variant.
//! "No alternatives found" is deliberately absent here: it is a normal
//! outcome and lives in `recommender::ScanOutcome`.

use thiserror::Error;

/// Bill parsing failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillError {
    #[error("Input text cannot be empty")]
    EmptyInput,
}

/// Recommendation lookup failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Product {0} not found in database")]
    NotFound(String),

    #[error("Invalid method or models not trained: {0}. Choose 'basic' or 'similar'")]
    InvalidMethod(String),
}

/// Catalog initialization failures. Fatal: nothing is served in this state.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog is missing required column: {0}")]
    MissingColumn(String),

    #[error("Line {line}: {field} is not numeric ({value:?})")]
    NonNumeric {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: price must be positive, got {price}")]
    NonPositivePrice { line: usize, price: f64 },

    #[error("Line {line}: rating must be within [0, 5], got {rating}")]
    RatingOutOfRange { line: usize, rating: f64 },

    #[error("Line {line}: duplicate product id {id}")]
    DuplicateId { line: usize, id: String },

    #[error("Catalog contains no products")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for recommender lookups.
pub type RecommendResult<T> = Result<T, RecommendError>;
