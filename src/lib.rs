// Receipt Lens - Core Library
// Bill parsing + classification, and cheaper-alternative recommendations.
// Exposes all modules for use in the CLI, the API server, and tests

pub mod error;
pub mod util;
pub mod config;

// Bill pipeline
pub mod rules;
pub mod parser;
pub mod summary;
pub mod budget;

// Recommender pipeline
pub mod catalog;
pub mod features;
pub mod similarity;
pub mod predictor;
pub mod recommender;
pub mod persistence;

// Re-export commonly used types
pub use error::{BillError, CatalogError, RecommendError, RecommendResult};
pub use config::{AppConfig, init_tracing};
pub use rules::{CategoryRule, CategoryRules, FALLBACK_CATEGORY};
pub use parser::{
    BillParser, LineItem, ParsedBill, PriceLocator, RightmostNumber,
    parse_bill, calculate_total,
};
pub use summary::{BillDigest, CategoryTotal, category_totals};
pub use budget::{BudgetError, FinancialInput, FinancialSnapshot, GoalProjection};
pub use catalog::{Catalog, Product};
pub use features::{CategoryEncoder, FeatureBuilder, PriceScaler};
pub use similarity::{SimilarityIndex, cosine_similarity};
pub use predictor::{ForestConfig, RandomForest, SatisfactionPredictor};
pub use recommender::{
    Alternative, Method, OriginalProduct, Recommender, ScanOutcome, ScanReport,
    DEFAULT_TOP_N,
};
pub use persistence::{load_models, load_recommender, save_models, SavedModels};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
