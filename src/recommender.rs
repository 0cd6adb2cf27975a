// 🔎 Alternative Ranker - Cheaper alternatives for a scanned product
//
// Two methods:
// - basic:   same category, cheaper, best value score first
// - similar: nearest neighbours in the similarity index, cheaper, in
//            similarity order

use crate::catalog::{Catalog, Product};
use crate::error::{RecommendError, RecommendResult};
use crate::features::FeatureBuilder;
use crate::predictor::{ForestConfig, SatisfactionPredictor};
use crate::similarity::SimilarityIndex;
use crate::util::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alternatives returned per scan
pub const DEFAULT_TOP_N: usize = 3;

/// Neighbours fetched before the price filter in `similar` mode
pub const SIMILAR_CANDIDATES: usize = 10;

// ============================================================================
// METHOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Basic,
    Similar,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Basic => "basic",
            Method::Similar => "similar",
        }
    }
}

impl FromStr for Method {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Method::Basic),
            "similar" => Ok(Method::Similar),
            other => Err(RecommendError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
}

impl From<&Product> for OriginalProduct {
    fn from(product: &Product) -> Self {
        OriginalProduct {
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone(),
            category: product.category.clone(),
            price: product.price,
            rating: product.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub rating: f64,
    pub price_savings: f64,
    pub price_savings_pct: f64,
    pub rating_diff: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_rating: Option<f64>,
}

impl Alternative {
    fn compare(target: &Product, alt: &Product, predicted_rating: Option<f64>) -> Self {
        let price_savings = target.price - alt.price;

        Alternative {
            product_id: alt.product_id.clone(),
            product_name: alt.product_name.clone(),
            price: alt.price,
            rating: alt.rating,
            price_savings,
            price_savings_pct: round_to(price_savings / target.price * 100.0, 1),
            rating_diff: round_to(alt.rating - target.rating, 1),
            predicted_rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub original_product: OriginalProduct,
    pub method: Method,
    pub recommendations: Vec<Alternative>,
}

/// Outcome of a valid scan. An empty candidate pool is a normal result,
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(ScanReport),
    NoAlternativesFound {
        product_id: String,
        product_name: String,
        method: Method,
    },
}

impl ScanOutcome {
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ScanOutcome::Found(report) => Some(report),
            ScanOutcome::NoAlternativesFound { .. } => None,
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::Found(report) => fmt::Display::fmt(report, f),
            ScanOutcome::NoAlternativesFound { product_name, method: Method::Basic, .. } => {
                writeln!(f, "No cheaper alternatives found for {}.", product_name)
            }
            ScanOutcome::NoAlternativesFound { product_name, method: Method::Similar, .. } => {
                writeln!(f, "No cheaper similar alternatives found for {}.", product_name)
            }
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let original = &self.original_product;

        writeln!(
            f,
            "Scanned Product: {} (₹{:.2}, Rating: {:?})",
            original.product_name, original.price, original.rating
        )?;
        writeln!(f, "Category: {}", original.category)?;
        writeln!(f, "Recommendation Method: {}", self.method)?;
        writeln!(f, "\nRecommended Alternatives:")?;

        for (i, rec) in self.recommendations.iter().enumerate() {
            let indicator = if rec.rating_diff > 0.0 {
                "↑"
            } else if rec.rating_diff < 0.0 {
                "↓"
            } else {
                "="
            };

            writeln!(
                f,
                "{}. {} - ₹{:.2} (Save ₹{:.2}, {:?}%)",
                i + 1,
                rec.product_name,
                rec.price,
                rec.price_savings,
                rec.price_savings_pct
            )?;
            writeln!(f, "   Rating: {:?} {}", rec.rating, indicator)?;

            if let Some(predicted) = rec.predicted_rating {
                writeln!(f, "   Predicted Satisfaction: {:.1}/5.0", predicted)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

// ============================================================================
// RECOMMENDER
// ============================================================================

/// Catalog plus the models built over it. Read-only once trained.
pub struct Recommender {
    catalog: Catalog,
    features: FeatureBuilder,
    index: Option<SimilarityIndex>,
    predictor: Option<SatisfactionPredictor>,
}

impl Recommender {
    /// Untrained recommender: only the `basic` method is available
    pub fn new(catalog: Catalog) -> Self {
        let features = FeatureBuilder::fit(&catalog);
        Recommender {
            catalog,
            features,
            index: None,
            predictor: None,
        }
    }

    /// Build the similarity index and train the predictor
    pub fn trained(catalog: Catalog, config: ForestConfig) -> Self {
        let mut recommender = Recommender::new(catalog);
        recommender.train(config);
        recommender
    }

    /// Assemble from previously persisted models
    pub fn with_models(
        catalog: Catalog,
        features: FeatureBuilder,
        index: SimilarityIndex,
        predictor: SatisfactionPredictor,
    ) -> Self {
        Recommender {
            catalog,
            features,
            index: Some(index),
            predictor: Some(predictor),
        }
    }

    pub fn train(&mut self, config: ForestConfig) {
        self.index = Some(SimilarityIndex::build(&self.catalog, &self.features));
        self.predictor = Some(SatisfactionPredictor::train(&self.catalog, &self.features, config));
        tracing::info!("models trained successfully");
    }

    pub fn is_trained(&self) -> bool {
        self.index.is_some() && self.predictor.is_some()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn features(&self) -> &FeatureBuilder {
        &self.features
    }

    pub fn index(&self) -> Option<&SimilarityIndex> {
        self.index.as_ref()
    }

    pub fn predictor(&self) -> Option<&SatisfactionPredictor> {
        self.predictor.as_ref()
    }

    fn target(&self, product_id: &str) -> RecommendResult<&Product> {
        self.catalog
            .get(product_id)
            .ok_or_else(|| RecommendError::NotFound(product_id.to_string()))
    }

    /// Most similar products, excluding the product itself
    pub fn get_similar_products(&self, product_id: &str, top_n: usize) -> RecommendResult<Vec<&Product>> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| RecommendError::InvalidMethod(Method::Similar.to_string()))?;

        let rows = index.get_similar(&self.catalog, product_id, top_n)?;
        let products = self.catalog.products();
        Ok(rows.into_iter().map(|(row, _)| &products[row]).collect())
    }

    /// Predicted rating, or `None` when no predictor has been trained
    pub fn predict_user_satisfaction(&self, product_id: &str) -> RecommendResult<Option<f64>> {
        match &self.predictor {
            Some(predictor) => predictor
                .predict(&self.catalog, &self.features, product_id)
                .map(Some),
            None => {
                self.target(product_id)?;
                Ok(None)
            }
        }
    }

    /// Cheaper alternatives for `product_id`
    pub fn recommend_alternatives(
        &self,
        product_id: &str,
        top_n: usize,
        method: &str,
    ) -> RecommendResult<ScanOutcome> {
        let target = self.target(product_id)?;
        let method: Method = method.parse()?;

        let candidates: Vec<&Product> = match method {
            Method::Basic => {
                let mut cheaper: Vec<&Product> = self
                    .catalog
                    .products()
                    .iter()
                    .filter(|p| {
                        p.category == target.category
                            && p.price < target.price
                            && p.product_id != target.product_id
                    })
                    .collect();

                cheaper.sort_by(|a, b| b.value_score().total_cmp(&a.value_score()));
                cheaper.truncate(top_n);
                cheaper
            }
            Method::Similar => self
                .get_similar_products(product_id, SIMILAR_CANDIDATES)?
                .into_iter()
                .filter(|p| p.price < target.price)
                .take(top_n)
                .collect(),
        };

        if candidates.is_empty() {
            return Ok(ScanOutcome::NoAlternativesFound {
                product_id: target.product_id.clone(),
                product_name: target.product_name.clone(),
                method,
            });
        }

        let recommendations = candidates
            .into_iter()
            .map(|alt| -> RecommendResult<Alternative> {
                let predicted = self.predict_user_satisfaction(&alt.product_id)?;
                Ok(Alternative::compare(target, alt, predicted))
            })
            .collect::<RecommendResult<Vec<_>>>()?;

        Ok(ScanOutcome::Found(ScanReport {
            original_product: target.into(),
            method,
            recommendations,
        }))
    }

    /// Scan a product and rank the default number of alternatives
    pub fn scan_product(&self, product_id: &str, method: &str) -> RecommendResult<ScanOutcome> {
        self.recommend_alternatives(product_id, DEFAULT_TOP_N, method)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_products(vec![
            Product::new("HO_1", "Floor Cleaner Premium", "Household", 300.0, 4.5),
            Product::new("HO_2", "Floor Cleaner Basic", "Household", 150.0, 3.9),
            Product::new("HO_3", "Floor Cleaner Value", "Household", 100.0, 4.2),
            Product::new("HO_4", "Glass Cleaner", "Household", 120.0, 3.0),
            Product::new("HO_5", "Mop", "Household", 350.0, 4.0),
            Product::new("SN_1", "Chips", "Snacks", 40.0, 4.1),
            Product::new("SN_2", "Cookies", "Snacks", 60.0, 4.4),
        ])
        .unwrap()
    }

    fn config() -> ForestConfig {
        ForestConfig {
            n_trees: 20,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("basic".parse::<Method>(), Ok(Method::Basic));
        assert_eq!("similar".parse::<Method>(), Ok(Method::Similar));
        assert_eq!(
            "rank".parse::<Method>(),
            Err(RecommendError::InvalidMethod("rank".to_string()))
        );
    }

    #[test]
    fn test_basic_sorted_by_value_score() {
        let recommender = Recommender::new(catalog());
        let outcome = recommender.scan_product("HO_1", "basic").unwrap();
        let report = outcome.report().unwrap();

        let ids: Vec<&str> = report.recommendations.iter().map(|r| r.product_id.as_str()).collect();
        // value scores: HO_3 0.042, HO_2 0.026, HO_4 0.025
        assert_eq!(ids, vec!["HO_3", "HO_2", "HO_4"]);
        assert_eq!(report.original_product.product_id, "HO_1");
        assert_eq!(report.method, Method::Basic);
    }

    #[test]
    fn test_basic_never_returns_equal_or_pricier_products() {
        let recommender = Recommender::new(catalog());

        for product in recommender.catalog().products() {
            if let ScanOutcome::Found(report) = recommender.scan_product(&product.product_id, "basic").unwrap() {
                for rec in &report.recommendations {
                    assert!(rec.price < product.price);
                }
            }
        }
    }

    #[test]
    fn test_savings_and_rating_diff() {
        let recommender = Recommender::new(catalog());
        let outcome = recommender.scan_product("HO_1", "basic").unwrap();
        let best = &outcome.report().unwrap().recommendations[0];

        assert_eq!(best.price_savings, 200.0);
        assert_eq!(best.price_savings_pct, 66.7);
        assert_eq!(best.rating_diff, -0.3);
        assert_eq!(best.predicted_rating, None);
    }

    #[test]
    fn test_top_n_limits_results() {
        let recommender = Recommender::new(catalog());
        let outcome = recommender.recommend_alternatives("HO_5", 2, "basic").unwrap();

        assert_eq!(outcome.report().unwrap().recommendations.len(), 2);
    }

    #[test]
    fn test_no_cheaper_alternative() {
        let recommender = Recommender::new(catalog());
        let outcome = recommender.scan_product("SN_1", "basic").unwrap();

        assert_eq!(
            outcome,
            ScanOutcome::NoAlternativesFound {
                product_id: "SN_1".to_string(),
                product_name: "Chips".to_string(),
                method: Method::Basic,
            }
        );
        assert_eq!(outcome.to_string(), "No cheaper alternatives found for Chips.\n");
    }

    #[test]
    fn test_unknown_product() {
        let recommender = Recommender::new(catalog());

        assert_eq!(
            recommender.scan_product("ZZ_9", "basic"),
            Err(RecommendError::NotFound("ZZ_9".to_string()))
        );
        // Lookup happens before method validation
        assert_eq!(
            recommender.scan_product("ZZ_9", "rank"),
            Err(RecommendError::NotFound("ZZ_9".to_string()))
        );
    }

    #[test]
    fn test_invalid_method() {
        let recommender = Recommender::trained(catalog(), config());

        assert_eq!(
            recommender.scan_product("HO_1", "rank"),
            Err(RecommendError::InvalidMethod("rank".to_string()))
        );
    }

    #[test]
    fn test_similar_requires_trained_index() {
        let recommender = Recommender::new(catalog());

        assert!(!recommender.is_trained());
        assert_eq!(
            recommender.scan_product("HO_1", "similar"),
            Err(RecommendError::InvalidMethod("similar".to_string()))
        );
    }

    #[test]
    fn test_similar_filters_cheaper_and_keeps_similarity_order() {
        let recommender = Recommender::trained(catalog(), config());
        let outcome = recommender.scan_product("HO_1", "similar").unwrap();
        let report = outcome.report().unwrap();

        assert!(report.recommendations.len() <= DEFAULT_TOP_N);
        for rec in &report.recommendations {
            assert!(rec.price < 300.0);
            assert!(rec.predicted_rating.is_some());
        }

        let similar = recommender.get_similar_products("HO_1", SIMILAR_CANDIDATES).unwrap();
        let expected: Vec<&str> = similar
            .iter()
            .filter(|p| p.price < 300.0)
            .take(DEFAULT_TOP_N)
            .map(|p| p.product_id.as_str())
            .collect();
        let actual: Vec<&str> = report.recommendations.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_similar_with_no_cheaper_neighbours() {
        let recommender = Recommender::trained(catalog(), config());
        let outcome = recommender.scan_product("SN_1", "similar").unwrap();

        // SN_1 is the cheapest product in the whole catalog
        assert!(matches!(outcome, ScanOutcome::NoAlternativesFound { method: Method::Similar, .. }));
    }

    #[test]
    fn test_trained_basic_includes_predictions() {
        let recommender = Recommender::trained(catalog(), config());
        let outcome = recommender.scan_product("HO_1", "basic").unwrap();

        for rec in &outcome.report().unwrap().recommendations {
            let predicted = rec.predicted_rating.unwrap();
            assert!((0.0..=5.0).contains(&predicted));
        }
    }

    #[test]
    fn test_report_rendering() {
        let recommender = Recommender::new(catalog());
        let text = recommender.scan_product("HO_1", "basic").unwrap().to_string();

        assert!(text.starts_with("Scanned Product: Floor Cleaner Premium (₹300.00, Rating: 4.5)\n"));
        assert!(text.contains("Category: Household\n"));
        assert!(text.contains("Recommendation Method: basic\n"));
        assert!(text.contains("1. Floor Cleaner Value - ₹100.00 (Save ₹200.00, 66.7%)\n   Rating: 4.2 ↓\n"));
        assert!(!text.contains("Predicted Satisfaction"));
    }

    #[test]
    fn test_report_serializes_without_missing_predictions() {
        let recommender = Recommender::new(catalog());
        let outcome = recommender.scan_product("HO_1", "basic").unwrap();
        let json = serde_json::to_value(outcome.report().unwrap()).unwrap();

        assert_eq!(json["method"], "basic");
        assert!(json["recommendations"][0].get("predicted_rating").is_none());
        assert_eq!(json["original_product"]["price"], 300.0);
    }
}
