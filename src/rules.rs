// 🏷️ Category Rules - Rules as Data
// Ordered keyword tables that assign a spending category to a product name

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fallback category. Always present, never matched by keyword.
pub const FALLBACK_CATEGORY: &str = "Others";

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category to assign
    pub category: String,

    /// Upper-case keywords, in declaration order
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        CategoryRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Check whether any keyword matches an upper-cased product name.
    ///
    /// A keyword matches on word boundaries only: "TEA" matches "GREEN TEA"
    /// but not "STEAK".
    pub fn matches(&self, name_upper: &str) -> bool {
        let padded_name = format!(" {} ", name_upper);

        self.keywords.iter().any(|keyword| {
            padded_name.contains(&format!(" {} ", keyword))
                || name_upper.ends_with(&format!(" {}", keyword))
                || name_upper.starts_with(&format!("{} ", keyword))
                || name_upper == keyword
        })
    }

    fn is_fallback(&self) -> bool {
        self.category == FALLBACK_CATEGORY
    }
}

// ============================================================================
// RULE SET
// ============================================================================

/// Immutable, ordered category table.
///
/// Declaration order is the tie-break: when a name matches keywords of two
/// categories, the one declared first wins.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl CategoryRules {
    /// Build a rule set, normalizing keywords and enforcing the fallback.
    ///
    /// Keywords are trimmed and upper-cased; empty ones are dropped. A
    /// "Others" entry keeps its position but loses any keywords; if absent
    /// it is appended.
    pub fn from_rules(rules: Vec<CategoryRule>) -> Self {
        let mut rules: Vec<CategoryRule> = rules
            .into_iter()
            .map(|mut rule| {
                rule.keywords = if rule.is_fallback() {
                    Vec::new()
                } else {
                    rule.keywords
                        .iter()
                        .map(|k| k.trim().to_uppercase())
                        .filter(|k| !k.is_empty())
                        .collect()
                };
                rule
            })
            .collect();

        if !rules.iter().any(CategoryRule::is_fallback) {
            rules.push(CategoryRule::new(FALLBACK_CATEGORY, &[]));
        }

        CategoryRules { rules }
    }

    /// Load rules from a JSON file: `[{"category": "...", "keywords": [...]}]`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let rules: Vec<CategoryRule> =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        Ok(CategoryRules::from_rules(rules))
    }

    /// Assign exactly one category to a product name.
    pub fn classify(&self, name: &str) -> &str {
        let name_upper = name.to_uppercase();

        self.rules
            .iter()
            .filter(|rule| !rule.is_fallback())
            .find(|rule| rule.matches(&name_upper))
            .map(|rule| rule.category.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Category names in declaration order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.category.as_str())
    }

    /// Get number of categories loaded (fallback included)
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        CategoryRules::from_rules(default_rules())
    }
}

// ============================================================================
// BUILT-IN TABLE
// ============================================================================

/// Built-in grocery table. Order matters: "MILK" is a Beverage, not Dairy,
/// and "BREAD" is Food, not Bakery.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Food", &[
            "BREAD", "EGGS", "COTTAGE CHEESE", "YOGURT", "TOMATOES", "BANANAS", "CHICKEN",
            "TUNA", "VEGETABLES", "FRUIT", "POTATOES", "CARROTS", "LETTUCE", "PUMPKIN",
            "CABBAGE", "ONIONS", "GARLIC", "PEAS", "APPLE", "ORANGE", "PEACH", "STRAWBERRY",
            "GROCERIES",
        ]),
        CategoryRule::new("Beverages", &[
            "MILK", "COFFEE", "JUICE", "WATER", "TEA", "SODA", "ENERGY DRINK", "SPORTS DRINK",
            "ALCOHOL", "WINE", "BEER", "COCKTAIL", "CIDER",
        ]),
        CategoryRule::new("Household", &[
            "TOILET PAPER", "WIPES", "CLEANER", "PAPER TOWELS", "SPONGE", "MOP", "GLOVES",
            "DISINFECTANT", "DISH SOAP", "LAUNDRY DETERGENT", "BROOM", "TRASH BAGS",
            "FABRIC SOFTENER", "AIR FRESHENER", "TISSUES", "PLASTIC WRAP", "ALUMINUM FOIL",
            "LIGHT BULB",
        ]),
        CategoryRule::new("Snacks", &[
            "CRACKERS", "COOKIES", "CHOCOLATE", "CANDY", "CANDY BAR", "CHIPS", "NUTS", "SEEDS",
            "CORN SNACKS", "TRAIL MIX", "PRETZELS", "POP CORN", "GUM", "JELLY BEANS",
            "GUMMY BEARS", "ICE CREAM",
        ]),
        CategoryRule::new("Dairy", &[
            "CHEESE", "BUTTER", "MILK", "YOGURT", "CREAM", "COTTAGE CHEESE", "WHIPPED CREAM",
            "SOUR CREAM", "EGGS",
        ]),
        CategoryRule::new("Frozen", &[
            "FROZEN FOOD", "FROZEN PIZZA", "FROZEN VEGETABLES", "FROZEN FRUITS", "FROZEN MEALS",
            "FROZEN DINNER", "FROZEN FRENCH FRIES", "FROZEN BURGERS", "FROZEN CHICKEN",
        ]),
        CategoryRule::new("Bakery", &[
            "BREAD", "BAGELS", "CROISSANT", "MUFFINS", "DONUTS", "PASTRY", "CAKE", "PIE",
            "BISCUIT", "CUPCAKES", "COOKIES", "TARTS",
        ]),
        CategoryRule::new("Meat & Seafood", &[
            "BEEF", "PORK", "CHICKEN", "LAMB", "TURKEY", "SALMON", "TUNA", "SHRIMP", "LOBSTER",
            "CRAB", "SEAFOOD", "BACON", "SAUSAGE", "STEAK", "CHICKEN BREAST", "CHICKEN WINGS",
            "FISH",
        ]),
        CategoryRule::new("Produce", &[
            "FRUIT", "VEGETABLE", "LEAFY GREENS", "AVOCADO", "CABBAGE", "CARROTS", "BROCCOLI",
            "CORN", "PEAS", "CUCUMBER", "PEPPER", "POTATOES", "ONION", "MUSHROOM", "SPINACH",
        ]),
        CategoryRule::new("Pharmacy", &[
            "PILLS", "MEDICINE", "VITAMINS", "SUPPLEMENTS", "COLD MEDICINE", "PAIN RELIEVER",
            "ANTIBIOTICS", "FIRST AID", "BANDAGES", "PRESCRIPTION",
        ]),
        CategoryRule::new("Personal Care", &[
            "SHAMPOO", "TOOTHPASTE", "SOAP", "DEODORANT", "LOTIONS", "HAIR CARE", "SKIN CARE",
            "MOISTURIZER", "MAKEUP", "NAIL POLISH", "HAIR COLOR", "FEMININE PRODUCTS", "RAZORS",
            "SUNSCREEN", "CONDITIONER",
        ]),
        CategoryRule::new("Pet Supplies", &[
            "PET FOOD", "CAT FOOD", "DOG FOOD", "PET TOYS", "PET CARE", "LITTER", "PET SUPPLIES",
            "PET BED", "PET COLLAR", "PET MEDICINE",
        ]),
        CategoryRule::new("Electronics", &[
            "LAPTOP", "PHONE", "TABLET", "CAMERA", "TV", "EARPHONES", "HEADPHONES", "CABLES",
            "CHARGER", "SMARTWATCH", "MONITOR", "SPEAKERS", "KEYBOARD", "MOUSE", "BATTERIES",
        ]),
        CategoryRule::new("Health & Fitness", &[
            "EXERCISE EQUIPMENT", "DUMBBELLS", "YOGA MAT", "TREADMILL", "SUPPLEMENTS",
            "WEIGHT SCALE", "FITNESS TRACKER", "BICYCLE", "FOOT MASSAGER", "ELASTIC BAND",
            "RESISTANCE BAND", "PROTEIN",
        ]),
        CategoryRule::new("Office Supplies", &[
            "PAPER", "PENS", "PENCILS", "NOTEBOOK", "ENVELOPES", "STAPLER", "STAPLES", "PRINTER",
            "PRINTER INK", "BINDERS", "TAPE", "MARKERS", "WHITEBOARD", "CALENDAR",
        ]),
        CategoryRule::new("Baby & Kids", &[
            "DIAPERS", "BABY FOOD", "BABY WIPES", "BABY CLOTHES", "TOYS", "BABY FORMULA",
            "STROLLER", "BABY CREAM", "BABY LOTION", "KIDS CLOTHES", "KIDS TOYS", "BABY SHAMPOO",
        ]),
        CategoryRule::new("Auto Supplies", &[
            "OIL", "CAR BATTERY", "TIRES", "CAR WASH", "WAX", "JACK", "AIR FRESHENER",
            "FLOOR MATS", "CAR REPAIR TOOLS", "WINDSHIELD WIPERS", "GAS", "FUEL",
        ]),
        CategoryRule::new(FALLBACK_CATEGORY, &[]),
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords<'a>(rules: &'a CategoryRules, category: &str) -> Option<&'a [String]> {
        rules
            .rules
            .iter()
            .find(|rule| rule.category == category)
            .map(|rule| rule.keywords.as_slice())
    }

    #[test]
    fn test_keyword_word_boundaries() {
        let rule = CategoryRule::new("Beverages", &["TEA"]);

        assert!(rule.matches("TEA"));
        assert!(rule.matches("GREEN TEA"));
        assert!(rule.matches("TEA BAGS"));
        assert!(rule.matches("ICED TEA LEMON"));
        assert!(!rule.matches("STEAK"));
        assert!(!rule.matches("TEAPOT"));
    }

    #[test]
    fn test_multi_word_keyword() {
        let rule = CategoryRule::new("Snacks", &["ICE CREAM"]);

        assert!(rule.matches("VANILLA ICE CREAM"));
        assert!(!rule.matches("ICE"));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let rules = CategoryRules::default();

        assert_eq!(rules.classify("milk"), "Beverages");
        assert_eq!(rules.classify("Whole Milk"), "Beverages");
        assert_eq!(rules.classify("toothpaste"), "Personal Care");
    }

    #[test]
    fn test_first_declared_category_wins() {
        let rules = CategoryRules::default();

        // MILK is listed under Beverages and Dairy; Beverages is declared first
        assert_eq!(rules.classify("MILK"), "Beverages");
        // BREAD is listed under Food and Bakery
        assert_eq!(rules.classify("BREAD"), "Food");
        // CHICKEN is in Food before Meat & Seafood
        assert_eq!(rules.classify("CHICKEN BREAST"), "Food");
        // COOKIES: Snacks before Bakery
        assert_eq!(rules.classify("COOKIES"), "Snacks");
    }

    #[test]
    fn test_declaration_order_is_the_tie_break() {
        let first = CategoryRules::from_rules(vec![
            CategoryRule::new("A", &["APPLE"]),
            CategoryRule::new("B", &["APPLE"]),
        ]);
        let swapped = CategoryRules::from_rules(vec![
            CategoryRule::new("B", &["APPLE"]),
            CategoryRule::new("A", &["APPLE"]),
        ]);

        assert_eq!(first.classify("APPLE"), "A");
        assert_eq!(swapped.classify("APPLE"), "B");
    }

    #[test]
    fn test_unmatched_name_falls_back_to_others() {
        let rules = CategoryRules::default();
        assert_eq!(rules.classify("WIDGET XL"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_fallback_is_always_present_and_empty() {
        let rules = CategoryRules::from_rules(vec![CategoryRule::new("Food", &["BREAD"])]);
        assert_eq!(rules.rule_count(), 2);
        assert_eq!(rules.categories().last(), Some(FALLBACK_CATEGORY));

        let rules = CategoryRules::from_rules(vec![
            CategoryRule::new(FALLBACK_CATEGORY, &["WIDGET"]),
            CategoryRule::new("Food", &["BREAD"]),
        ]);
        assert_eq!(rules.rule_count(), 2);
        assert_eq!(keywords(&rules, FALLBACK_CATEGORY), Some(&[][..]));
        assert_eq!(rules.classify("WIDGET"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_keywords_are_normalized() {
        let rules = CategoryRules::from_rules(vec![CategoryRule::new("Food", &[" bread ", ""])]);

        assert_eq!(keywords(&rules, "Food"), Some(&["BREAD".to_string()][..]));
        assert_eq!(rules.classify("Rye Bread"), "Food");
    }

    #[test]
    fn test_default_table_order() {
        let rules = CategoryRules::default();
        let names: Vec<&str> = rules.categories().collect();

        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "Food");
        assert_eq!(names[1], "Beverages");
        assert_eq!(names[4], "Dairy");
        assert_eq!(names[17], FALLBACK_CATEGORY);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"[{"category": "Treats", "keywords": ["fudge"]}, {"category": "Others"}]"#,
        )
        .unwrap();

        let rules = CategoryRules::from_file(&path).unwrap();
        assert_eq!(rules.classify("CHOCOLATE FUDGE"), "Treats");
        assert_eq!(rules.classify("MILK"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(CategoryRules::from_file("/nonexistent/rules.json").is_err());
    }
}
