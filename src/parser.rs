// 🧾 Bill Parser - Rightmost Number heuristic
// Raw receipt text → classified line items → calculated total

use crate::error::BillError;
use crate::rules::CategoryRules;
use crate::util::round_to;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Symbols stripped from a token before trying to read it as a number
pub const STRIPPED_SYMBOLS: [char; 6] = ['$', '€', '£', '₹', ',', '-'];

// ============================================================================
// CORE TYPES
// ============================================================================

/// LineItem - One classified product line of a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub price: f64,
    pub category: String,
}

/// ParsedBill - Items plus a total that is always derived from them
///
/// `total` is `None` when nothing was parsed, which is different from a
/// bill that legitimately sums to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedBill {
    items: Vec<LineItem>,
    total: Option<f64>,
}

impl ParsedBill {
    pub fn new(items: Vec<LineItem>) -> Self {
        let total = calculate_total(&items);
        ParsedBill { items, total }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total(&self) -> Option<f64> {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

// ============================================================================
// PRICE LOCATION
// ============================================================================

/// PriceLocator - Finds the price token of a tokenized line
pub trait PriceLocator {
    /// Returns `(price_index, price)` or `None` when the line has no price
    fn locate_price(&self, tokens: &[&str]) -> Option<(usize, f64)>;
}

/// Rightmost token that reads as a number is the price.
///
/// Receipt lines usually end with the price but may carry quantities or
/// codes earlier on, so the scan runs right to left and stops at the
/// first hit. Stripping `-` means negative prices come out positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RightmostNumber;

impl PriceLocator for RightmostNumber {
    fn locate_price(&self, tokens: &[&str]) -> Option<(usize, f64)> {
        tokens
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, token)| parse_price_token(token).map(|price| (index, price)))
    }
}

/// Clean a single token and read it as a number
pub fn parse_price_token(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|c| !STRIPPED_SYMBOLS.contains(c)).collect();

    if cleaned.is_empty() || cleaned == "." {
        return None;
    }

    cleaned.parse::<f64>().ok()
}

// ============================================================================
// BILL PARSER
// ============================================================================

/// BillParser - Tokenizer/PriceLocator → Classifier, one line at a time
pub struct BillParser<L: PriceLocator = RightmostNumber> {
    rules: CategoryRules,
    locator: L,
}

impl BillParser<RightmostNumber> {
    pub fn new(rules: CategoryRules) -> Self {
        BillParser {
            rules,
            locator: RightmostNumber,
        }
    }
}

impl<L: PriceLocator> BillParser<L> {
    pub fn with_locator(rules: CategoryRules, locator: L) -> Self {
        BillParser { rules, locator }
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Parse one line. Lines without a usable price or name yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<LineItem> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (price_index, price) = self.locator.locate_price(&tokens)?;

        let name = tokens[..price_index].join(" ");
        let name = name.trim();

        if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
            debug!(line, price, "skipping line: no valid product name before price");
            return None;
        }

        Some(LineItem {
            name: name.to_string(),
            price,
            category: self.rules.classify(name).to_string(),
        })
    }

    /// Parse a whole bill. Bad lines are skipped, never fatal.
    pub fn parse(&self, text: &str) -> Result<ParsedBill, BillError> {
        if text.trim().is_empty() {
            return Err(BillError::EmptyInput);
        }

        let items: Vec<LineItem> = text.lines().filter_map(|line| self.parse_line(line)).collect();

        debug!(count = items.len(), "finished product extraction");
        Ok(ParsedBill::new(items))
    }
}

impl Default for BillParser<RightmostNumber> {
    fn default() -> Self {
        BillParser::new(CategoryRules::default())
    }
}

/// Parse a bill with the given rules
pub fn parse_bill(text: &str, rules: &CategoryRules) -> Result<ParsedBill, BillError> {
    BillParser::new(rules.clone()).parse(text)
}

// ============================================================================
// TOTALIZER
// ============================================================================

/// Sum of item prices rounded to cents, or `None` for no items
pub fn calculate_total(items: &[LineItem]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }

    let sum: f64 = items.iter().map(|item| item.price).sum();
    Some(round_to(sum, 2))
}

// ============================================================================
// TESTS
// ============================================================================
