use regex::Regex;

/// Default currency-amount pattern: a currency symbol, optional space, digits with separators
pub const DEFAULT_CURRENCY_PATTERN: &str = r"[₹$€£]\s?([\d,]+)";

/// Compiled currency-amount matcher
#[derive(Debug, Clone)]
pub struct CurrencyPattern {
    amount: Regex,
    leading: Regex,
}

impl CurrencyPattern {
    /// Compiles `pattern`, whose first capture group must hold the digits of the amount
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            amount: Regex::new(pattern)?,
            leading: Regex::new(&format!(r"^(?:{})", pattern))?,
        })
    }

    /// Whether `text` contains at least one currency amount
    pub fn is_match(&self, text: &str) -> bool {
        self.amount.is_match(text)
    }

    /// Whether `text` starts with a currency amount
    pub fn starts_with_amount(&self, text: &str) -> bool {
        self.leading.is_match(text)
    }

    /// Every amount in `text`, in order of appearance
    pub fn amounts(&self, text: &str) -> Vec<u64> {
        self.amount
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| parse_amount(m.as_str())))
            .collect()
    }

    /// First amount in `text`
    pub fn first_amount(&self, text: &str) -> Option<u64> {
        self.amounts(text).into_iter().next()
    }
}

impl Default for CurrencyPattern {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_PATTERN).expect("Default currency pattern should be valid")
    }
}

/// Parses digits with thousands separators ("2,445") into an integer amount
pub fn parse_amount(digits: &str) -> Option<u64> {
    let cleaned: String = digits.chars().filter(|c| c.is_ascii_digit()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<u64>().ok()
}

/// A base price with an optional pre-discount price found alongside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub base: u64,
    pub original: Option<u64>,
}

/// Reads a quote out of a pricing container's text
///
/// The first amount is the base price. The largest amount, when it
/// differs from the base, is taken as the struck-through original price;
/// it is therefore always strictly greater than the base.
pub fn quote_from_text(pattern: &CurrencyPattern, text: &str) -> Option<PriceQuote> {
    let amounts = pattern.amounts(text);
    let base = *amounts.first()?;
    let max = amounts.iter().copied().max().unwrap_or(base);
    let original = (amounts.len() > 1 && max != base).then_some(max);
    Some(PriceQuote { base, original })
}
