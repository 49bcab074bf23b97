use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Currency markers accepted in front of an amount.
const CURRENCY: &str = r"(?:₹|\bRs\.?|\bINR)";
/// Amount with optional thousands separators and up to two decimals. ASCII digits only.
const AMOUNT: &str = r"([0-9][0-9,]*(?:\.[0-9]{1,2})?)";

/// One way of locating a price in transcript text.
pub trait PriceMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw amount as written (separators included), if this strategy matches.
    fn find(&self, text: &str) -> Option<String>;
}

/// `PRICE: ₹1,234` as emitted by the agent's `complete()` call.
pub struct MarkerMatcher {
    regex: Regex,
}

impl MarkerMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(&format!(r"(?i)PRICE:\s*{}?\s*{}", CURRENCY, AMOUNT))
                .expect("marker price regex"),
        }
    }
}

impl PriceMatcher for MarkerMatcher {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn find(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .find_map(|c| complete_amount(text, &c))
            .map(str::to_string)
    }
}

/// `the price is ₹499`
pub struct NarrativeMatcher {
    regex: Regex,
}

impl NarrativeMatcher {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(&format!(r"(?i)\bprice\s+is\s+{}?\s*{}", CURRENCY, AMOUNT))
                .expect("narrative price regex"),
        }
    }
}

impl PriceMatcher for NarrativeMatcher {
    fn name(&self) -> &'static str {
        "narrative"
    }

    fn find(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .find_map(|c| complete_amount(text, &c))
            .map(str::to_string)
    }
}

/// First bare currency amount whose value falls inside a plausible window.
/// Skips ratings, quantities and other small or huge numbers.
pub struct PlausibleAmountMatcher {
    regex: Regex,
    min: Decimal,
    max: Decimal,
}

impl PlausibleAmountMatcher {
    pub fn new() -> Self {
        Self::with_window(Decimal::from(10), Decimal::from(50_000))
    }

    pub fn with_window(min: Decimal, max: Decimal) -> Self {
        Self {
            regex: Regex::new(&format!(r"{}\s*{}", CURRENCY, AMOUNT)).expect("bare amount regex"),
            min,
            max,
        }
    }
}

impl PriceMatcher for PlausibleAmountMatcher {
    fn name(&self) -> &'static str {
        "plausible_amount"
    }

    fn find(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|c| complete_amount(text, &c))
            .find(|raw| {
                Decimal::from_str(&strip_separators(raw))
                    .map(|value| value >= self.min && value <= self.max)
                    .unwrap_or(false)
            })
            .map(str::to_string)
    }
}

/// Pulls a normalized price out of an automation transcript.
///
/// Matchers run in order and the first hit wins; partial matches are never
/// combined. The output is digits with an optional fraction, no currency
/// symbol and no separators.
pub struct PriceExtractor {
    matchers: Vec<Box<dyn PriceMatcher>>,
}

impl PriceExtractor {
    pub fn new() -> Self {
        Self::with_matchers(vec![
            Box::new(MarkerMatcher::new()),
            Box::new(NarrativeMatcher::new()),
            Box::new(PlausibleAmountMatcher::new()),
        ])
    }

    pub fn with_matchers(matchers: Vec<Box<dyn PriceMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        for matcher in &self.matchers {
            if let Some(raw) = matcher.find(text) {
                let price = strip_separators(&raw);
                if is_normalized_price(&price) {
                    tracing::debug!("Price {} matched by {} strategy", price, matcher.name());
                    return Some(price);
                }
            }
        }

        None
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// The captured amount, unless the text runs on past it with more digits
/// (`₹12.345` must not read as `12.34`).
fn complete_amount<'t>(text: &'t str, captures: &Captures<'t>) -> Option<&'t str> {
    let amount = captures.get(1)?;
    let mut rest = text[amount.end()..].chars();
    let runs_on = match rest.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => rest.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    (!runs_on).then(|| amount.as_str())
}

fn strip_separators(raw: &str) -> String {
    raw.replace(',', "")
}

/// Digits, optionally followed by `.` and one or two digits.
pub fn is_normalized_price(price: &str) -> bool {
    let (whole, fraction) = match price.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (price, None),
    };

    let whole_ok = !whole.is_empty() && whole.bytes().all(|b| b.is_ascii_digit());
    let fraction_ok = fraction
        .map(|f| (1..=2).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(true);

    whole_ok && fraction_ok
}
