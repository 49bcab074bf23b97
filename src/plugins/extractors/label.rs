use regex::Regex;

/// Recovers the product label the agent reported (`... for <label>`).
pub struct ProductLabelExtractor {
    regex: Regex,
}

impl ProductLabelExtractor {
    /// Accepted label length in characters, exclusive on both ends.
    const MIN_EXCLUSIVE: usize = 4;
    const MAX_EXCLUSIVE: usize = 99;

    pub fn new() -> Self {
        Self {
            regex: Regex::new(r#"(?i)\bfor\s+([^"\n]+?)(?:"|\)|\n|$)"#).expect("label regex"),
        }
    }

    /// Label following the first `for`, or `fallback` when none fits the length window.
    pub fn extract(&self, text: &str, fallback: &str) -> String {
        self.regex
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|label| {
                let len = label.chars().count();
                len > Self::MIN_EXCLUSIVE && len < Self::MAX_EXCLUSIVE
            })
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl Default for ProductLabelExtractor {
    fn default() -> Self {
        Self::new()
    }
}
