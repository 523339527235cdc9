use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::vocabulary::{SignalVocabulary, CATEGORY_RULES};
use super::{Category, SignalSet};

fn budget_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:under|below|less\s+than|<=?)?\s*\$?\s*(\d+(?:\.\d{1,2})?)")
            .expect("budget pattern is a valid literal regex")
    })
}

/// Turns free text into a [`SignalSet`]. Pure and total.
#[derive(Clone, Debug, Default)]
pub struct SignalExtractor {
    vocabulary: SignalVocabulary,
}

impl SignalExtractor {
    pub fn new(vocabulary: SignalVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &SignalVocabulary {
        &self.vocabulary
    }

    pub fn extract(&self, text: &str) -> SignalSet {
        SignalSet {
            budget_ceiling: self.extract_budget(text),
            categories: self.detect_categories(text),
            keywords: self.extract_keywords(text),
            vibes: self.extract_vibes(text),
        }
    }

    /// First number in the text, optionally led by "under", "below",
    /// "less than", a comparison operator or a dollar sign.
    pub fn extract_budget(&self, text: &str) -> Option<Decimal> {
        let captures = budget_pattern().captures(text)?;
        let amount = captures.get(1)?;
        Decimal::from_str(amount.as_str()).ok()
    }

    /// Every category with a trigger word among the text's tokens. A trigger
    /// also matches its plural (`ring` → `rings`, `dress` → `dresses`).
    pub fn detect_categories(&self, text: &str) -> BTreeSet<Category> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> =
            lowered.split(|c: char| !c.is_alphanumeric()).filter(|token| !token.is_empty()).collect();

        CATEGORY_RULES
            .iter()
            .filter(|rule| {
                tokens.iter().any(|token| rule.triggers.iter().any(|trigger| is_trigger(token, trigger)))
            })
            .map(|rule| rule.category)
            .collect()
    }

    /// Lowercased alphanumeric tokens longer than two characters, stop words
    /// removed, first occurrence order kept.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        let mut keywords: Vec<String> = Vec::new();
        for token in cleaned.split_whitespace() {
            if token.chars().count() <= 2 || self.vocabulary.is_stop_word(token) {
                continue;
            }
            if !keywords.iter().any(|existing| existing == token) {
                keywords.push(token.to_string());
            }
        }
        keywords
    }

    /// Vocabulary terms contained anywhere in the text, in vocabulary order.
    pub fn extract_vibes(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.vocabulary.vibe_terms.iter().filter(|term| lowered.contains(term.as_str())).cloned().collect()
    }
}

fn is_trigger(token: &str, trigger: &str) -> bool {
    match token.strip_prefix(trigger) {
        Some(rest) => rest.is_empty() || rest == "s" || rest == "es",
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::SignalExtractor;
    use crate::signals::{Category, SignalVocabulary};

    #[test]
    fn budget_is_read_after_markers_and_currency_symbols() {
        let extractor = SignalExtractor::default();

        assert_eq!(extractor.extract_budget("under $50"), Some(Decimal::new(50, 0)));
        assert_eq!(extractor.extract_budget("below 30"), Some(Decimal::new(30, 0)));
        assert_eq!(extractor.extract_budget("$19.99"), Some(Decimal::new(1999, 2)));
        assert_eq!(extractor.extract_budget("less than 12.5 dollars"), Some(Decimal::new(125, 1)));
        assert_eq!(extractor.extract_budget("no price mentioned"), None);
    }

    #[test]
    fn budget_takes_the_first_number_and_at_most_two_decimals() {
        let extractor = SignalExtractor::default();

        assert_eq!(extractor.extract_budget("a ring under 80 or maybe 120"), Some(Decimal::new(80, 0)));
        assert_eq!(extractor.extract_budget("around 9.999"), Some(Decimal::new(999, 2)));
    }

    #[test]
    fn categories_are_not_mutually_exclusive() {
        let extractor = SignalExtractor::default();

        let categories = extractor.detect_categories("a laptop and a ring for my wife");

        assert!(categories.contains(&Category::Electronics));
        assert!(categories.contains(&Category::Jewelery));
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn categories_match_whole_words_and_plurals() {
        let extractor = SignalExtractor::default();

        let women = extractor.detect_categories("summer dresses for women");
        assert!(women.contains(&Category::WomensClothing));
        assert!(!women.contains(&Category::MensClothing));

        let rings = extractor.detect_categories("gold rings");
        assert_eq!(rings.into_iter().collect::<Vec<_>>(), vec![Category::Jewelery]);

        let apostrophe = extractor.detect_categories("men's t-shirt");
        assert!(apostrophe.contains(&Category::MensClothing));

        assert!(extractor.detect_categories("something nice").is_empty());
    }

    #[test]
    fn keywords_drop_stop_words_and_short_tokens() {
        let extractor = SignalExtractor::default();

        let keywords = extractor.extract_keywords("a good cheap hoodie for men");

        assert_eq!(keywords, vec!["hoodie".to_string(), "men".to_string()]);
    }

    #[test]
    fn keywords_strip_punctuation_and_repeats() {
        let extractor = SignalExtractor::default();

        let keywords = extractor.extract_keywords("Men's T-Shirt, shirt!! SHIRT");

        assert_eq!(keywords, vec!["mens".to_string(), "tshirt".to_string(), "shirt".to_string()]);
    }

    #[test]
    fn vibes_follow_vocabulary_order_and_substring_containment() {
        let extractor = SignalExtractor::default();

        let vibes = extractor.extract_vibes("Winter gifts for a cozy anniversary");

        assert_eq!(
            vibes,
            vec![
                "cozy".to_string(),
                "gift".to_string(),
                "anniversary".to_string(),
                "winter".to_string()
            ]
        );
    }

    #[test]
    fn token_can_be_both_keyword_and_vibe() {
        let extractor = SignalExtractor::default();

        let signals = extractor.extract("cozy hoodie");

        assert!(signals.keywords.contains(&"cozy".to_string()));
        assert_eq!(signals.vibes, vec!["cozy".to_string()]);
    }

    #[test]
    fn extraction_is_total_on_empty_and_noise_input() {
        let extractor = SignalExtractor::default();

        let signals = extractor.extract("  ?! ");

        assert_eq!(signals.budget_ceiling, None);
        assert!(signals.categories.is_empty());
        assert!(signals.keywords.is_empty());
        assert!(signals.vibes.is_empty());
    }

    #[test]
    fn custom_vocabulary_replaces_default_lists() {
        let extractor = SignalExtractor::new(SignalVocabulary {
            stop_words: vec!["hoodie".to_string()],
            vibe_terms: vec!["retro".to_string()],
        });

        let signals = extractor.extract("retro hoodie jacket");

        assert_eq!(signals.keywords, vec!["retro".to_string(), "jacket".to_string()]);
        assert_eq!(signals.vibes, vec!["retro".to_string()]);
    }
}
