use super::Category;

/// Filler words dropped from keyword extraction.
pub const DEFAULT_STOP_WORDS: &[&str] = &["best", "cheap", "good", "hot", "weather", "for"];

/// Mood and occasion words treated as soft relevance signals.
pub const DEFAULT_VIBE_TERMS: &[&str] = &[
    "cozy",
    "romantic",
    "classy",
    "luxury",
    "cute",
    "sporty",
    "minimalist",
    "aesthetic",
    "elegant",
    "casual",
    "formal",
    "gift",
    "birthday",
    "anniversary",
    "office",
    "summer",
    "winter",
];

/// Trigger words that add a category to the signal set.
#[derive(Clone, Copy, Debug)]
pub struct CategoryRule {
    pub category: Category,
    pub triggers: &'static [&'static str],
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Electronics,
        triggers: &[
            "phone",
            "smartphone",
            "mobile",
            "laptop",
            "electronic",
            "electronics",
            "ssd",
            "computer",
            "headphone",
            "earphone",
            "tv",
            "camera",
        ],
    },
    CategoryRule {
        category: Category::Jewelery,
        triggers: &[
            "jewel",
            "jewelry",
            "jewellery",
            "jewelery",
            "ring",
            "necklace",
            "bracelet",
            "earring",
            "gold",
            "silver",
            "diamond",
        ],
    },
    CategoryRule {
        category: Category::MensClothing,
        triggers: &[
            "men", "mens", "male", "shirt", "tshirt", "jacket", "hoodie", "pant", "jeans", "wear",
            "menswear",
        ],
    },
    CategoryRule {
        category: Category::WomensClothing,
        triggers: &[
            "women", "womens", "female", "dress", "skirt", "blouse", "top", "gown", "womenswear",
        ],
    },
];

/// Process-wide word lists read by the extractor. Loaded once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalVocabulary {
    pub stop_words: Vec<String>,
    pub vibe_terms: Vec<String>,
}

impl Default for SignalVocabulary {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|word| (*word).to_string()).collect(),
            vibe_terms: DEFAULT_VIBE_TERMS.iter().map(|word| (*word).to_string()).collect(),
        }
    }
}

impl SignalVocabulary {
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.iter().any(|word| word == token)
    }
}
