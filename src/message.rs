use rand::seq::SliceRandom;

/// Source of the decorative message appended to every analysis result.
pub trait MessageSource: Send + Sync {
    fn message(&self) -> String;
}

const DEFAULT_QUOTES: [&str; 8] = [
    "Count your life by smiles, not tears. Count your age by friends, not years.",
    "The more you praise and celebrate your life, the more there is in life to celebrate.",
    "Today you are you, that is truer than true. There is no one alive who is youer than you.",
    "Age is merely the number of years the world has been enjoying you.",
    "May the years continue to be good to you.",
    "Another adventure-filled year awaits you.",
    "Wishing you a day filled with happiness and a year filled with joy.",
    "You are never too old to set another goal or to dream a new dream.",
];

/// Picks a quote uniformly at random on every call.
pub struct QuoteBook {
    quotes: Vec<String>,
}

impl QuoteBook {
    /// Falls back to the built-in quotes when `quotes` is empty.
    pub fn new(quotes: Vec<String>) -> Self {
        if quotes.is_empty() {
            Self::default()
        } else {
            Self { quotes }
        }
    }
}

impl Default for QuoteBook {
    fn default() -> Self {
        Self {
            quotes: DEFAULT_QUOTES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl MessageSource for QuoteBook {
    fn message(&self) -> String {
        self.quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}
