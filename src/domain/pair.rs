use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// A trading pair as used in exchange URLs and as the store tag, e.g. `btcusd`.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[serde(from = "String", into = "String")]
pub struct TradingPair {
    symbol: String,
}

impl TradingPair {
    /// Accepts both display (`BTC/USD`) and url (`btcusd`) forms.
    pub fn new(text: &str) -> Self {
        Self {
            symbol: text.trim().replace('/', "").to_lowercase(),
        }
    }

    // The name we pass into the exchange API and use as the store tag
    pub fn url_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

impl From<String> for TradingPair {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<&str> for TradingPair {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<TradingPair> for String {
    fn from(pair: TradingPair) -> Self {
        pair.symbol
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
