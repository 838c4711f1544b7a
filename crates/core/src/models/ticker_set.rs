use serde::{Deserialize, Serialize};

/// Trim and uppercase user input into a ticker symbol.
pub fn normalize_ticker_symbol(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Cheap syntactic check done before asking any provider.
///
/// Accepts the characters that appear in exchange symbols
/// (`BRK-B`, `^GSPC`, `EURUSD=X`, `VOD.L`) and nothing else.
pub fn is_well_formed_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 16
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '&'))
}

/// Ordered, duplicate-free list of ticker symbols.
///
/// Order is display order (legend and color assignment), so it is controlled
/// explicitly by the caller and never derived from map iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSet {
    symbols: Vec<String>,
}

impl TickerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, keeping the first occurrence of each symbol.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for symbol in symbols {
            set.push(symbol);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Append `symbol` unless already present. Returns whether it was added.
    pub fn push(&mut self, symbol: impl Into<String>) -> bool {
        let symbol = symbol.into();
        if self.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// Remove `symbol`, returning the position it occupied.
    pub fn remove(&mut self, symbol: &str) -> Option<usize> {
        let idx = self.position(symbol)?;
        self.symbols.remove(idx);
        Some(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.symbols
    }

    /// True when both sets hold the same symbols, in any order.
    pub fn same_members(&self, other: &TickerSet) -> bool {
        self.len() == other.len() && other.iter().all(|s| self.contains(s))
    }
}

impl<'a> IntoIterator for &'a TickerSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}
