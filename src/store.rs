use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use log::debug;

use crate::core::Holding;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    InvalidSymbol,
    InvalidShares(f64),
    MissingShares,
    Unavailable,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidSymbol => write!(f, "symbol must not be empty"),
            StoreError::InvalidShares(shares) => {
                write!(f, "shares must be a finite number >= 0, got {shares}")
            }
            StoreError::MissingShares => write!(f, "shares is required"),
            StoreError::Unavailable => write!(f, "holding store is unavailable"),
        }
    }
}

impl std::error::Error for StoreError {}

pub trait HoldingStore: Send + Sync {
    fn load_holdings(&self, user_id: &str) -> Result<Vec<Holding>, StoreError>;

    // Zero shares removes the holding.
    fn save_shares(&self, user_id: &str, symbol: &str, shares: f64) -> Result<(), StoreError>;

    fn upsert_holding(&self, user_id: &str, holding: Holding) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryHoldingStore {
    users: RwLock<HashMap<String, Vec<Holding>>>,
}

impl InMemoryHoldingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, StoreError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(StoreError::InvalidSymbol);
    }
    Ok(symbol)
}

fn validate_shares(shares: f64) -> Result<(), StoreError> {
    if !shares.is_finite() || shares < 0.0 {
        return Err(StoreError::InvalidShares(shares));
    }
    Ok(())
}

impl HoldingStore for InMemoryHoldingStore {
    fn load_holdings(&self, user_id: &str) -> Result<Vec<Holding>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Unavailable)?;
        let mut holdings = users.get(user_id).cloned().unwrap_or_default();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(holdings)
    }

    fn save_shares(&self, user_id: &str, symbol: &str, shares: f64) -> Result<(), StoreError> {
        let symbol = normalize_symbol(symbol)?;
        validate_shares(shares)?;

        let mut users = self.users.write().map_err(|_| StoreError::Unavailable)?;
        let holdings = users.entry(user_id.to_string()).or_default();
        if shares == 0.0 {
            holdings.retain(|h| h.symbol != symbol);
            debug!("removed {symbol} for user {user_id}");
            return Ok(());
        }

        match holdings.iter_mut().find(|h| h.symbol == symbol) {
            Some(existing) => existing.shares = shares,
            None => holdings.push(Holding::new(&symbol, shares)),
        }
        debug!("saved {shares} shares of {symbol} for user {user_id}");
        Ok(())
    }

    fn upsert_holding(&self, user_id: &str, mut holding: Holding) -> Result<(), StoreError> {
        holding.symbol = normalize_symbol(&holding.symbol)?;
        validate_shares(holding.shares)?;

        let mut users = self.users.write().map_err(|_| StoreError::Unavailable)?;
        let holdings = users.entry(user_id.to_string()).or_default();
        match holdings.iter_mut().find(|h| h.symbol == holding.symbol) {
            Some(existing) => *existing = holding,
            None => holdings.push(holding),
        }
        Ok(())
    }
}
