//! In-memory token ledger.
//!
//! Native balances per `(contract, account, symbol)`, plus the relay's
//! wrapped books for tokens that originate on the peer chain: one supply
//! record per `(peer contract, symbol code)` and the holders' balances.

use std::collections::HashMap;

use shared_types::{Asset, Name, Symbol, MAX_AMOUNT};

use crate::domain::{invariant_positive_quantity, LedgerError, MAX_MEMO_LEN};
use crate::ports::TokenLedger;

/// Supply record of a wrapped token.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WrappedStats {
    supply: Asset,
}

/// `TokenLedger` backed by hash maps.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTokenLedger {
    native: HashMap<(Name, Name, Symbol), i64>,
    stats: HashMap<(Name, String), WrappedStats>,
    wrapped: HashMap<(Name, Name, String), i64>,
}

fn check_quantity(quantity: &Asset) -> Result<(), LedgerError> {
    invariant_positive_quantity(quantity).map_err(|e| LedgerError::InvalidQuantity(e.to_string()))
}

/// Balance after crediting `quantity`, bounded by `MAX_AMOUNT`.
fn credit(current: i64, quantity: &Asset) -> Result<i64, LedgerError> {
    current
        .checked_add(quantity.amount)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or(LedgerError::SupplyOverflow)
}

impl InMemoryTokenLedger {
    /// Credit native tokens out of thin air; genesis funding for tests and
    /// the node's bootstrap.
    pub fn issue(
        &mut self,
        contract: &Name,
        to: &Name,
        quantity: &Asset,
    ) -> Result<(), LedgerError> {
        check_quantity(quantity)?;
        let key = (contract.clone(), to.clone(), quantity.symbol.clone());
        let credited = credit(self.native.get(&key).copied().unwrap_or(0), quantity)?;
        self.native.insert(key, credited);
        Ok(())
    }

    /// Native balance, 0 when absent.
    pub fn balance(&self, contract: &Name, account: &Name, symbol: &Symbol) -> i64 {
        self.native
            .get(&(contract.clone(), account.clone(), symbol.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Register a wrapped token for peer `contract` with zero supply.
    pub fn create(&mut self, contract: &Name, symbol: &Symbol) -> Result<(), LedgerError> {
        if !symbol.is_valid() {
            return Err(LedgerError::InvalidQuantity(format!("invalid symbol {symbol}")));
        }
        let key = (contract.clone(), symbol.code().to_string());
        if self.stats.contains_key(&key) {
            return Err(LedgerError::TokenExists {
                contract: contract.clone(),
                symbol: symbol.code().to_string(),
            });
        }
        self.stats.insert(
            key,
            WrappedStats {
                supply: Asset::zero(symbol.clone()),
            },
        );
        Ok(())
    }

    /// Outstanding wrapped supply.
    pub fn supply(&self, contract: &Name, symbol: &Symbol) -> Option<Asset> {
        self.stats
            .get(&(contract.clone(), symbol.code().to_string()))
            .map(|s| s.supply.clone())
    }

    /// Wrapped balance, 0 when absent.
    pub fn wrapped_balance(&self, contract: &Name, account: &Name, symbol: &Symbol) -> i64 {
        self.wrapped
            .get(&(contract.clone(), account.clone(), symbol.code().to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Move wrapped tokens between holders.
    pub fn transfer_wrapped(
        &mut self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }
        check_quantity(quantity)?;
        if memo.len() > MAX_MEMO_LEN {
            return Err(LedgerError::MemoTooLong(MAX_MEMO_LEN));
        }
        self.stats_for(contract, quantity)?;
        let code = quantity.symbol.code().to_string();
        let from_key = (contract.clone(), from.clone(), code.clone());
        let available = *self.wrapped.get(&from_key).ok_or_else(|| LedgerError::NoBalance {
            account: from.clone(),
        })?;
        if available < quantity.amount {
            return Err(LedgerError::Overdrawn {
                account: from.clone(),
            });
        }
        let to_key = (contract.clone(), to.clone(), code);
        let credited = credit(self.wrapped.get(&to_key).copied().unwrap_or(0), quantity)?;
        self.wrapped.insert(from_key, available - quantity.amount);
        self.wrapped.insert(to_key, credited);
        Ok(())
    }

    fn stats_for(&self, contract: &Name, quantity: &Asset) -> Result<&WrappedStats, LedgerError> {
        let stats = self
            .stats
            .get(&(contract.clone(), quantity.symbol.code().to_string()))
            .ok_or_else(|| LedgerError::TokenNotFound {
                contract: contract.clone(),
                symbol: quantity.symbol.code().to_string(),
            })?;
        if stats.supply.symbol != quantity.symbol {
            return Err(LedgerError::SymbolMismatch);
        }
        Ok(stats)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer(
        &mut self,
        contract: &Name,
        from: &Name,
        to: &Name,
        quantity: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }
        check_quantity(quantity)?;
        if memo.len() > MAX_MEMO_LEN {
            return Err(LedgerError::MemoTooLong(MAX_MEMO_LEN));
        }
        let from_key = (contract.clone(), from.clone(), quantity.symbol.clone());
        let available = *self.native.get(&from_key).ok_or_else(|| LedgerError::NoBalance {
            account: from.clone(),
        })?;
        if available < quantity.amount {
            return Err(LedgerError::Overdrawn {
                account: from.clone(),
            });
        }
        let to_key = (contract.clone(), to.clone(), quantity.symbol.clone());
        let credited = credit(self.native.get(&to_key).copied().unwrap_or(0), quantity)?;
        self.native.insert(from_key, available - quantity.amount);
        self.native.insert(to_key, credited);
        Ok(())
    }

    fn mint(&mut self, contract: &Name, to: &Name, quantity: &Asset) -> Result<(), LedgerError> {
        check_quantity(quantity)?;
        let supply = self.stats_for(contract, quantity)?.supply.amount;
        if quantity.amount > MAX_AMOUNT - supply {
            return Err(LedgerError::SupplyOverflow);
        }
        let code = quantity.symbol.code().to_string();
        if let Some(stats) = self.stats.get_mut(&(contract.clone(), code.clone())) {
            stats.supply.amount += quantity.amount;
        }
        *self
            .wrapped
            .entry((contract.clone(), to.clone(), code))
            .or_insert(0) += quantity.amount;
        Ok(())
    }

    fn burn(&mut self, contract: &Name, from: &Name, quantity: &Asset) -> Result<(), LedgerError> {
        check_quantity(quantity)?;
        let supply = self.stats_for(contract, quantity)?.supply.amount;
        if quantity.amount > supply {
            return Err(LedgerError::SupplyExceeded);
        }
        let code = quantity.symbol.code().to_string();
        let key = (contract.clone(), from.clone(), code.clone());
        let available = *self.wrapped.get(&key).ok_or_else(|| LedgerError::NoBalance {
            account: from.clone(),
        })?;
        if available < quantity.amount {
            return Err(LedgerError::Overdrawn {
                account: from.clone(),
            });
        }
        self.wrapped.insert(key, available - quantity.amount);
        if let Some(stats) = self.stats.get_mut(&(contract.clone(), code)) {
            stats.supply.amount -= quantity.amount;
        }
        Ok(())
    }
}
