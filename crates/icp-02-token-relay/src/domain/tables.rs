//! # Relay Tables
//!
//! Deposit staging with its `(contract, account, symbol)` index, and the
//! locked-balance table keyed by packet sequence.

use std::collections::{BTreeMap, HashMap};

use shared_types::{Asset, Name, Symbol};

use super::entities::{Deposit, LockedBalance};
use super::errors::RelayError;

/// `deposits` table.
#[derive(Debug, Clone, Default)]
pub struct DepositTable {
    rows: BTreeMap<u64, Deposit>,
    next_pk: u64,
    by_account_asset: HashMap<(Name, Name, Symbol), u64>,
}

impl DepositTable {
    /// Staged deposit for an account and symbol.
    pub fn get(&self, contract: &Name, account: &Name, symbol: &Symbol) -> Option<&Deposit> {
        self.by_account_asset
            .get(&(contract.clone(), account.clone(), symbol.clone()))
            .and_then(|pk| self.rows.get(pk))
    }

    /// Add to the account's staged balance, creating the row if needed.
    pub fn stage(
        &mut self,
        contract: &Name,
        account: &Name,
        quantity: &Asset,
    ) -> Result<&Deposit, RelayError> {
        let key = (contract.clone(), account.clone(), quantity.symbol.clone());
        let pk = match self.by_account_asset.get(&key) {
            Some(&pk) => {
                let row = self
                    .rows
                    .get_mut(&pk)
                    .ok_or_else(|| RelayError::InvalidQuantity("dangling deposit index".into()))?;
                row.balance = row.balance.checked_add(quantity)?;
                pk
            }
            None => {
                let pk = self.next_pk;
                self.next_pk += 1;
                self.rows.insert(
                    pk,
                    Deposit {
                        pk,
                        contract: contract.clone(),
                        account: account.clone(),
                        balance: quantity.clone(),
                    },
                );
                self.by_account_asset.insert(key, pk);
                pk
            }
        };
        self.rows
            .get(&pk)
            .ok_or_else(|| RelayError::InvalidQuantity("dangling deposit index".into()))
    }

    /// Check that `quantity` can be drawn from the staged balance.
    pub fn check_consume(
        &self,
        contract: &Name,
        account: &Name,
        quantity: &Asset,
    ) -> Result<(), RelayError> {
        let deposit =
            self.get(contract, account, &quantity.symbol)
                .ok_or_else(|| RelayError::NoDeposit {
                    account: account.clone(),
                    symbol: quantity.symbol.to_string(),
                })?;
        if deposit.balance.amount < quantity.amount {
            return Err(RelayError::OverdrawnDeposit {
                available: deposit.balance.amount,
                requested: quantity.amount,
            });
        }
        Ok(())
    }

    /// Draw `quantity`; a row drawn to zero is erased.
    pub fn consume(
        &mut self,
        contract: &Name,
        account: &Name,
        quantity: &Asset,
    ) -> Result<(), RelayError> {
        self.check_consume(contract, account, quantity)?;
        let key = (contract.clone(), account.clone(), quantity.symbol.clone());
        let Some(&pk) = self.by_account_asset.get(&key) else {
            return Ok(());
        };
        let Some(row) = self.rows.get_mut(&pk) else {
            return Ok(());
        };
        if row.balance.amount == quantity.amount {
            self.rows.remove(&pk);
            self.by_account_asset.remove(&key);
        } else {
            row.balance = row.balance.checked_sub(quantity)?;
        }
        Ok(())
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `locked` table: one row per unresolved outbound packet.
#[derive(Debug, Clone, Default)]
pub struct LockedTable {
    rows: BTreeMap<u64, LockedBalance>,
}

impl LockedTable {
    /// Insert a lock; `false` if the sequence is already locked.
    pub fn insert(&mut self, lock: LockedBalance) -> bool {
        if self.rows.contains_key(&lock.seq) {
            return false;
        }
        self.rows.insert(lock.seq, lock);
        true
    }

    /// Lock by packet sequence.
    pub fn get(&self, seq: u64) -> Option<&LockedBalance> {
        self.rows.get(&seq)
    }

    /// Remove a lock.
    pub fn remove(&mut self, seq: u64) -> Option<LockedBalance> {
        self.rows.remove(&seq)
    }

    /// All locks, by sequence.
    pub fn iter(&self) -> impl Iterator<Item = &LockedBalance> {
        self.rows.values()
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
