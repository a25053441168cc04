//! # Assets
//!
//! Fixed-precision token amounts tagged with their symbol.
//!
//! Text forms follow the ledger convention: a symbol is `"4,EOS"` and an asset
//! is `"1.0000 EOS"`, the number of decimals carrying the precision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TypeError;

/// Largest absolute amount an asset may hold (2^62 - 1).
pub const MAX_AMOUNT: i64 = (1 << 62) - 1;

/// Largest supported decimal precision.
pub const MAX_PRECISION: u8 = 18;

const MAX_SYMBOL_CODE_LEN: usize = 7;

/// Token symbol: upper-case code plus decimal precision.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    /// Create a validated symbol.
    pub fn new(precision: u8, code: impl Into<String>) -> Result<Self, TypeError> {
        let symbol = Self {
            precision,
            code: code.into(),
        };
        if !symbol.is_valid() {
            return Err(TypeError::InvalidSymbol(format!(
                "{},{}",
                symbol.precision, symbol.code
            )));
        }
        Ok(symbol)
    }

    /// Decimal precision.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Symbol code, e.g. `EOS`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Code length and charset, precision bound.
    pub fn is_valid(&self) -> bool {
        self.precision <= MAX_PRECISION
            && !self.code.is_empty()
            && self.code.len() <= MAX_SYMBOL_CODE_LEN
            && self.code.bytes().all(|b| b.is_ascii_uppercase())
    }

    fn scale(&self) -> u128 {
        10u128.pow(u32::from(self.precision))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl FromStr for Symbol {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| TypeError::InvalidSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| TypeError::InvalidSymbol(s.to_string()))?;
        Self::new(precision, code.trim())
    }
}

impl TryFrom<String> for Symbol {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// A signed token amount in the symbol's smallest unit.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    /// Amount in smallest units.
    pub amount: i64,
    /// Symbol the amount is denominated in.
    pub symbol: Symbol,
}

impl Asset {
    /// Create a validated asset.
    pub fn new(amount: i64, symbol: Symbol) -> Result<Self, TypeError> {
        let asset = Self { amount, symbol };
        if !asset.is_amount_within_range() {
            return Err(TypeError::AmountOutOfRange);
        }
        Ok(asset)
    }

    /// Zero of the given symbol.
    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// |amount| ≤ 2^62 - 1.
    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_AMOUNT..=MAX_AMOUNT).contains(&self.amount)
    }

    /// Amount in range and symbol well-formed.
    pub fn is_valid(&self) -> bool {
        self.is_amount_within_range() && self.symbol.is_valid()
    }

    /// Add two assets of the same symbol.
    pub fn checked_add(&self, other: &Asset) -> Result<Asset, TypeError> {
        self.ensure_same_symbol(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(TypeError::AmountOutOfRange)?;
        Asset::new(amount, self.symbol.clone())
    }

    /// Subtract an asset of the same symbol.
    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, TypeError> {
        self.ensure_same_symbol(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(TypeError::AmountOutOfRange)?;
        Asset::new(amount, self.symbol.clone())
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<(), TypeError> {
        if self.symbol != other.symbol {
            return Err(TypeError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = u128::from(self.amount.unsigned_abs());
        let scale = self.symbol.scale();
        let whole = abs / scale;
        if self.symbol.precision == 0 {
            return write!(f, "{sign}{whole} {}", self.symbol.code);
        }
        let frac = abs % scale;
        let width = usize::from(self.symbol.precision);
        write!(f, "{sign}{whole}.{frac:0width$} {}", self.symbol.code)
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidAsset(s.to_string());
        let (number, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let precision = u8::try_from(frac.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision, code.trim())?;

        let scale = i64::try_from(symbol.scale()).map_err(|_| TypeError::AmountOutOfRange)?;
        let whole: i64 = whole.parse().map_err(|_| TypeError::AmountOutOfRange)?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| TypeError::AmountOutOfRange)?
        };
        let magnitude = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac))
            .ok_or(TypeError::AmountOutOfRange)?;
        Asset::new(if negative { -magnitude } else { magnitude }, symbol)
    }
}

impl TryFrom<String> for Asset {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}
