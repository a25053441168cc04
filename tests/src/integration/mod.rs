//! Cross-crate flows between two simulated chains.

#[cfg(test)]
pub mod harness;

#[cfg(test)]
mod flows;
#[cfg(test)]
mod node;
