//! # Application Module
//!
//! The fork store service orchestrating domain tables, algorithms and the
//! signature port.

pub mod service;

pub use service::ForkStore;
