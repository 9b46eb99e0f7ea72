//! Core types and the import engine for the Informattach catalog.
//!
//! This crate is deliberately free of database and CLI dependencies. Storage
//! backends implement [`store::CatalogStore`]; the import engine and the
//! pricing/export helpers are generic over it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod export;
pub mod import;
pub mod normalize;
pub mod pricing;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
