//! The `CatalogStore` trait and failure classification.
//!
//! The trait is implemented by storage backends (e.g.
//! `informattach-store-sqlite`). The import engine only ever needs
//! get-by-key, insert and select-all per table; the remaining methods serve
//! the re-pricing and export commands.

use std::future::Future;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  catalog::{
    CoreProduct, Listing, Marketplace, NewListing, NewMarketplace, NewProduct,
    NewSource, NewStore, NewSupplier, ProductSummary, Source, Store, Supplier,
  },
  pricing::PricingRule,
};

// ─── Failure classification ──────────────────────────────────────────────────

/// Coarse category of a backend failure, as seen by the import engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// A uniqueness or referential constraint rejected the write. Recoverable
  /// per row.
  Conflict,
  /// The backend cannot be reached at all. Continuing would fail every
  /// remaining row.
  Unavailable,
  Other,
}

/// Implemented by backend error types so callers can tell a lost connection
/// apart from a rejected write.
pub trait ClassifyFailure {
  fn failure_kind(&self) -> FailureKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store holding the catalog.
///
/// Every insert commits immediately. Implementations must enforce the
/// uniqueness constraints documented on the entity types and report
/// violations as [`FailureKind::Conflict`].
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + ClassifyFailure + Send + Sync + 'static;

  // ── Marketplaces ──────────────────────────────────────────────────────

  fn find_marketplace<'a>(
    &'a self,
    name: &'a str,
    region: &'a str,
  ) -> impl Future<Output = Result<Option<Marketplace>, Self::Error>> + Send + 'a;

  fn insert_marketplace(
    &self,
    input: NewMarketplace,
  ) -> impl Future<Output = Result<Marketplace, Self::Error>> + Send + '_;

  fn list_marketplaces(
    &self,
  ) -> impl Future<Output = Result<Vec<Marketplace>, Self::Error>> + Send + '_;

  // ── Suppliers ─────────────────────────────────────────────────────────

  fn find_supplier<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + 'a;

  fn insert_supplier(
    &self,
    input: NewSupplier,
  ) -> impl Future<Output = Result<Supplier, Self::Error>> + Send + '_;

  fn list_suppliers(
    &self,
  ) -> impl Future<Output = Result<Vec<Supplier>, Self::Error>> + Send + '_;

  // ── Stores ────────────────────────────────────────────────────────────

  fn find_store<'a>(
    &'a self,
    store_name: &'a str,
  ) -> impl Future<Output = Result<Option<Store>, Self::Error>> + Send + 'a;

  fn insert_store(
    &self,
    input: NewStore,
  ) -> impl Future<Output = Result<Store, Self::Error>> + Send + '_;

  fn list_stores(
    &self,
  ) -> impl Future<Output = Result<Vec<Store>, Self::Error>> + Send + '_;

  // ── Core products ─────────────────────────────────────────────────────

  fn find_product<'a>(
    &'a self,
    isku: &'a str,
  ) -> impl Future<Output = Result<Option<CoreProduct>, Self::Error>> + Send + 'a;

  /// Create a product together with its title and media child rows.
  fn insert_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<CoreProduct, Self::Error>> + Send + '_;

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<CoreProduct>, Self::Error>> + Send + '_;

  /// All products joined with their title and first media URL.
  fn list_product_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<ProductSummary>, Self::Error>> + Send + '_;

  // ── Sources ───────────────────────────────────────────────────────────

  fn find_sources_for_product(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;

  fn insert_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  /// All sources in creation order.
  fn list_sources(
    &self,
  ) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;

  // ── Listings ──────────────────────────────────────────────────────────

  fn find_listings_for_product(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Listing>, Self::Error>> + Send + '_;

  fn insert_listing(
    &self,
    input: NewListing,
  ) -> impl Future<Output = Result<Listing, Self::Error>> + Send + '_;

  fn list_listings(
    &self,
  ) -> impl Future<Output = Result<Vec<Listing>, Self::Error>> + Send + '_;

  /// Overwrite a listing's price. The importer never calls this; only
  /// explicit re-pricing does.
  fn update_listing_price(
    &self,
    listing_id: Uuid,
    price: Decimal,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Pricing rules ─────────────────────────────────────────────────────

  /// Insert the rule, replacing any existing rule for the same marketplace.
  fn upsert_pricing_rule(
    &self,
    rule: PricingRule,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_pricing_rule<'a>(
    &'a self,
    marketplace: &'a str,
  ) -> impl Future<Output = Result<Option<PricingRule>, Self::Error>> + Send + 'a;
}
