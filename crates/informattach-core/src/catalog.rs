//! Catalog entities — the six normalized tables the importer reconciles into,
//! plus the write-side `New*` inputs accepted by a [`CatalogStore`].
//!
//! Identifiers are assigned by the store. Core products are keyed externally
//! by their `isku`; everything else is keyed by the natural keys documented on
//! each type.
//!
//! [`CatalogStore`]: crate::store::CatalogStore

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Marketplaces ────────────────────────────────────────────────────────────

/// A commerce platform instance, e.g. Amazon/US. Unique on `(name, region)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
  pub marketplace_id: Uuid,
  pub name:           String,
  pub region:         String,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMarketplace {
  pub name:   String,
  pub region: String,
}

// ─── Suppliers & stores ──────────────────────────────────────────────────────

/// The kind of channel inventory is sourced from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SupplierKind {
  /// Bought from another marketplace's retail listing.
  #[default]
  Marketplace,
  Wholesaler,
  Manufacturer,
}

/// A sourcing channel on a marketplace. Unique on `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
  pub supplier_id:    Uuid,
  pub name:           String,
  pub marketplace_id: Uuid,
  pub kind:           SupplierKind,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
  pub name:           String,
  pub marketplace_id: Uuid,
  pub kind:           SupplierKind,
}

/// A selling storefront on a marketplace. Unique on `store_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
  pub store_id:       Uuid,
  pub store_name:     String,
  pub marketplace_id: Uuid,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStore {
  pub store_name:     String,
  pub marketplace_id: Uuid,
}

// ─── Core products ───────────────────────────────────────────────────────────

/// The marketplace-independent identity of a product.
///
/// `isku` is globally unique; `asin` and `upc` are unique when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProduct {
  pub product_id:          Uuid,
  pub isku:                String,
  pub asin:                Option<String>,
  pub upc:                 Option<String>,
  pub requires_expiration: bool,
  pub created_at:          DateTime<Utc>,
}

/// Input for [`CatalogStore::insert_product`](crate::store::CatalogStore::insert_product).
///
/// The title and media URLs become child rows written in the same call as
/// the product; they are never rewritten afterwards.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
  pub isku:                String,
  pub asin:                Option<String>,
  pub upc:                 Option<String>,
  pub requires_expiration: bool,
  pub base_title:          String,
  pub media_urls:          Vec<String>,
}

impl NewProduct {
  /// Build a product input from raw form/CLI values.
  ///
  /// Blank `asin`/`upc` become `None` so the uniqueness constraints on those
  /// columns only apply to real identifiers.
  pub fn new(
    isku: &str,
    base_title: &str,
    asin: Option<&str>,
    upc: Option<&str>,
  ) -> crate::Result<Self> {
    let isku = isku.trim();
    let base_title = base_title.trim();
    if isku.is_empty() {
      return Err(crate::Error::MissingField("isku"));
    }
    if base_title.is_empty() {
      return Err(crate::Error::MissingField("base title"));
    }

    Ok(Self {
      isku: isku.to_owned(),
      asin: asin.and_then(non_blank),
      upc: upc.and_then(non_blank),
      requires_expiration: false,
      base_title: base_title.to_owned(),
      media_urls: Vec::new(),
    })
  }
}

/// A product joined with its title and first media URL, for display and
/// export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
  pub product:    CoreProduct,
  pub base_title: Option<String>,
  pub media_url:  Option<String>,
}

// ─── Junctions ───────────────────────────────────────────────────────────────

/// Links a product to a supplier (the cost side). Unique on
/// `(product_id, supplier_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:   Uuid,
  pub product_id:  Uuid,
  pub supplier_id: Uuid,
  pub source_code: String,
  pub base_cost:   Decimal,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSource {
  pub product_id:  Uuid,
  pub supplier_id: Uuid,
  pub source_code: String,
  pub base_cost:   Decimal,
}

/// Links a product to a store (the price side). Unique on
/// `(product_id, store_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
  pub listing_id:      Uuid,
  pub product_id:      Uuid,
  pub store_id:        Uuid,
  pub channel_item_id: String,
  pub listed_price:    Decimal,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
  pub product_id:      Uuid,
  pub store_id:        Uuid,
  pub channel_item_id: String,
  pub listed_price:    Decimal,
}

fn non_blank(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_owned())
}
