//! Encoding and decoding helpers between catalog types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings and
//! money is stored as a decimal string so no precision is lost to REAL.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use informattach_core::{
  catalog::{
    CoreProduct, Listing, Marketplace, ProductSummary, Source, Store, Supplier,
    SupplierKind,
  },
  pricing::PricingRule,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn decode_supplier_kind(s: &str) -> Result<SupplierKind> {
  s.parse().map_err(|_| Error::SupplierKind(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const MARKETPLACE_COLUMNS: &str = "marketplace_id, name, region, created_at";

/// Raw strings read directly from a `marketplaces` row.
pub struct RawMarketplace {
  pub marketplace_id: String,
  pub name:           String,
  pub region:         String,
  pub created_at:     String,
}

impl RawMarketplace {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      marketplace_id: row.get(0)?,
      name:           row.get(1)?,
      region:         row.get(2)?,
      created_at:     row.get(3)?,
    })
  }

  pub fn into_marketplace(self) -> Result<Marketplace> {
    Ok(Marketplace {
      marketplace_id: decode_uuid(&self.marketplace_id)?,
      name:           self.name,
      region:         self.region,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const SUPPLIER_COLUMNS: &str = "supplier_id, name, marketplace_id, kind, created_at";

pub struct RawSupplier {
  pub supplier_id:    String,
  pub name:           String,
  pub marketplace_id: String,
  pub kind:           String,
  pub created_at:     String,
}

impl RawSupplier {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      supplier_id:    row.get(0)?,
      name:           row.get(1)?,
      marketplace_id: row.get(2)?,
      kind:           row.get(3)?,
      created_at:     row.get(4)?,
    })
  }

  pub fn into_supplier(self) -> Result<Supplier> {
    Ok(Supplier {
      supplier_id:    decode_uuid(&self.supplier_id)?,
      name:           self.name,
      marketplace_id: decode_uuid(&self.marketplace_id)?,
      kind:           decode_supplier_kind(&self.kind)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const STORE_COLUMNS: &str = "store_id, store_name, marketplace_id, created_at";

pub struct RawStore {
  pub store_id:       String,
  pub store_name:     String,
  pub marketplace_id: String,
  pub created_at:     String,
}

impl RawStore {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      store_id:       row.get(0)?,
      store_name:     row.get(1)?,
      marketplace_id: row.get(2)?,
      created_at:     row.get(3)?,
    })
  }

  pub fn into_store(self) -> Result<Store> {
    Ok(Store {
      store_id:       decode_uuid(&self.store_id)?,
      store_name:     self.store_name,
      marketplace_id: decode_uuid(&self.marketplace_id)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const PRODUCT_COLUMNS: &str =
  "p.product_id, p.isku, p.asin, p.upc, p.requires_expiration, p.created_at";

/// A `core_products` row, optionally joined with its title and first media
/// URL (columns 6 and 7).
pub struct RawProduct {
  pub product_id:          String,
  pub isku:                String,
  pub asin:                Option<String>,
  pub upc:                 Option<String>,
  pub requires_expiration: bool,
  pub created_at:          String,
  pub base_title:          Option<String>,
  pub media_url:           Option<String>,
}

impl RawProduct {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:          row.get(0)?,
      isku:                row.get(1)?,
      asin:                row.get(2)?,
      upc:                 row.get(3)?,
      requires_expiration: row.get(4)?,
      created_at:          row.get(5)?,
      base_title:          None,
      media_url:           None,
    })
  }

  pub fn from_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let mut raw = Self::from_row(row)?;
    raw.base_title = row.get(6)?;
    raw.media_url = row.get(7)?;
    Ok(raw)
  }

  pub fn into_product(self) -> Result<CoreProduct> {
    Ok(CoreProduct {
      product_id:          decode_uuid(&self.product_id)?,
      isku:                self.isku,
      asin:                self.asin,
      upc:                 self.upc,
      requires_expiration: self.requires_expiration,
      created_at:          decode_dt(&self.created_at)?,
    })
  }

  pub fn into_summary(mut self) -> Result<ProductSummary> {
    let base_title = self.base_title.take();
    let media_url = self.media_url.take();
    Ok(ProductSummary { product: self.into_product()?, base_title, media_url })
  }
}

pub const SOURCE_COLUMNS: &str =
  "source_id, product_id, supplier_id, source_code, base_cost, created_at";

pub struct RawSource {
  pub source_id:   String,
  pub product_id:  String,
  pub supplier_id: String,
  pub source_code: String,
  pub base_cost:   String,
  pub created_at:  String,
}

impl RawSource {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:   row.get(0)?,
      product_id:  row.get(1)?,
      supplier_id: row.get(2)?,
      source_code: row.get(3)?,
      base_cost:   row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      source_id:   decode_uuid(&self.source_id)?,
      product_id:  decode_uuid(&self.product_id)?,
      supplier_id: decode_uuid(&self.supplier_id)?,
      source_code: self.source_code,
      base_cost:   decode_decimal(&self.base_cost)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const LISTING_COLUMNS: &str =
  "listing_id, product_id, store_id, channel_item_id, listed_price, created_at";

pub struct RawListing {
  pub listing_id:      String,
  pub product_id:      String,
  pub store_id:        String,
  pub channel_item_id: String,
  pub listed_price:    String,
  pub created_at:      String,
}

impl RawListing {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      listing_id:      row.get(0)?,
      product_id:      row.get(1)?,
      store_id:        row.get(2)?,
      channel_item_id: row.get(3)?,
      listed_price:    row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_listing(self) -> Result<Listing> {
    Ok(Listing {
      listing_id:      decode_uuid(&self.listing_id)?,
      product_id:      decode_uuid(&self.product_id)?,
      store_id:        decode_uuid(&self.store_id)?,
      channel_item_id: self.channel_item_id,
      listed_price:    decode_decimal(&self.listed_price)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawPricingRule {
  pub marketplace:     String,
  pub commission_rate: String,
  pub fixed_fee:       String,
  pub tax_rate:        String,
  pub profit_margin:   String,
}

impl RawPricingRule {
  pub fn into_rule(self) -> Result<PricingRule> {
    Ok(PricingRule {
      marketplace:     self.marketplace,
      commission_rate: decode_decimal(&self.commission_rate)?,
      fixed_fee:       decode_decimal(&self.fixed_fee)?,
      tax_rate:        decode_decimal(&self.tax_rate)?,
      profit_margin:   decode_decimal(&self.profit_margin)?,
    })
  }
}
