//! [`SqliteStore`] — the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use informattach_core::{
  catalog::{
    CoreProduct, Listing, Marketplace, NewListing, NewMarketplace, NewProduct,
    NewSource, NewStore, NewSupplier, ProductSummary, Source, Store, Supplier,
  },
  pricing::PricingRule,
  store::CatalogStore,
};
use rusqlite::OptionalExtension as _;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    LISTING_COLUMNS, MARKETPLACE_COLUMNS, PRODUCT_COLUMNS, RawListing,
    RawMarketplace, RawPricingRule, RawProduct, RawSource, RawStore,
    RawSupplier, SOURCE_COLUMNS, STORE_COLUMNS, SUPPLIER_COLUMNS,
    encode_decimal, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }

  /// Run `sql` with string parameters and map every row.
  async fn query_all<T, F>(&self, sql: String, params: Vec<String>, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Run `sql` with string parameters and map the first row, if any.
  async fn query_opt<T, F>(&self, sql: String, params: Vec<String>, map: F) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), map)
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Marketplaces ──────────────────────────────────────────────────────────

  async fn find_marketplace(&self, name: &str, region: &str) -> Result<Option<Marketplace>> {
    let raw = self
      .query_opt(
        format!("SELECT {MARKETPLACE_COLUMNS} FROM marketplaces WHERE name = ?1 AND region = ?2"),
        vec![name.to_owned(), region.to_owned()],
        RawMarketplace::from_row,
      )
      .await?;
    raw.map(RawMarketplace::into_marketplace).transpose()
  }

  async fn insert_marketplace(&self, input: NewMarketplace) -> Result<Marketplace> {
    let marketplace = Marketplace {
      marketplace_id: Uuid::new_v4(),
      name:           input.name,
      region:         input.region,
      created_at:     Utc::now(),
    };

    let id_str = encode_uuid(marketplace.marketplace_id);
    let name   = marketplace.name.clone();
    let region = marketplace.region.clone();
    let at_str = encode_dt(marketplace.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO marketplaces (marketplace_id, name, region, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, region, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(marketplace)
  }

  async fn list_marketplaces(&self) -> Result<Vec<Marketplace>> {
    let raws = self
      .query_all(
        format!("SELECT {MARKETPLACE_COLUMNS} FROM marketplaces ORDER BY rowid"),
        vec![],
        RawMarketplace::from_row,
      )
      .await?;
    raws.into_iter().map(RawMarketplace::into_marketplace).collect()
  }

  // ── Suppliers ─────────────────────────────────────────────────────────────

  async fn find_supplier(&self, name: &str) -> Result<Option<Supplier>> {
    let raw = self
      .query_opt(
        format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?1"),
        vec![name.to_owned()],
        RawSupplier::from_row,
      )
      .await?;
    raw.map(RawSupplier::into_supplier).transpose()
  }

  async fn insert_supplier(&self, input: NewSupplier) -> Result<Supplier> {
    let supplier = Supplier {
      supplier_id:    Uuid::new_v4(),
      name:           input.name,
      marketplace_id: input.marketplace_id,
      kind:           input.kind,
      created_at:     Utc::now(),
    };

    let id_str          = encode_uuid(supplier.supplier_id);
    let name            = supplier.name.clone();
    let marketplace_str = encode_uuid(supplier.marketplace_id);
    let kind_str        = supplier.kind.to_string();
    let at_str          = encode_dt(supplier.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO suppliers (supplier_id, name, marketplace_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, marketplace_str, kind_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(supplier)
  }

  async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
    let raws = self
      .query_all(
        format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY rowid"),
        vec![],
        RawSupplier::from_row,
      )
      .await?;
    raws.into_iter().map(RawSupplier::into_supplier).collect()
  }

  // ── Stores ────────────────────────────────────────────────────────────────

  async fn find_store(&self, store_name: &str) -> Result<Option<Store>> {
    let raw = self
      .query_opt(
        format!("SELECT {STORE_COLUMNS} FROM stores WHERE store_name = ?1"),
        vec![store_name.to_owned()],
        RawStore::from_row,
      )
      .await?;
    raw.map(RawStore::into_store).transpose()
  }

  async fn insert_store(&self, input: NewStore) -> Result<Store> {
    let store = Store {
      store_id:       Uuid::new_v4(),
      store_name:     input.store_name,
      marketplace_id: input.marketplace_id,
      created_at:     Utc::now(),
    };

    let id_str          = encode_uuid(store.store_id);
    let name            = store.store_name.clone();
    let marketplace_str = encode_uuid(store.marketplace_id);
    let at_str          = encode_dt(store.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO stores (store_id, store_name, marketplace_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, marketplace_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(store)
  }

  async fn list_stores(&self) -> Result<Vec<Store>> {
    let raws = self
      .query_all(
        format!("SELECT {STORE_COLUMNS} FROM stores ORDER BY rowid"),
        vec![],
        RawStore::from_row,
      )
      .await?;
    raws.into_iter().map(RawStore::into_store).collect()
  }

  // ── Core products ─────────────────────────────────────────────────────────

  async fn find_product(&self, isku: &str) -> Result<Option<CoreProduct>> {
    let raw = self
      .query_opt(
        format!("SELECT {PRODUCT_COLUMNS} FROM core_products p WHERE p.isku = ?1"),
        vec![isku.to_owned()],
        RawProduct::from_row,
      )
      .await?;
    raw.map(RawProduct::into_product).transpose()
  }

  async fn insert_product(&self, input: NewProduct) -> Result<CoreProduct> {
    let product = CoreProduct {
      product_id:          Uuid::new_v4(),
      isku:                input.isku,
      asin:                input.asin,
      upc:                 input.upc,
      requires_expiration: input.requires_expiration,
      created_at:          Utc::now(),
    };

    let id_str     = encode_uuid(product.product_id);
    let isku       = product.isku.clone();
    let asin       = product.asin.clone();
    let upc        = product.upc.clone();
    let requires   = product.requires_expiration;
    let at_str     = encode_dt(product.created_at);
    let base_title = input.base_title;
    let media_urls = input.media_urls;

    // Product, title and media commit together or not at all.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO core_products
             (product_id, isku, asin, upc, requires_expiration, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, isku, asin, upc, requires, at_str],
        )?;
        tx.execute(
          "INSERT INTO product_base_content (product_id, base_title) VALUES (?1, ?2)",
          rusqlite::params![id_str, base_title],
        )?;
        for (position, url) in media_urls.iter().enumerate() {
          tx.execute(
            "INSERT INTO product_media (product_id, position, url) VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, (position as i64), url],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(product)
  }

  async fn list_products(&self) -> Result<Vec<CoreProduct>> {
    let raws = self
      .query_all(
        format!("SELECT {PRODUCT_COLUMNS} FROM core_products p ORDER BY p.rowid"),
        vec![],
        RawProduct::from_row,
      )
      .await?;
    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn list_product_summaries(&self) -> Result<Vec<ProductSummary>> {
    let raws = self
      .query_all(
        format!(
          "SELECT {PRODUCT_COLUMNS},
             c.base_title,
             (SELECT m.url FROM product_media m
               WHERE m.product_id = p.product_id
               ORDER BY m.position LIMIT 1)
           FROM core_products p
           LEFT JOIN product_base_content c ON c.product_id = p.product_id
           ORDER BY p.rowid"
        ),
        vec![],
        RawProduct::from_summary_row,
      )
      .await?;
    raws.into_iter().map(RawProduct::into_summary).collect()
  }

  // ── Sources ───────────────────────────────────────────────────────────────

  async fn find_sources_for_product(&self, product_id: Uuid) -> Result<Vec<Source>> {
    let raws = self
      .query_all(
        format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE product_id = ?1 ORDER BY rowid"),
        vec![encode_uuid(product_id)],
        RawSource::from_row,
      )
      .await?;
    raws.into_iter().map(RawSource::into_source).collect()
  }

  async fn insert_source(&self, input: NewSource) -> Result<Source> {
    let source = Source {
      source_id:   Uuid::new_v4(),
      product_id:  input.product_id,
      supplier_id: input.supplier_id,
      source_code: input.source_code,
      base_cost:   input.base_cost,
      created_at:  Utc::now(),
    };

    let id_str       = encode_uuid(source.source_id);
    let product_str  = encode_uuid(source.product_id);
    let supplier_str = encode_uuid(source.supplier_id);
    let code         = source.source_code.clone();
    let cost_str     = encode_decimal(source.base_cost);
    let at_str       = encode_dt(source.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sources
             (source_id, product_id, supplier_id, source_code, base_cost, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, product_str, supplier_str, code, cost_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(source)
  }

  async fn list_sources(&self) -> Result<Vec<Source>> {
    let raws = self
      .query_all(
        format!("SELECT {SOURCE_COLUMNS} FROM sources ORDER BY rowid"),
        vec![],
        RawSource::from_row,
      )
      .await?;
    raws.into_iter().map(RawSource::into_source).collect()
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  async fn find_listings_for_product(&self, product_id: Uuid) -> Result<Vec<Listing>> {
    let raws = self
      .query_all(
        format!("SELECT {LISTING_COLUMNS} FROM listings WHERE product_id = ?1 ORDER BY rowid"),
        vec![encode_uuid(product_id)],
        RawListing::from_row,
      )
      .await?;
    raws.into_iter().map(RawListing::into_listing).collect()
  }

  async fn insert_listing(&self, input: NewListing) -> Result<Listing> {
    let listing = Listing {
      listing_id:      Uuid::new_v4(),
      product_id:      input.product_id,
      store_id:        input.store_id,
      channel_item_id: input.channel_item_id,
      listed_price:    input.listed_price,
      created_at:      Utc::now(),
    };

    let id_str      = encode_uuid(listing.listing_id);
    let product_str = encode_uuid(listing.product_id);
    let store_str   = encode_uuid(listing.store_id);
    let item_id     = listing.channel_item_id.clone();
    let price_str   = encode_decimal(listing.listed_price);
    let at_str      = encode_dt(listing.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO listings
             (listing_id, product_id, store_id, channel_item_id, listed_price, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, product_str, store_str, item_id, price_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(listing)
  }

  async fn list_listings(&self) -> Result<Vec<Listing>> {
    let raws = self
      .query_all(
        format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY rowid"),
        vec![],
        RawListing::from_row,
      )
      .await?;
    raws.into_iter().map(RawListing::into_listing).collect()
  }

  async fn update_listing_price(&self, listing_id: Uuid, price: Decimal) -> Result<()> {
    let id_str    = encode_uuid(listing_id);
    let price_str = encode_decimal(price);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE listings SET listed_price = ?2 WHERE listing_id = ?1",
          rusqlite::params![id_str, price_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ListingNotFound(listing_id));
    }
    Ok(())
  }

  // ── Pricing rules ─────────────────────────────────────────────────────────

  async fn upsert_pricing_rule(&self, rule: PricingRule) -> Result<()> {
    let commission = encode_decimal(rule.commission_rate);
    let fixed_fee  = encode_decimal(rule.fixed_fee);
    let tax        = encode_decimal(rule.tax_rate);
    let margin     = encode_decimal(rule.profit_margin);
    let market     = rule.marketplace;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pricing_rules
             (marketplace, commission_rate, fixed_fee, tax_rate, profit_margin)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (marketplace) DO UPDATE SET
             commission_rate = excluded.commission_rate,
             fixed_fee       = excluded.fixed_fee,
             tax_rate        = excluded.tax_rate,
             profit_margin   = excluded.profit_margin",
          rusqlite::params![market, commission, fixed_fee, tax, margin],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_pricing_rule(&self, marketplace: &str) -> Result<Option<PricingRule>> {
    let raw = self
      .query_opt(
        "SELECT marketplace, commission_rate, fixed_fee, tax_rate, profit_margin
         FROM pricing_rules WHERE marketplace = ?1"
          .to_owned(),
        vec![marketplace.to_owned()],
        |row| {
          Ok(RawPricingRule {
            marketplace:     row.get(0)?,
            commission_rate: row.get(1)?,
            fixed_fee:       row.get(2)?,
            tax_rate:        row.get(3)?,
            profit_margin:   row.get(4)?,
          })
        },
      )
      .await?;
    raw.map(RawPricingRule::into_rule).transpose()
  }
}
