//! In-memory [`CatalogStore`] used by the engine tests.
//!
//! Enforces the same uniqueness rules as a real backend, counts create calls
//! per table and can be told to fail.

use std::sync::Mutex;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  catalog::{
    CoreProduct, Listing, Marketplace, NewListing, NewMarketplace, NewProduct,
    NewSource, NewStore, NewSupplier, ProductSummary, Source, Store, Supplier,
  },
  pricing::PricingRule,
  store::{CatalogStore, ClassifyFailure, FailureKind},
};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct MemoryError {
  pub kind:    FailureKind,
  pub message: String,
}

impl ClassifyFailure for MemoryError {
  fn failure_kind(&self) -> FailureKind { self.kind }
}

fn conflict(what: impl Into<String>) -> MemoryError {
  MemoryError { kind: FailureKind::Conflict, message: what.into() }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreateCounts {
  pub marketplaces: usize,
  pub suppliers:    usize,
  pub stores:       usize,
  pub products:     usize,
  pub sources:      usize,
  pub listings:     usize,
}

#[derive(Default)]
struct State {
  marketplaces: Vec<Marketplace>,
  suppliers:    Vec<Supplier>,
  stores:       Vec<Store>,
  products:     Vec<(CoreProduct, String, Vec<String>)>,
  sources:      Vec<Source>,
  listings:     Vec<Listing>,
  rules:        Vec<PricingRule>,
  creates:      CreateCounts,
  lookups:      usize,
  /// Remaining successful calls before every call fails as unavailable.
  calls_until_outage: Option<usize>,
  fail_listing_inserts: bool,
}

#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn creates(&self) -> CreateCounts { self.state.lock().unwrap().creates }

  /// Number of `find_*` calls served so far.
  pub fn lookups(&self) -> usize { self.state.lock().unwrap().lookups }

  pub fn reset_counters(&self) {
    let mut st = self.state.lock().unwrap();
    st.creates = CreateCounts::default();
    st.lookups = 0;
  }

  /// Allow `calls` more store calls, then report the backend as unavailable.
  pub fn go_down_after(&self, calls: usize) {
    self.state.lock().unwrap().calls_until_outage = Some(calls);
  }

  /// Make every listing insert fail with a conflict.
  pub fn reject_listings(&self) { self.state.lock().unwrap().fail_listing_inserts = true; }

  pub fn row_counts(&self) -> [usize; 6] {
    let st = self.state.lock().unwrap();
    [
      st.marketplaces.len(),
      st.suppliers.len(),
      st.stores.len(),
      st.products.len(),
      st.sources.len(),
      st.listings.len(),
    ]
  }

  pub fn product_title(&self, isku: &str) -> Option<String> {
    let st = self.state.lock().unwrap();
    st.products
      .iter()
      .find(|(p, ..)| p.isku == isku)
      .map(|(_, title, _)| title.clone())
  }

  pub fn source_costs(&self) -> Vec<Decimal> {
    self.state.lock().unwrap().sources.iter().map(|s| s.base_cost).collect()
  }

  fn with<T>(&self, f: impl FnOnce(&mut State) -> Result<T, MemoryError>) -> Result<T, MemoryError> {
    let mut st = self.state.lock().unwrap();
    if let Some(left) = st.calls_until_outage.as_mut() {
      if *left == 0 {
        return Err(MemoryError {
          kind:    FailureKind::Unavailable,
          message: "connection refused".into(),
        });
      }
      *left -= 1;
    }
    f(&mut st)
  }
}

impl CatalogStore for MemoryStore {
  type Error = MemoryError;

  async fn find_marketplace(&self, name: &str, region: &str) -> Result<Option<Marketplace>, MemoryError> {
    self.with(|st| {
      st.lookups += 1;
      Ok(st.marketplaces.iter().find(|m| m.name == name && m.region == region).cloned())
    })
  }

  async fn insert_marketplace(&self, input: NewMarketplace) -> Result<Marketplace, MemoryError> {
    self.with(|st| {
      if st.marketplaces.iter().any(|m| m.name == input.name && m.region == input.region) {
        return Err(conflict("marketplace exists"));
      }
      let m = Marketplace {
        marketplace_id: Uuid::new_v4(),
        name:           input.name,
        region:         input.region,
        created_at:     Utc::now(),
      };
      st.creates.marketplaces += 1;
      st.marketplaces.push(m.clone());
      Ok(m)
    })
  }

  async fn list_marketplaces(&self) -> Result<Vec<Marketplace>, MemoryError> {
    self.with(|st| Ok(st.marketplaces.clone()))
  }

  async fn find_supplier(&self, name: &str) -> Result<Option<Supplier>, MemoryError> {
    self.with(|st| {
      st.lookups += 1;
      Ok(st.suppliers.iter().find(|s| s.name == name).cloned())
    })
  }

  async fn insert_supplier(&self, input: NewSupplier) -> Result<Supplier, MemoryError> {
    self.with(|st| {
      if st.suppliers.iter().any(|s| s.name == input.name) {
        return Err(conflict("supplier exists"));
      }
      let s = Supplier {
        supplier_id:    Uuid::new_v4(),
        name:           input.name,
        marketplace_id: input.marketplace_id,
        kind:           input.kind,
        created_at:     Utc::now(),
      };
      st.creates.suppliers += 1;
      st.suppliers.push(s.clone());
      Ok(s)
    })
  }

  async fn list_suppliers(&self) -> Result<Vec<Supplier>, MemoryError> {
    self.with(|st| Ok(st.suppliers.clone()))
  }

  async fn find_store(&self, store_name: &str) -> Result<Option<Store>, MemoryError> {
    self.with(|st| {
      st.lookups += 1;
      Ok(st.stores.iter().find(|s| s.store_name == store_name).cloned())
    })
  }

  async fn insert_store(&self, input: NewStore) -> Result<Store, MemoryError> {
    self.with(|st| {
      if st.stores.iter().any(|s| s.store_name == input.store_name) {
        return Err(conflict("store exists"));
      }
      let s = Store {
        store_id:       Uuid::new_v4(),
        store_name:     input.store_name,
        marketplace_id: input.marketplace_id,
        created_at:     Utc::now(),
      };
      st.creates.stores += 1;
      st.stores.push(s.clone());
      Ok(s)
    })
  }

  async fn list_stores(&self) -> Result<Vec<Store>, MemoryError> {
    self.with(|st| Ok(st.stores.clone()))
  }

  async fn find_product(&self, isku: &str) -> Result<Option<CoreProduct>, MemoryError> {
    self.with(|st| {
      st.lookups += 1;
      Ok(st.products.iter().find(|(p, ..)| p.isku == isku).map(|(p, ..)| p.clone()))
    })
  }

  async fn insert_product(&self, input: NewProduct) -> Result<CoreProduct, MemoryError> {
    self.with(|st| {
      let clash = st.products.iter().any(|(p, ..)| {
        p.isku == input.isku || (input.asin.is_some() && p.asin == input.asin)
      });
      if clash {
        return Err(conflict(format!("product {} exists", input.isku)));
      }
      let p = CoreProduct {
        product_id:          Uuid::new_v4(),
        isku:                input.isku,
        asin:                input.asin,
        upc:                 input.upc,
        requires_expiration: input.requires_expiration,
        created_at:          Utc::now(),
      };
      st.creates.products += 1;
      st.products.push((p.clone(), input.base_title, input.media_urls));
      Ok(p)
    })
  }

  async fn list_products(&self) -> Result<Vec<CoreProduct>, MemoryError> {
    self.with(|st| Ok(st.products.iter().map(|(p, ..)| p.clone()).collect()))
  }

  async fn list_product_summaries(&self) -> Result<Vec<ProductSummary>, MemoryError> {
    self.with(|st| {
      Ok(
        st.products
          .iter()
          .map(|(p, title, media)| ProductSummary {
            product:    p.clone(),
            base_title: Some(title.clone()),
            media_url:  media.first().cloned(),
          })
          .collect(),
      )
    })
  }

  async fn find_sources_for_product(&self, product_id: Uuid) -> Result<Vec<Source>, MemoryError> {
    self.with(|st| Ok(st.sources.iter().filter(|s| s.product_id == product_id).cloned().collect()))
  }

  async fn insert_source(&self, input: NewSource) -> Result<Source, MemoryError> {
    self.with(|st| {
      if st
        .sources
        .iter()
        .any(|s| s.product_id == input.product_id && s.supplier_id == input.supplier_id)
      {
        return Err(conflict("source exists"));
      }
      let s = Source {
        source_id:   Uuid::new_v4(),
        product_id:  input.product_id,
        supplier_id: input.supplier_id,
        source_code: input.source_code,
        base_cost:   input.base_cost,
        created_at:  Utc::now(),
      };
      st.creates.sources += 1;
      st.sources.push(s.clone());
      Ok(s)
    })
  }

  async fn list_sources(&self) -> Result<Vec<Source>, MemoryError> {
    self.with(|st| Ok(st.sources.clone()))
  }

  async fn find_listings_for_product(&self, product_id: Uuid) -> Result<Vec<Listing>, MemoryError> {
    self.with(|st| Ok(st.listings.iter().filter(|l| l.product_id == product_id).cloned().collect()))
  }

  async fn insert_listing(&self, input: NewListing) -> Result<Listing, MemoryError> {
    self.with(|st| {
      if st.fail_listing_inserts {
        return Err(conflict("listing rejected"));
      }
      if st
        .listings
        .iter()
        .any(|l| l.product_id == input.product_id && l.store_id == input.store_id)
      {
        return Err(conflict("listing exists"));
      }
      let l = Listing {
        listing_id:      Uuid::new_v4(),
        product_id:      input.product_id,
        store_id:        input.store_id,
        channel_item_id: input.channel_item_id,
        listed_price:    input.listed_price,
        created_at:      Utc::now(),
      };
      st.creates.listings += 1;
      st.listings.push(l.clone());
      Ok(l)
    })
  }

  async fn list_listings(&self) -> Result<Vec<Listing>, MemoryError> {
    self.with(|st| Ok(st.listings.clone()))
  }

  async fn update_listing_price(&self, listing_id: Uuid, price: Decimal) -> Result<(), MemoryError> {
    self.with(|st| {
      let listing = st
        .listings
        .iter_mut()
        .find(|l| l.listing_id == listing_id)
        .ok_or_else(|| MemoryError { kind: FailureKind::Other, message: "no such listing".into() })?;
      listing.listed_price = price;
      Ok(())
    })
  }

  async fn upsert_pricing_rule(&self, rule: PricingRule) -> Result<(), MemoryError> {
    self.with(|st| {
      st.rules.retain(|r| r.marketplace != rule.marketplace);
      st.rules.push(rule);
      Ok(())
    })
  }

  async fn find_pricing_rule(&self, marketplace: &str) -> Result<Option<PricingRule>, MemoryError> {
    self.with(|st| Ok(st.rules.iter().find(|r| r.marketplace == marketplace).cloned()))
  }
}
