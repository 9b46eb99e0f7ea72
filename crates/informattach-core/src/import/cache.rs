//! The per-run import context: store handle plus warm lookup caches.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::store::CatalogStore;

/// Natural-key → id maps for the four resolved entities, and presence sets
/// for the two junction tables.
#[derive(Debug, Default, Clone)]
pub struct ImportCache {
  /// `"{name}_{region}"` → marketplace id.
  pub(crate) marketplaces: HashMap<String, Uuid>,
  /// Raw source-market string → supplier id.
  pub(crate) suppliers:    HashMap<String, Uuid>,
  /// Raw target-market string → store id.
  pub(crate) stores:       HashMap<String, Uuid>,
  /// isku → product id.
  pub(crate) products:     HashMap<String, Uuid>,
  /// `"{product_id}_{supplier_id}"`.
  pub(crate) sources:      HashSet<String>,
  /// `"{product_id}_{store_id}"`.
  pub(crate) listings:     HashSet<String>,
}

impl ImportCache {
  pub fn marketplace_count(&self) -> usize { self.marketplaces.len() }

  pub fn product_count(&self) -> usize { self.products.len() }

  pub fn junction_count(&self) -> usize { self.sources.len() + self.listings.len() }
}

pub(crate) fn marketplace_key(name: &str, region: &str) -> String {
  format!("{name}_{region}")
}

pub(crate) fn junction_key(product_id: Uuid, other_id: Uuid) -> String {
  format!("{product_id}_{other_id}")
}

/// State threaded through the resolver and junction upserter for one run.
///
/// Constructed once per import by [`ImportContext::preload`]; nothing is
/// shared between runs.
pub struct ImportContext<'s, S: CatalogStore> {
  pub(crate) store: &'s S,
  pub(crate) cache: ImportCache,
}

impl<'s, S: CatalogStore> ImportContext<'s, S> {
  /// A context with empty caches. Every lookup goes to the store until the
  /// caches fill up.
  pub fn cold(store: &'s S) -> Self { Self { store, cache: ImportCache::default() } }

  /// Bulk-read every table once and build the caches from the result.
  pub async fn preload(store: &'s S) -> Result<Self, S::Error> {
    let mut cache = ImportCache::default();

    for m in store.list_marketplaces().await? {
      cache
        .marketplaces
        .insert(marketplace_key(&m.name, &m.region), m.marketplace_id);
    }
    for s in store.list_suppliers().await? {
      cache.suppliers.insert(s.name, s.supplier_id);
    }
    for s in store.list_stores().await? {
      cache.stores.insert(s.store_name, s.store_id);
    }
    for p in store.list_products().await? {
      cache.products.insert(p.isku, p.product_id);
    }
    for s in store.list_sources().await? {
      cache.sources.insert(junction_key(s.product_id, s.supplier_id));
    }
    for l in store.list_listings().await? {
      cache.listings.insert(junction_key(l.product_id, l.store_id));
    }

    tracing::debug!(
      marketplaces = cache.marketplaces.len(),
      suppliers = cache.suppliers.len(),
      stores = cache.stores.len(),
      products = cache.products.len(),
      sources = cache.sources.len(),
      listings = cache.listings.len(),
      "import caches preloaded"
    );

    Ok(Self { store, cache })
  }

  pub fn cache(&self) -> &ImportCache { &self.cache }
}
