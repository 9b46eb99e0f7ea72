//! Get-or-create of the four entities a row references.
//!
//! Each resolver consults the cache first. A miss costs one create call and
//! populates the cache, so later sightings within the run never reach the
//! store. If the create of a supplier or store conflicts because another
//! writer got there first, the existing row is looked up instead.

use uuid::Uuid;

use super::cache::{ImportContext, marketplace_key};
use crate::{
  catalog::{NewMarketplace, NewProduct, NewStore, NewSupplier, SupplierKind},
  store::{CatalogStore, ClassifyFailure, FailureKind},
};

impl<S: CatalogStore> ImportContext<'_, S> {
  /// Marketplaces are looked up in the store before creating, since the
  /// same `(name, region)` may have been created outside the importer.
  pub async fn resolve_marketplace(
    &mut self,
    name: &str,
    region: &str,
  ) -> Result<Uuid, S::Error> {
    let key = marketplace_key(name, region);
    if let Some(id) = self.cache.marketplaces.get(&key) {
      return Ok(*id);
    }

    let id = match self.store.find_marketplace(name, region).await? {
      Some(existing) => existing.marketplace_id,
      None => {
        let created = self
          .store
          .insert_marketplace(NewMarketplace {
            name:   name.to_owned(),
            region: region.to_owned(),
          })
          .await?;
        tracing::debug!(%name, %region, "created marketplace");
        created.marketplace_id
      }
    };

    self.cache.marketplaces.insert(key, id);
    Ok(id)
  }

  /// Resolve the supplier named by the full source-market string.
  pub async fn resolve_supplier(
    &mut self,
    raw_market: &str,
    marketplace_id: Uuid,
  ) -> Result<Uuid, S::Error> {
    if let Some(id) = self.cache.suppliers.get(raw_market) {
      return Ok(*id);
    }

    let inserted = self
      .store
      .insert_supplier(NewSupplier {
        name: raw_market.to_owned(),
        marketplace_id,
        kind: SupplierKind::Marketplace,
      })
      .await;

    let id = match inserted {
      Ok(created) => {
        tracing::debug!(supplier = %raw_market, "created supplier");
        created.supplier_id
      }
      Err(e) if e.failure_kind() == FailureKind::Conflict => {
        match self.store.find_supplier(raw_market).await? {
          Some(existing) => existing.supplier_id,
          None => return Err(e),
        }
      }
      Err(e) => return Err(e),
    };

    self.cache.suppliers.insert(raw_market.to_owned(), id);
    Ok(id)
  }

  /// Resolve the store named by the full target-market string.
  pub async fn resolve_store(
    &mut self,
    raw_market: &str,
    marketplace_id: Uuid,
  ) -> Result<Uuid, S::Error> {
    if let Some(id) = self.cache.stores.get(raw_market) {
      return Ok(*id);
    }

    let inserted = self
      .store
      .insert_store(NewStore {
        store_name: raw_market.to_owned(),
        marketplace_id,
      })
      .await;

    let id = match inserted {
      Ok(created) => {
        tracing::debug!(store = %raw_market, "created store");
        created.store_id
      }
      Err(e) if e.failure_kind() == FailureKind::Conflict => {
        match self.store.find_store(raw_market).await? {
          Some(existing) => existing.store_id,
          None => return Err(e),
        }
      }
      Err(e) => return Err(e),
    };

    self.cache.stores.insert(raw_market.to_owned(), id);
    Ok(id)
  }

  /// Resolve a core product by isku, creating it with its title and media on
  /// first sighting. A cache hit leaves title and media untouched.
  pub async fn resolve_product(
    &mut self,
    isku: &str,
    source_id: &str,
    title: &str,
    media_url: &str,
  ) -> Result<Uuid, S::Error> {
    if let Some(id) = self.cache.products.get(isku) {
      return Ok(*id);
    }

    let input = NewProduct {
      isku:                isku.to_owned(),
      asin:                (!source_id.is_empty()).then(|| source_id.to_owned()),
      upc:                 None,
      requires_expiration: false,
      base_title:          title.to_owned(),
      media_urls:          if media_url.is_empty() {
        Vec::new()
      } else {
        vec![media_url.to_owned()]
      },
    };

    let created = self.store.insert_product(input).await?;
    tracing::debug!(%isku, "created core product");

    self.cache.products.insert(isku.to_owned(), created.product_id);
    Ok(created.product_id)
  }
}
