//! Create-once upserts for the source and listing junction rows.
//!
//! An existing `(product, supplier)` or `(product, store)` pair is left as
//! is: cost and price are never refreshed by a re-import.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::cache::{ImportContext, junction_key};
use crate::{
  catalog::{NewListing, NewSource},
  store::CatalogStore,
};

impl<S: CatalogStore> ImportContext<'_, S> {
  /// Returns `true` if a source row was written.
  pub async fn ensure_source(
    &mut self,
    product_id: Uuid,
    supplier_id: Uuid,
    source_code: &str,
    base_cost: Decimal,
  ) -> Result<bool, S::Error> {
    let key = junction_key(product_id, supplier_id);
    if self.cache.sources.contains(&key) {
      return Ok(false);
    }

    self
      .store
      .insert_source(NewSource {
        product_id,
        supplier_id,
        source_code: source_code.to_owned(),
        base_cost,
      })
      .await?;

    self.cache.sources.insert(key);
    Ok(true)
  }

  /// Returns `true` if a listing row was written.
  pub async fn ensure_listing(
    &mut self,
    product_id: Uuid,
    store_id: Uuid,
    channel_item_id: &str,
    listed_price: Decimal,
  ) -> Result<bool, S::Error> {
    let key = junction_key(product_id, store_id);
    if self.cache.listings.contains(&key) {
      return Ok(false);
    }

    self
      .store
      .insert_listing(NewListing {
        product_id,
        store_id,
        channel_item_id: channel_item_id.to_owned(),
        listed_price,
      })
      .await?;

    self.cache.listings.insert(key);
    Ok(true)
  }
}
