//! Rows for the eBay File Exchange bulk upload format.
//!
//! Only the row shape lives here; writing the CSV is up to the caller.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{catalog::ProductSummary, store::CatalogStore};

/// Marketplace name whose stores feed the export, compared ignoring case.
pub const EBAY_MARKETPLACE: &str = "eBay";
pub const MAX_EBAY_TITLE_CHARS: usize = 80;
/// Quantity advertised for a product that has at least one supplier source.
pub const SOURCED_QUANTITY: u32 = 2;
/// eBay condition id for "New".
pub const CONDITION_NEW: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EbayRow {
  #[serde(rename = "*Action(SiteID=US|Country=US|Currency=USD|Version=1193)")]
  pub action:       &'static str,
  #[serde(rename = "CustomLabel")]
  pub custom_label: String,
  #[serde(rename = "*Title")]
  pub title:        String,
  #[serde(rename = "*Quantity")]
  pub quantity:     u32,
  #[serde(rename = "*Format")]
  pub format:       &'static str,
  #[serde(rename = "*StartPrice")]
  pub start_price:  Decimal,
  #[serde(rename = "*ConditionID")]
  pub condition_id: u32,
  #[serde(rename = "PicURL")]
  pub pic_url:      String,
  #[serde(rename = "*Category")]
  pub category:     &'static str,
}

impl EbayRow {
  fn new(summary: &ProductSummary, price: Decimal, sourced: bool) -> Self {
    let title = summary.base_title.as_deref().unwrap_or_default();
    Self {
      action:       "Add",
      custom_label: summary.product.isku.clone(),
      title:        title.chars().take(MAX_EBAY_TITLE_CHARS).collect(),
      quantity:     if sourced { SOURCED_QUANTITY } else { 0 },
      format:       "FixedPrice",
      start_price:  price,
      condition_id: CONDITION_NEW,
      pic_url:      summary.media_url.clone().unwrap_or_default(),
      category:     "1",
    }
  }
}

/// One row per product with a priced listing in an eBay store. When a
/// product is listed in several eBay stores, the earliest listing wins.
pub async fn ebay_rows<S: CatalogStore>(store: &S) -> Result<Vec<EbayRow>, S::Error> {
  let ebay_marketplaces: HashSet<Uuid> = store
    .list_marketplaces()
    .await?
    .into_iter()
    .filter(|m| m.name.eq_ignore_ascii_case(EBAY_MARKETPLACE))
    .map(|m| m.marketplace_id)
    .collect();

  let ebay_stores: HashSet<Uuid> = store
    .list_stores()
    .await?
    .into_iter()
    .filter(|s| ebay_marketplaces.contains(&s.marketplace_id))
    .map(|s| s.store_id)
    .collect();

  let products: HashMap<Uuid, ProductSummary> = store
    .list_product_summaries()
    .await?
    .into_iter()
    .map(|p| (p.product.product_id, p))
    .collect();

  let sourced: HashSet<Uuid> = store
    .list_sources()
    .await?
    .into_iter()
    .map(|s| s.product_id)
    .collect();

  let mut exported = HashSet::new();
  let rows = store
    .list_listings()
    .await?
    .into_iter()
    .filter(|l| ebay_stores.contains(&l.store_id) && !l.listed_price.is_zero())
    .filter(|l| exported.insert(l.product_id))
    .filter_map(|l| {
      let summary = products.get(&l.product_id)?;
      Some(EbayRow::new(
        summary,
        l.listed_price,
        sourced.contains(&l.product_id),
      ))
    })
    .collect();

  Ok(rows)
}
