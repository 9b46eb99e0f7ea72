//! Per-marketplace pricing rules and listing re-pricing.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::CatalogStore;

/// A linear pricing rule keyed by marketplace name. Rates are percentages of
/// the cost; `fixed_fee` is an absolute amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
  pub marketplace:     String,
  pub commission_rate: Decimal,
  pub fixed_fee:       Decimal,
  pub tax_rate:        Decimal,
  pub profit_margin:   Decimal,
}

impl PricingRule {
  /// `cost` plus commission, fixed fee, tax and margin, rounded to cents.
  pub fn final_price(&self, cost: Decimal) -> Decimal {
    let pct = |rate: Decimal| cost * rate / Decimal::ONE_HUNDRED;

    let price = cost
      + pct(self.commission_rate)
      + self.fixed_fee
      + pct(self.tax_rate)
      + pct(self.profit_margin);

    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
  }
}

/// Outcome of [`reprice_listings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepriceReport {
  pub repriced: usize,
  /// Listings whose product has no source or whose marketplace has no rule.
  pub skipped:  usize,
}

/// Recompute every listing's price from its product's first source cost and
/// the rule for the listing store's marketplace.
pub async fn reprice_listings<S: CatalogStore>(
  store: &S,
) -> Result<RepriceReport, S::Error> {
  let marketplaces: HashMap<Uuid, String> = store
    .list_marketplaces()
    .await?
    .into_iter()
    .map(|m| (m.marketplace_id, m.name))
    .collect();

  let store_marketplace: HashMap<Uuid, Uuid> = store
    .list_stores()
    .await?
    .into_iter()
    .map(|s| (s.store_id, s.marketplace_id))
    .collect();

  // Sources come back in creation order; keep the first per product.
  let mut first_cost: HashMap<Uuid, Decimal> = HashMap::new();
  for source in store.list_sources().await? {
    first_cost.entry(source.product_id).or_insert(source.base_cost);
  }

  let mut rules: HashMap<String, Option<PricingRule>> = HashMap::new();
  let mut report = RepriceReport::default();

  for listing in store.list_listings().await? {
    let marketplace = store_marketplace
      .get(&listing.store_id)
      .and_then(|id| marketplaces.get(id));
    let (Some(marketplace), Some(cost)) =
      (marketplace, first_cost.get(&listing.product_id))
    else {
      report.skipped += 1;
      continue;
    };

    if !rules.contains_key(marketplace) {
      let rule = store.find_pricing_rule(marketplace).await?;
      rules.insert(marketplace.clone(), rule);
    }
    let Some(Some(rule)) = rules.get(marketplace) else {
      report.skipped += 1;
      continue;
    };

    let price = rule.final_price(*cost);
    store.update_listing_price(listing.listing_id, price).await?;
    tracing::debug!(listing = %listing.listing_id, %price, "repriced listing");
    report.repriced += 1;
  }

  tracing::info!(
    repriced = report.repriced,
    skipped = report.skipped,
    "re-pricing finished"
  );
  Ok(report)
}
