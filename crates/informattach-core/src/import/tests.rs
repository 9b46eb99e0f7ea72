//! Engine tests against the in-memory store.

use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;

use super::*;
use crate::{
  catalog::{NewMarketplace, NewStore, NewSupplier, SupplierKind},
  normalize::columns,
  testing::{CreateCounts, MemoryStore},
};

fn widget_row() -> RawRecord {
  [
    (columns::TITLE, "Widget"),
    (columns::SOURCE_PRODUCT_ID, "B001"),
    (columns::TARGET_VARIANT, ""),
    (columns::SOURCE_MARKET, "Amazon US"),
    (columns::TARGET_MARKET, "eBay US"),
    (columns::SOURCE_PRICE, "$10.00"),
    (columns::TARGET_PRICE, "$25.99"),
  ]
  .into_iter()
  .collect()
}

fn row(isku: &str, source: &str, target: &str, cost: &str) -> RawRecord {
  [
    (columns::TITLE, format!("Item {isku}")),
    (columns::SOURCE_PRODUCT_ID, format!("SRC-{isku}")),
    (columns::TARGET_VARIANT, isku.to_owned()),
    (columns::SOURCE_MARKET, source.to_owned()),
    (columns::TARGET_MARKET, target.to_owned()),
    (columns::SOURCE_PRICE, cost.to_owned()),
    (columns::TARGET_PRICE, "$30".to_owned()),
  ]
  .into_iter()
  .collect()
}

// ─── Scenario ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn widget_row_on_empty_backend() {
  let store = MemoryStore::default();

  let report = Importer::new(&store).import(&[widget_row()]).await.unwrap();
  assert_eq!(report.success, 1);
  assert_eq!(report.errors, 0);
  assert!(report.failures.is_empty());

  assert_eq!(
    store.creates(),
    CreateCounts {
      marketplaces: 2,
      suppliers:    1,
      stores:       1,
      products:     1,
      sources:      1,
      listings:     1,
    }
  );

  let suppliers = store.list_suppliers().await.unwrap();
  assert_eq!(suppliers[0].name, "Amazon US");
  let stores = store.list_stores().await.unwrap();
  assert_eq!(stores[0].store_name, "eBay US");

  let product = store.find_product("INF-B001").await.unwrap().unwrap();
  assert_eq!(product.asin.as_deref(), Some("B001"));

  let sources = store.find_sources_for_product(product.product_id).await.unwrap();
  assert_eq!(sources.len(), 1);
  assert_eq!(sources[0].base_cost, dec!(10.00));
  assert_eq!(sources[0].supplier_id, suppliers[0].supplier_id);

  let listings = store.find_listings_for_product(product.product_id).await.unwrap();
  assert_eq!(listings.len(), 1);
  assert_eq!(listings[0].listed_price, dec!(25.99));
  assert_eq!(listings[0].store_id, stores[0].store_id);
}

// ─── Idempotence & completeness ──────────────────────────────────────────────

#[tokio::test]
async fn second_run_creates_nothing() {
  let store = MemoryStore::default();
  let rows = vec![
    widget_row(),
    row("A-1", "Amazon US", "eBay US", "$5"),
    row("A-2", "Walmart US", "eBay UK", "$6"),
    row("A-1", "Walmart US", "Etsy", "$7"),
  ];

  let first = Importer::new(&store).import(&rows).await.unwrap();
  assert_eq!(first.success, 4);
  let after_first = store.row_counts();

  store.reset_counters();
  let second = Importer::new(&store).import(&rows).await.unwrap();
  assert_eq!(second.success, 4);
  assert_eq!(store.row_counts(), after_first);
  assert_eq!(store.creates(), CreateCounts::default());
  // Everything was served from the preloaded caches.
  assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn every_row_is_counted_once() {
  let store = MemoryStore::default();
  let mut blank_market = widget_row();
  blank_market.insert(columns::TARGET_MARKET, "  ");

  let rows = vec![
    widget_row(),
    blank_market,
    row("A-1", "Amazon US", "eBay US", "$5"),
    RawRecord::default(),
  ];

  let report = Importer::new(&store).import(&rows).await.unwrap();
  assert_eq!(report.success + report.errors, rows.len());
  assert_eq!(report.success, 2);
  assert_eq!(report.errors, 2);

  let failed: Vec<_> = report.failures.iter().map(|f| f.row_index).collect();
  assert_eq!(failed, vec![1, 3]);
  assert!(report.failures.iter().all(|f| f.reason == FailureReason::Data));
  assert!(report.failures[0].message.contains("Target Market"));
}

// ─── Junction uniqueness ─────────────────────────────────────────────────────

#[tokio::test]
async fn same_isku_same_supplier_makes_one_source() {
  let store = MemoryStore::default();
  let rows = vec![
    row("A-1", "Amazon US", "eBay US", "$5"),
    row("A-1", "Amazon US", "Etsy US", "$9"),
  ];

  let report = Importer::new(&store).import(&rows).await.unwrap();
  assert_eq!(report.success, 2);

  let product = store.find_product("A-1").await.unwrap().unwrap();
  let sources = store.find_sources_for_product(product.product_id).await.unwrap();
  assert_eq!(sources.len(), 1);
  // The first sighting's cost wins; re-sightings never update it.
  assert_eq!(sources[0].base_cost, dec!(5));

  let listings = store.find_listings_for_product(product.product_id).await.unwrap();
  assert_eq!(listings.len(), 2);
  assert_ne!(listings[0].store_id, listings[1].store_id);
}

#[tokio::test]
async fn reimport_does_not_refresh_cost() {
  let store = MemoryStore::default();
  Importer::new(&store)
    .import(&[row("A-1", "Amazon US", "eBay US", "$5")])
    .await
    .unwrap();
  Importer::new(&store)
    .import(&[row("A-1", "Amazon US", "eBay US", "$8")])
    .await
    .unwrap();

  assert_eq!(store.source_costs(), vec![dec!(5)]);
}

#[tokio::test]
async fn product_content_written_only_on_creation() {
  let store = MemoryStore::default();
  let mut renamed = row("A-1", "Amazon US", "eBay US", "$5");
  renamed.insert(columns::TITLE, "Renamed");

  Importer::new(&store)
    .import(&[row("A-1", "Amazon US", "eBay US", "$5"), renamed])
    .await
    .unwrap();

  assert_eq!(store.product_title("A-1").as_deref(), Some("Item A-1"));
  assert_eq!(store.creates().products, 1);
}

// ─── Caching ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preloaded_marketplace_is_not_recreated() {
  let store = MemoryStore::default();
  store
    .insert_marketplace(NewMarketplace { name: "Amazon".into(), region: "US".into() })
    .await
    .unwrap();
  store.reset_counters();

  let mut ctx = ImportContext::preload(&store).await.unwrap();
  assert_eq!(ctx.cache().marketplace_count(), 1);

  ctx.resolve_marketplace("Amazon", "US").await.unwrap();
  assert_eq!(store.creates().marketplaces, 0);
  assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn cold_cache_looks_up_existing_marketplace_once() {
  let store = MemoryStore::default();
  let existing = store
    .insert_marketplace(NewMarketplace { name: "Amazon".into(), region: "US".into() })
    .await
    .unwrap();
  store.reset_counters();

  let mut ctx = ImportContext::cold(&store);
  let a = ctx.resolve_marketplace("Amazon", "US").await.unwrap();
  let b = ctx.resolve_marketplace("Amazon", "US").await.unwrap();

  assert_eq!(a, existing.marketplace_id);
  assert_eq!(a, b);
  assert_eq!(store.lookups(), 1);
  assert_eq!(store.creates().marketplaces, 0);
}

#[tokio::test]
async fn preload_caches_every_table() {
  let store = MemoryStore::default();
  Importer::new(&store)
    .import(&[
      row("A-1", "Amazon US", "eBay US", "$5"),
      row("A-2", "Amazon US", "Etsy US", "$5"),
    ])
    .await
    .unwrap();

  let ctx = ImportContext::preload(&store).await.unwrap();
  let cache = ctx.cache();
  assert_eq!(cache.marketplace_count(), 3);
  assert_eq!(cache.product_count(), 2);
  // Two sources and two listings.
  assert_eq!(cache.junction_count(), 4);
}

#[tokio::test]
async fn supplier_and_store_created_by_another_writer_are_reused() {
  let store = MemoryStore::default();
  let mut ctx = ImportContext::cold(&store);
  let marketplace = ctx.resolve_marketplace("Amazon", "US").await.unwrap();

  // Rows written after this run's caches were built.
  let supplier = store
    .insert_supplier(NewSupplier {
      name:           "Amazon US".into(),
      marketplace_id: marketplace,
      kind:           SupplierKind::Marketplace,
    })
    .await
    .unwrap();
  let shop = store
    .insert_store(NewStore { store_name: "Amazon US".into(), marketplace_id: marketplace })
    .await
    .unwrap();
  store.reset_counters();

  let supplier_id = ctx.resolve_supplier("Amazon US", marketplace).await.unwrap();
  let store_id = ctx.resolve_store("Amazon US", marketplace).await.unwrap();
  assert_eq!(supplier_id, supplier.supplier_id);
  assert_eq!(store_id, shop.store_id);
  assert_eq!(store.creates(), CreateCounts::default());
  assert_eq!(store.lookups(), 2);

  // The conflict is paid once; later rows hit the cache.
  ctx.resolve_supplier("Amazon US", marketplace).await.unwrap();
  ctx.resolve_store("Amazon US", marketplace).await.unwrap();
  assert_eq!(store.lookups(), 2);
}

#[tokio::test]
async fn repeated_keys_create_once_within_a_run() {
  let store = MemoryStore::default();
  let rows: Vec<_> = (0..25)
    .map(|i| row(&format!("A-{}", i % 5), "Amazon US", "eBay US", "$5"))
    .collect();

  let report = Importer::new(&store).import(&rows).await.unwrap();
  assert_eq!(report.success, 25);

  let creates = store.creates();
  // Amazon/US and eBay/US.
  assert_eq!(creates.marketplaces, 2);
  assert_eq!(creates.suppliers, 1);
  assert_eq!(creates.stores, 1);
  assert_eq!(creates.products, 5);
  assert_eq!(creates.sources, 5);
  assert_eq!(creates.listings, 5);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn conflicts_are_counted_per_row() {
  let store = MemoryStore::default();
  store.reject_listings();

  let rows = vec![
    row("A-1", "Amazon US", "eBay US", "$5"),
    row("A-2", "Amazon US", "eBay US", "$5"),
  ];
  let report = Importer::new(&store).import(&rows).await.unwrap();

  assert_eq!(report.success, 0);
  assert_eq!(report.errors, 2);
  assert!(report.failures.iter().all(|f| f.reason == FailureReason::Backend));
  // Entities created before the failing write stay in place.
  assert_eq!(store.creates().products, 2);
}

#[tokio::test]
async fn duplicate_asin_is_a_row_error() {
  let store = MemoryStore::default();
  let mut a = widget_row();
  a.insert(columns::TARGET_VARIANT, "V-1");
  let mut b = widget_row();
  b.insert(columns::TARGET_VARIANT, "V-2");

  let report = Importer::new(&store).import(&[a, b]).await.unwrap();
  assert_eq!(report.success, 1);
  assert_eq!(report.errors, 1);
  assert_eq!(report.failures[0].row_index, 1);
}

#[tokio::test]
async fn outage_aborts_the_batch() {
  let store = MemoryStore::default();
  // Six preload reads plus the full first row (2 finds + 7 inserts).
  store.go_down_after(6 + 9);

  let rows = vec![
    row("A-1", "Amazon US", "eBay US", "$5"),
    row("A-2", "Amazon US", "eBay US", "$5"),
    row("A-3", "Amazon US", "eBay US", "$5"),
  ];
  let err = Importer::new(&store).import(&rows).await.unwrap_err();

  match err {
    ImportError::Backend { row_index, report, .. } => {
      assert_eq!(row_index, 1);
      assert_eq!(report.success, 1);
      assert_eq!(report.errors, 0);
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn outage_keeps_earlier_row_failures() {
  let store = MemoryStore::default();
  let blank_market = row("A-0", "Amazon US", "", "$5");
  // Row 0 never reaches the store; row 1 uses the full allowance.
  store.go_down_after(6 + 9);

  let rows = vec![
    blank_market,
    row("A-1", "Amazon US", "eBay US", "$5"),
    row("A-2", "Amazon US", "eBay US", "$5"),
  ];
  let err = Importer::new(&store).import(&rows).await.unwrap_err();

  match err {
    ImportError::Backend { row_index, report, .. } => {
      assert_eq!(row_index, 2);
      assert_eq!(report.success, 1);
      assert_eq!(report.errors, 1);
      assert_eq!(report.failures.len(), 1);
      assert_eq!(report.failures[0].row_index, 0);
      assert_eq!(report.failures[0].reason, FailureReason::Data);
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn preload_failure_is_fatal() {
  let store = MemoryStore::default();
  store.go_down_after(0);

  let err = Importer::new(&store)
    .import(&[widget_row()])
    .await
    .unwrap_err();
  assert!(matches!(err, ImportError::Preload(_)));
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_reported_at_cadence_and_end() {
  let store = MemoryStore::default();
  let rows: Vec<_> = (0..25)
    .map(|i| row(&format!("A-{i}"), "Amazon US", "eBay US", "$5"))
    .collect();

  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);

  Importer::new(&store)
    .progress_every(10)
    .on_progress(move |p| sink.lock().unwrap().push((p.current, p.total)))
    .import(&rows)
    .await
    .unwrap();

  assert_eq!(*seen.lock().unwrap(), vec![(10, 25), (20, 25), (25, 25)]);
}
