//! Per-row field extraction for the bulk import.
//!
//! Turns one spreadsheet row into a [`NormalizedRow`]. Everything here is a
//! pure function of the row and its index.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{Error, Result};

/// Column headers the importer reads. Missing columns read as blank.
pub mod columns {
  pub const TITLE: &str = "Title";
  pub const SOURCE_PRODUCT_ID: &str = "Source Product Id";
  pub const TARGET_VARIANT: &str = "Target Variant";
  pub const SOURCE_MARKET: &str = "Source Market";
  pub const TARGET_MARKET: &str = "Target Market";
  pub const SOURCE_PRICE: &str = "Source Price";
  pub const TARGET_PRICE: &str = "Target Price";
  pub const TARGET_PRODUCT_ID: &str = "Target Product Id";
  pub const TARGET_PICTURE: &str = "Target Picture";
}

pub const MAX_TITLE_CHARS: usize = 200;
pub const DEFAULT_REGION: &str = "US";

// ─── Raw input ───────────────────────────────────────────────────────────────

/// One spreadsheet row: column header → cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord(HashMap<String, String>);

impl RawRecord {
  /// The trimmed cell for `column`, or `""` if the column is absent.
  pub fn get(&self, column: &str) -> &str {
    self.0.get(column).map(|v| v.trim()).unwrap_or("")
  }

  pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
    self.0.insert(column.into(), value.into());
  }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

// ─── Normalized output ───────────────────────────────────────────────────────

/// A market string split into marketplace name and region.
///
/// `"Amazon US"` → name `Amazon`, region `US`. Only the first and last
/// whitespace tokens are used, so multi-word names are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRef {
  /// The trimmed original string; keys the supplier/store.
  pub raw:    String,
  pub name:   String,
  pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
  pub title:          String,
  pub source_id:      String,
  pub isku:           String,
  pub source_market:  MarketRef,
  pub target_market:  MarketRef,
  pub source_price:   Decimal,
  pub target_price:   Decimal,
  pub target_item_id: String,
  pub media_url:      String,
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Normalize the row at `row_index` (zero-based).
///
/// Fails only when a market cell is blank; every other field has a default.
pub fn normalize(record: &RawRecord, row_index: usize) -> Result<NormalizedRow> {
  let source_id = record.get(columns::SOURCE_PRODUCT_ID).to_owned();
  let isku = derive_isku(record.get(columns::TARGET_VARIANT), &source_id, row_index);

  let source_market =
    parse_market(record.get(columns::SOURCE_MARKET), columns::SOURCE_MARKET)?;
  let target_market =
    parse_market(record.get(columns::TARGET_MARKET), columns::TARGET_MARKET)?;

  Ok(NormalizedRow {
    title: truncate_chars(record.get(columns::TITLE), MAX_TITLE_CHARS),
    source_id,
    isku,
    source_market,
    target_market,
    source_price: parse_price(record.get(columns::SOURCE_PRICE)),
    target_price: parse_price(record.get(columns::TARGET_PRICE)),
    target_item_id: record.get(columns::TARGET_PRODUCT_ID).to_owned(),
    media_url: record.get(columns::TARGET_PICTURE).to_owned(),
  })
}

/// The variant code if present, else `INF-<source id>`, else
/// `INF-UNK-<row index>`.
///
/// The last fallback depends on the row's position, so reordering a file
/// changes the isku of rows that carry no identifiers at all.
pub fn derive_isku(variant: &str, source_id: &str, row_index: usize) -> String {
  if !variant.is_empty() {
    variant.to_owned()
  } else if !source_id.is_empty() {
    format!("INF-{source_id}")
  } else {
    format!("INF-UNK-{row_index}")
  }
}

/// Parse a price cell such as `"$1,234.50"`.
///
/// Currency symbols, separators and whitespace are dropped. Anything that
/// still fails to parse, and any negative amount, yields zero.
pub fn parse_price(raw: &str) -> Decimal {
  let cleaned: String = raw
    .chars()
    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
    .collect();

  cleaned
    .parse::<Decimal>()
    .map(|d| d.max(Decimal::ZERO))
    .unwrap_or(Decimal::ZERO)
}

/// Split a market string into name (first token) and region (last token,
/// [`DEFAULT_REGION`] when there is only one).
pub fn parse_market(raw: &str, column: &'static str) -> Result<MarketRef> {
  let raw = raw.trim();
  let mut tokens = raw.split_whitespace();
  let name = tokens.next().ok_or(Error::EmptyMarket { column })?;
  let region = tokens.last().unwrap_or(DEFAULT_REGION);

  Ok(MarketRef {
    raw:    raw.to_owned(),
    name:   name.to_owned(),
    region: region.to_owned(),
  })
}

fn truncate_chars(s: &str, max: usize) -> String { s.chars().take(max).collect() }
