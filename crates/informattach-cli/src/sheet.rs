//! CSV in and out.

use std::{fs::File, io, path::Path};

use anyhow::Context as _;
use informattach_core::{
  catalog::ProductSummary,
  export::EbayRow,
  import::ImportReport,
  normalize::RawRecord,
};

/// Read a header-keyed spreadsheet. Short rows are allowed; their missing
/// cells simply do not appear in the record.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
  let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
  read_records_from(file).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn read_records_from(reader: impl io::Read) -> anyhow::Result<Vec<RawRecord>> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers = reader.headers().context("missing header row")?.clone();

  reader
    .records()
    .enumerate()
    .map(|(i, record)| -> anyhow::Result<RawRecord> {
      let record = record.with_context(|| format!("malformed row {}", i + 1))?;
      Ok(headers.iter().zip(record.iter()).collect())
    })
    .collect()
}

pub fn write_ebay_csv(rows: &[EbayRow], writer: impl io::Write) -> anyhow::Result<()> {
  let mut wtr = csv::Writer::from_writer(writer);
  for row in rows {
    wtr.serialize(row)?;
  }
  wtr.flush()?;
  Ok(())
}

pub fn print_import_report(report: &ImportReport, json: bool) -> anyhow::Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(report)?);
    return Ok(());
  }

  println!("Imported {} rows, {} errors", report.success, report.errors);
  for failure in &report.failures {
    println!("  row {}: {}", failure.row_index, failure.message);
  }
  Ok(())
}

pub fn print_products(products: &[ProductSummary]) {
  if products.is_empty() {
    println!("No products yet. Add one with `informattach add-product`.");
    return;
  }

  println!(
    "{:<20} {:<40} {:<12} {:<14} {:<6} {}",
    "ISKU", "TITLE", "ASIN", "UPC", "EXP", "ID"
  );
  for p in products {
    let title: String = p
      .base_title
      .as_deref()
      .unwrap_or("untitled")
      .chars()
      .take(40)
      .collect();
    println!(
      "{:<20} {:<40} {:<12} {:<14} {:<6} {}",
      p.product.isku,
      title,
      p.product.asin.as_deref().unwrap_or("-"),
      p.product.upc.as_deref().unwrap_or("-"),
      if p.product.requires_expiration { "yes" } else { "no" },
      p.product.product_id,
    );
  }
}
