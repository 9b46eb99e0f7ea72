//! `informattach` — catalog maintenance from the command line.
//!
//! # Usage
//!
//! ```
//! informattach import supplier-sheet.csv
//! informattach set-rule --marketplace eBay --commission 13 --fixed-fee 0.30 --margin 20
//! informattach reprice
//! informattach export-ebay --out ebay.csv
//! ```

mod settings;
mod sheet;

use std::{io, path::PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use informattach_core::{
  catalog::NewProduct,
  export::ebay_rows,
  import::{ImportError, Importer},
  pricing::{PricingRule, reprice_listings},
  store::CatalogStore,
};
use informattach_store_sqlite::SqliteStore;
use rust_decimal::Decimal;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "informattach", version, about = "Informattach product catalog tools")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "informattach.toml")]
  config: PathBuf,

  /// SQLite database path; overrides `database_path` from the config.
  #[arg(long)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Reconcile a supplier/channel CSV into the catalog.
  Import {
    file: PathBuf,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
  },

  /// Add a single core product by hand.
  AddProduct {
    #[arg(long)]
    isku:                String,
    #[arg(long)]
    title:               String,
    #[arg(long)]
    asin:                Option<String>,
    #[arg(long)]
    upc:                 Option<String>,
    /// The product needs expiration-date tracking.
    #[arg(long)]
    requires_expiration: bool,
  },

  /// List the product portfolio.
  Products {
    #[arg(long)]
    json: bool,
  },

  /// Create or replace the pricing rule for a marketplace.
  SetRule {
    /// Marketplace name, e.g. `eBay`.
    #[arg(long)]
    marketplace: String,
    /// Commission, percent of cost.
    #[arg(long)]
    commission:  Decimal,
    #[arg(long, default_value = "0")]
    fixed_fee:   Decimal,
    /// Tax, percent of cost.
    #[arg(long, default_value = "0")]
    tax:         Decimal,
    /// Profit margin, percent of cost.
    #[arg(long)]
    margin:      Decimal,
  },

  /// Recompute listing prices from source costs and pricing rules.
  Reprice,

  /// Write listings as an eBay File Exchange CSV.
  ExportEbay {
    /// Output file; stdout if omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so exports on stdout stay clean.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let mut settings = Settings::load(&cli.config)?;
  if let Some(database) = cli.database {
    settings.database_path = database;
  }

  let store = SqliteStore::open(&settings.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.database_path))?;

  match cli.command {
    Command::Import { file, json } => {
      let rows = sheet::read_records(&file)?;
      let result = Importer::new(&store)
        .progress_every(settings.progress_every)
        .import(&rows)
        .await;

      match result {
        Ok(report) => sheet::print_import_report(&report, json)?,
        Err(err) => {
          if let ImportError::Backend { report, .. } = &err {
            sheet::print_import_report(report, json)?;
          }
          return Err(err).context("import aborted");
        }
      }
    }

    Command::AddProduct { isku, title, asin, upc, requires_expiration } => {
      let mut input = NewProduct::new(&isku, &title, asin.as_deref(), upc.as_deref())?;
      input.requires_expiration = requires_expiration;

      if store.find_product(&input.isku).await?.is_some() {
        bail!(informattach_core::Error::DuplicateIsku(input.isku));
      }
      let product = store
        .insert_product(input)
        .await
        .context("failed to add product")?;
      println!("Added {} ({})", product.isku, product.product_id);
    }

    Command::Products { json } => {
      let products = store.list_product_summaries().await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
      } else {
        sheet::print_products(&products);
      }
    }

    Command::SetRule { marketplace, commission, fixed_fee, tax, margin } => {
      store
        .upsert_pricing_rule(PricingRule {
          marketplace:     marketplace.clone(),
          commission_rate: commission,
          fixed_fee,
          tax_rate:        tax,
          profit_margin:   margin,
        })
        .await?;
      println!("Saved pricing rule for {marketplace}");
    }

    Command::Reprice => {
      let report = reprice_listings(&store).await?;
      println!("Repriced {} listings, skipped {}", report.repriced, report.skipped);
    }

    Command::ExportEbay { out } => {
      let rows = ebay_rows(&store).await?;
      match out {
        Some(path) => {
          let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
          sheet::write_ebay_csv(&rows, file)?;
          tracing::info!(rows = rows.len(), path = %path.display(), "wrote eBay export");
        }
        None => sheet::write_ebay_csv(&rows, io::stdout().lock())?,
      }
    }
  }

  Ok(())
}
