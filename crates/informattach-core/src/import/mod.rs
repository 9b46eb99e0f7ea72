//! Bulk import reconciliation.
//!
//! [`Importer::import`] preloads the caches, then pushes every row through
//! normalize → resolve → junction upsert in input order. A failing row is
//! recorded and skipped; only a preload failure or an unreachable backend
//! stops the batch.

mod cache;
mod junction;
mod resolve;

#[cfg(test)]
mod tests;

pub use cache::{ImportCache, ImportContext};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  normalize::{RawRecord, normalize},
  store::{CatalogStore, ClassifyFailure, FailureKind},
};

pub const DEFAULT_PROGRESS_EVERY: usize = 10;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failures that abort a whole import.
#[derive(Debug, Error)]
pub enum ImportError {
  #[error("failed to preload import caches: {0}")]
  Preload(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// `report` holds the tally and diagnostics for every row before
  /// `row_index`.
  #[error(
    "backend unavailable at row {row_index} after {} imported and {} failed rows: {message}",
    .report.success,
    .report.errors
  )]
  Backend {
    row_index: usize,
    message:   String,
    report:    ImportReport,
  },
}

// ─── Per-row outcome ─────────────────────────────────────────────────────────

/// Identifiers a successfully imported row resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIds {
  pub source_marketplace_id: Uuid,
  pub target_marketplace_id: Uuid,
  pub supplier_id:           Uuid,
  pub store_id:              Uuid,
  pub product_id:            Uuid,
  pub source_created:        bool,
  pub listing_created:       bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
  Imported(ResolvedIds),
  /// The row itself is unusable (e.g. a blank market cell).
  DataError(String),
  /// The store rejected a read or write for this row.
  BackendError { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
  Data,
  Backend,
}

/// Diagnostic for one failed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
  pub row_index: usize,
  pub reason:    FailureReason,
  pub message:   String,
}

/// Result of one import run. `success + errors` always equals the number of
/// input rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub success:  usize,
  pub errors:   usize,
  pub failures: Vec<RowFailure>,
}

impl ImportReport {
  fn fail(&mut self, row_index: usize, reason: FailureReason, message: String) {
    tracing::warn!(row = row_index, ?reason, %message, "row import failed");
    self.errors += 1;
    self.failures.push(RowFailure { row_index, reason, message });
  }
}

/// `(current_index + 1, total_rows)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  pub current: usize,
  pub total:   usize,
}

type ProgressFn<'a> = Box<dyn FnMut(Progress) + Send + 'a>;

// ─── Row pipeline ────────────────────────────────────────────────────────────

impl<S: CatalogStore> ImportContext<'_, S> {
  /// Normalize, resolve and link a single row.
  pub async fn import_row(&mut self, record: &RawRecord, row_index: usize) -> RowOutcome {
    let row = match normalize(record, row_index) {
      Ok(row) => row,
      Err(e) => return RowOutcome::DataError(e.to_string()),
    };

    match self.link_row(&row).await {
      Ok(ids) => RowOutcome::Imported(ids),
      Err(e) => RowOutcome::BackendError {
        kind:    e.failure_kind(),
        message: e.to_string(),
      },
    }
  }

  async fn link_row(
    &mut self,
    row: &crate::normalize::NormalizedRow,
  ) -> Result<ResolvedIds, S::Error> {
    let source_marketplace_id = self
      .resolve_marketplace(&row.source_market.name, &row.source_market.region)
      .await?;
    let target_marketplace_id = self
      .resolve_marketplace(&row.target_market.name, &row.target_market.region)
      .await?;

    let supplier_id = self
      .resolve_supplier(&row.source_market.raw, source_marketplace_id)
      .await?;
    let store_id = self
      .resolve_store(&row.target_market.raw, target_marketplace_id)
      .await?;
    let product_id = self
      .resolve_product(&row.isku, &row.source_id, &row.title, &row.media_url)
      .await?;

    let source_created = self
      .ensure_source(product_id, supplier_id, &row.source_id, row.source_price)
      .await?;
    let listing_created = self
      .ensure_listing(product_id, store_id, &row.target_item_id, row.target_price)
      .await?;

    Ok(ResolvedIds {
      source_marketplace_id,
      target_marketplace_id,
      supplier_id,
      store_id,
      product_id,
      source_created,
      listing_created,
    })
  }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Drives one import run over a [`CatalogStore`].
pub struct Importer<'s, S: CatalogStore> {
  store:          &'s S,
  progress_every: usize,
  on_progress:    Option<ProgressFn<'s>>,
}

impl<'s, S: CatalogStore> Importer<'s, S> {
  pub fn new(store: &'s S) -> Self {
    Self {
      store,
      progress_every: DEFAULT_PROGRESS_EVERY,
      on_progress: None,
    }
  }

  /// Report progress every `every` rows (and on the last row).
  pub fn progress_every(mut self, every: usize) -> Self {
    self.progress_every = every.max(1);
    self
  }

  pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 's) -> Self {
    self.on_progress = Some(Box::new(f));
    self
  }

  /// Import `rows` in order and return the success/error tally.
  pub async fn import(&mut self, rows: &[RawRecord]) -> Result<ImportReport, ImportError> {
    let total = rows.len();
    tracing::info!(rows = total, "starting import");

    let mut ctx = ImportContext::preload(self.store)
      .await
      .map_err(|e| ImportError::Preload(Box::new(e)))?;

    let mut report = ImportReport::default();

    for (row_index, record) in rows.iter().enumerate() {
      match ctx.import_row(record, row_index).await {
        RowOutcome::Imported(_) => report.success += 1,
        RowOutcome::DataError(message) => {
          report.fail(row_index, FailureReason::Data, message);
        }
        RowOutcome::BackendError { kind: FailureKind::Unavailable, message } => {
          tracing::error!(row = row_index, %message, "backend unavailable; aborting import");
          return Err(ImportError::Backend { row_index, message, report });
        }
        RowOutcome::BackendError { message, .. } => {
          report.fail(row_index, FailureReason::Backend, message);
        }
      }

      let current = row_index + 1;
      if current % self.progress_every == 0 || current == total {
        tracing::info!(current, total, "import progress");
        if let Some(f) = self.on_progress.as_mut() {
          f(Progress { current, total });
        }
      }
    }

    tracing::info!(
      success = report.success,
      errors = report.errors,
      "import finished"
    );
    Ok(report)
  }
}
