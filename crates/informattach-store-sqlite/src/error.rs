//! Error type for `informattach-store-sqlite`.

use informattach_core::store::{ClassifyFailure, FailureKind};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown supplier kind: {0:?}")]
  SupplierKind(String),

  #[error("listing not found: {0}")]
  ListingNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl ClassifyFailure for Error {
  fn failure_kind(&self) -> FailureKind {
    match self {
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => FailureKind::Unavailable,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => classify_sqlite(e),
      _ => FailureKind::Other,
    }
  }
}

/// Lock contention (`SQLITE_BUSY`, `SQLITE_LOCKED`) stays a per-row failure;
/// only a store that cannot be read or written at all is unavailable.
fn classify_sqlite(e: &rusqlite::Error) -> FailureKind {
  match e.sqlite_error_code() {
    Some(ErrorCode::ConstraintViolation) => FailureKind::Conflict,
    Some(
      ErrorCode::CannotOpen
      | ErrorCode::SystemIoFailure
      | ErrorCode::DatabaseCorrupt
      | ErrorCode::NotADatabase
      | ErrorCode::DiskFull,
    ) => FailureKind::Unavailable,
    _ => FailureKind::Other,
  }
}
