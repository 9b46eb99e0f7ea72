//! Error types for `informattach-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{column} is blank; expected \"<name> [<region>]\"")]
  EmptyMarket { column: &'static str },

  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("product with isku {0:?} already exists")]
  DuplicateIsku(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
