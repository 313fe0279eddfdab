//! Title matching core shared by the batch tooling: tokenization, n-gram
//! expansion, catalog lookup and candidate ranking, together with the
//! configuration handling, error type, row DTOs and catalog stores the
//! services build on.

pub mod catalog;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod memory;
pub mod ngram;
pub mod normalizer;
pub mod ranker;
pub mod resolver;

pub use catalog::{CatalogStore, ManufacturerHit, ManufacturerId, ProductHit, ProductId};
pub use config::{EmitPolicy, MatchConfig, Mode, Settings};
pub use ranker::Resolution;
pub use resolver::resolve;
