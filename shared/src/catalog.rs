//! Read-only access to the manufacturer/product catalog.
//!
//! Both lookups are exact-equality set-membership queries against the
//! canonical name and the synonym table at once. Stores compare
//! case-insensitively and hand back the spelling stored in the catalog as
//! `matched_text`, which is what ranking is computed over.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub type ManufacturerId = i32;
pub type ProductId = i32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManufacturerHit {
    pub id: ManufacturerId,
    /// Canonical name or synonym that equalled one of the candidates.
    pub matched_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductHit {
    pub id: ProductId,
    pub manufacturer_id: ManufacturerId,
    /// Canonical model or synonym that equalled one of the candidates.
    pub matched_text: String,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Manufacturers whose name or any synonym equals one of `candidates`.
    async fn find_manufacturers(&self, candidates: &BTreeSet<String>) -> Result<Vec<ManufacturerHit>>;

    /// Products owned by one of `manufacturer_ids` whose model or any
    /// synonym equals one of `candidates`.
    ///
    /// Implementations return nothing for an empty id set instead of running
    /// an unscoped lookup.
    async fn find_products(
        &self,
        manufacturer_ids: &BTreeSet<ManufacturerId>,
        candidates: &BTreeSet<String>,
    ) -> Result<Vec<ProductHit>>;
}

/// Lowercased copy of the candidate set, as sent to the stores.
pub fn lowercase_keys(candidates: &BTreeSet<String>) -> BTreeSet<String> {
    candidates.iter().map(|c| c.to_lowercase()).collect()
}
