//! In-process catalog backed by plain vectors.
//!
//! Used for offline runs (`CATALOG_PATH` pointing at a JSON export) and as the
//! store behind the matcher tests. Lookup semantics mirror the Postgres
//! store: case-insensitive equality, distinct hits, stored spelling returned.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::catalog::{lowercase_keys, CatalogStore, ManufacturerHit, ManufacturerId, ProductHit, ProductId};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManufacturerSynonym {
    pub manufacturer_id: ManufacturerId,
    pub synonym: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub manufacturer_id: ManufacturerId,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductSynonym {
    pub product_id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    pub manufacturers: Vec<Manufacturer>,
    #[serde(default)]
    pub manufacturer_synonyms: Vec<ManufacturerSynonym>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub product_synonyms: Vec<ProductSynonym>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AppError::Catalog(format!("invalid catalog json: {e}")))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn with_manufacturer(mut self, id: ManufacturerId, name: &str) -> Self {
        self.manufacturers.push(Manufacturer { id, name: name.into() });
        self
    }

    pub fn with_manufacturer_synonym(mut self, manufacturer_id: ManufacturerId, synonym: &str) -> Self {
        self.manufacturer_synonyms.push(ManufacturerSynonym {
            manufacturer_id,
            synonym: synonym.into(),
        });
        self
    }

    pub fn with_product(mut self, id: ProductId, manufacturer_id: ManufacturerId, model: &str) -> Self {
        self.products.push(Product {
            id,
            manufacturer_id,
            model: model.into(),
        });
        self
    }

    pub fn with_product_synonym(mut self, product_id: ProductId, name: &str) -> Self {
        self.product_synonyms.push(ProductSynonym {
            product_id,
            name: name.into(),
        });
        self
    }

    fn manufacturer_exists(&self, id: ManufacturerId) -> bool {
        self.manufacturers.iter().any(|m| m.id == id)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_manufacturers(&self, candidates: &BTreeSet<String>) -> Result<Vec<ManufacturerHit>> {
        let keys = lowercase_keys(candidates);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let canonical = self
            .manufacturers
            .iter()
            .filter(|m| keys.contains(&m.name.to_lowercase()))
            .map(|m| ManufacturerHit {
                id: m.id,
                matched_text: m.name.clone(),
            });
        let synonyms = self
            .manufacturer_synonyms
            .iter()
            .filter(|s| keys.contains(&s.synonym.to_lowercase()) && self.manufacturer_exists(s.manufacturer_id))
            .map(|s| ManufacturerHit {
                id: s.manufacturer_id,
                matched_text: s.synonym.clone(),
            });

        let hits: BTreeSet<ManufacturerHit> = canonical.chain(synonyms).collect();
        Ok(hits.into_iter().collect())
    }

    async fn find_products(
        &self,
        manufacturer_ids: &BTreeSet<ManufacturerId>,
        candidates: &BTreeSet<String>,
    ) -> Result<Vec<ProductHit>> {
        let keys = lowercase_keys(candidates);
        if manufacturer_ids.is_empty() || keys.is_empty() {
            return Ok(Vec::new());
        }

        let scoped: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| manufacturer_ids.contains(&p.manufacturer_id))
            .collect();

        let mut hits = BTreeSet::new();
        for p in &scoped {
            if keys.contains(&p.model.to_lowercase()) {
                hits.insert(ProductHit {
                    id: p.id,
                    manufacturer_id: p.manufacturer_id,
                    matched_text: p.model.clone(),
                });
            }
            for s in self.product_synonyms.iter().filter(|s| s.product_id == p.id) {
                if keys.contains(&s.name.to_lowercase()) {
                    hits.insert(ProductHit {
                        id: p.id,
                        manufacturer_id: p.manufacturer_id,
                        matched_text: s.name.clone(),
                    });
                }
            }
        }
        Ok(hits.into_iter().collect())
    }
}
