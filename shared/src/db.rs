//! Postgres-backed catalog.
//!
//! Tables: `manufacturers(id, name)`, `manufacturer_synonyms(manufacturer_id,
//! synonym)`, `products(id, manufacturer_id, model)` and
//! `product_synonyms(product_id, name)`. Each lookup is a single UNION query
//! over the canonical table and its synonym table.

use std::collections::BTreeSet;

use async_trait::async_trait;
use postgres_native_tls::MakeTlsConnector;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info, warn};

use crate::catalog::{lowercase_keys, CatalogStore, ManufacturerHit, ManufacturerId, ProductHit};
use crate::error::{AppError, Result};

const FIND_MANUFACTURERS: &str = r#"
    SELECT m.id, m.name AS matched_text
      FROM manufacturers m
     WHERE lower(m.name) = ANY($1)
    UNION
    SELECT m.id, ms.synonym AS matched_text
      FROM manufacturer_synonyms ms
      JOIN manufacturers m ON m.id = ms.manufacturer_id
     WHERE lower(ms.synonym) = ANY($1)
    ORDER BY 1, 2
"#;

const FIND_PRODUCTS: &str = r#"
    SELECT p.id, p.manufacturer_id, p.model AS matched_text
      FROM products p
     WHERE p.manufacturer_id = ANY($1)
       AND lower(p.model) = ANY($2)
    UNION
    SELECT p.id, p.manufacturer_id, ps.name AS matched_text
      FROM product_synonyms ps
      JOIN products p ON p.id = ps.product_id
     WHERE p.manufacturer_id = ANY($1)
       AND lower(ps.name) = ANY($2)
    ORDER BY 1, 3
"#;

/// TLS is used unless the URL explicitly says `sslmode=disable`.
fn want_tls(database_url: &str) -> bool {
    let Some((_, params)) = database_url.split_once('?') else {
        return true;
    };
    !params
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key.eq_ignore_ascii_case("sslmode") && value.eq_ignore_ascii_case("disable"))
}

pub struct PgCatalog {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgCatalog {
    /// Open one connection. Not retried: a failure here ends the run.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let (client, connection) = if want_tls(database_url) {
            let tls = native_tls::TlsConnector::builder()
                .build()
                .map_err(|e| AppError::Database(format!("tls setup failed: {e}")))?;
            let (client, connection) =
                tokio_postgres::connect(database_url, MakeTlsConnector::new(tls)).await?;
            let handle = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!(%e, "postgres connection task ended with error (TLS)");
                }
            });
            (client, handle)
        } else {
            let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
            let handle = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!(%e, "postgres connection task ended with error");
                }
            });
            (client, handle)
        };
        info!(tls = want_tls(database_url), "connected to catalog database");
        Ok(Self { client, connection })
    }

    /// Drop the client and wait for the connection task to finish.
    pub async fn close(self) {
        drop(self.client);
        if let Err(e) = self.connection.await {
            warn!(%e, "postgres connection task did not shut down cleanly");
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn find_manufacturers(&self, candidates: &BTreeSet<String>) -> Result<Vec<ManufacturerHit>> {
        let keys: Vec<String> = lowercase_keys(candidates).into_iter().collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.client.query(FIND_MANUFACTURERS, &[&keys]).await?;
        rows.iter()
            .map(|r| -> Result<ManufacturerHit> {
                Ok(ManufacturerHit {
                    id: r.try_get(0)?,
                    matched_text: r.try_get(1)?,
                })
            })
            .collect()
    }

    async fn find_products(
        &self,
        manufacturer_ids: &BTreeSet<ManufacturerId>,
        candidates: &BTreeSet<String>,
    ) -> Result<Vec<ProductHit>> {
        let keys: Vec<String> = lowercase_keys(candidates).into_iter().collect();
        if manufacturer_ids.is_empty() || keys.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ManufacturerId> = manufacturer_ids.iter().copied().collect();
        let rows = self.client.query(FIND_PRODUCTS, &[&ids, &keys]).await?;
        rows.iter()
            .map(|r| -> Result<ProductHit> {
                Ok(ProductHit {
                    id: r.try_get(0)?,
                    manufacturer_id: r.try_get(1)?,
                    matched_text: r.try_get(2)?,
                })
            })
            .collect()
    }
}
