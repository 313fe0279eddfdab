//! Catalog resolution for a single title.
//!
//! A [`SearchContext`] is built fresh for every title, filled with
//! manufacturer candidates and then, scoped to every manufacturer found,
//! product candidates. Store failures are returned to the caller untouched.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{CatalogStore, ManufacturerId};
use crate::config::{MatchConfig, Mode};
use crate::error::Result;
use crate::ngram::{expand_tiers, pooled_candidates, pooled_ngrams, Tier};
use crate::normalizer::tokenize;
use crate::ranker::{select, ManufacturerCandidate, ProductCandidate, Resolution};

/// The candidate strings of one title, grouped according to the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSpace {
    /// Largest window size first.
    Tiered(Vec<Tier>),
    Pooled(BTreeSet<String>),
}

impl SearchSpace {
    pub fn build(title: &str, cfg: &MatchConfig) -> Self {
        match cfg.mode {
            Mode::Tiered => {
                let tokens = tokenize(title);
                SearchSpace::Tiered(expand_tiers(&tokens, cfg.max_ngram_size, &cfg.punctuation))
            }
            Mode::Pooled => {
                let ngrams = pooled_ngrams(title, cfg.max_ngram_size);
                SearchSpace::Pooled(pooled_candidates(&ngrams))
            }
        }
    }

    /// Lookup groups in search order, tagged with their tier size.
    fn groups(&self) -> Vec<(Option<usize>, &BTreeSet<String>)> {
        match self {
            SearchSpace::Tiered(tiers) => tiers.iter().map(|t| (Some(t.size), &t.ngrams)).collect(),
            SearchSpace::Pooled(set) if set.is_empty() => Vec::new(),
            SearchSpace::Pooled(set) => vec![(None, set)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SearchContext {
    pub space: SearchSpace,
    pub manufacturers: Vec<ManufacturerCandidate>,
    pub products: Vec<ProductCandidate>,
}

impl SearchContext {
    pub fn new(title: &str, cfg: &MatchConfig) -> Self {
        Self {
            space: SearchSpace::build(title, cfg),
            manufacturers: Vec::new(),
            products: Vec::new(),
        }
    }

    /// Query every group for manufacturers. All groups are searched; hits
    /// keep the tier they came from.
    pub async fn find_manufacturers<S: CatalogStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let mut found = Vec::new();
        for (tier, candidates) in self.space.groups() {
            let hits = store.find_manufacturers(candidates).await?;
            found.extend(hits.into_iter().map(|hit| ManufacturerCandidate { hit, tier }));
        }
        self.manufacturers.extend(found);
        Ok(())
    }

    pub fn manufacturer_ids(&self) -> BTreeSet<ManufacturerId> {
        self.manufacturers.iter().map(|m| m.hit.id).collect()
    }

    /// Query every group for products owned by any manufacturer found so
    /// far. Skipped entirely when no manufacturer matched.
    pub async fn find_products<S: CatalogStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let ids = self.manufacturer_ids();
        if ids.is_empty() {
            return Ok(());
        }
        let mut found = Vec::new();
        for (tier, candidates) in self.space.groups() {
            let hits = store.find_products(&ids, candidates).await?;
            found.extend(hits.into_iter().map(|hit| ProductCandidate { hit, tier }));
        }
        self.products.extend(found);
        Ok(())
    }

    pub fn select(&self) -> Resolution {
        select(&self.manufacturers, &self.products)
    }
}

/// Resolve `title` to a manufacturer and product against `store`.
pub async fn resolve<S: CatalogStore + ?Sized>(title: &str, store: &S, cfg: &MatchConfig) -> Result<Resolution> {
    let mut ctx = SearchContext::new(title, cfg);
    if ctx.space.is_empty() {
        debug!(%title, "title has no searchable n-grams");
        return Ok(Resolution::default());
    }

    ctx.find_manufacturers(store).await?;
    ctx.find_products(store).await?;
    let resolution = ctx.select();

    debug!(
        %title,
        manufacturers = ctx.manufacturers.len(),
        products = ctx.products.len(),
        manufacturer = ?resolution.manufacturer,
        product = ?resolution.product,
        "title resolved"
    );
    Ok(resolution)
}
