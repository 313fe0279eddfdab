//! Picks the winning manufacturer/product pair among accumulated candidates.
//!
//! Candidates are ordered by specificity of the catalog text that matched:
//! more words first, then more characters. Tier size and id only break the
//! remaining ties so the choice never depends on store row order.

use std::cmp::Reverse;

use crate::catalog::{ManufacturerHit, ManufacturerId, ProductHit, ProductId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerCandidate {
    pub hit: ManufacturerHit,
    /// Window size of the tier that produced the hit; `None` in pooled mode.
    pub tier: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCandidate {
    pub hit: ProductHit,
    pub tier: Option<usize>,
}

/// Selected ids plus the catalog texts they were selected on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub manufacturer: Option<ManufacturerId>,
    pub product: Option<ProductId>,
    pub manufacturer_text: Option<String>,
    pub product_text: Option<String>,
}

/// `(word count, character length)` of a matched catalog text.
pub fn specificity(text: &str) -> (usize, usize) {
    (text.split_whitespace().count(), text.chars().count())
}

fn rank_key(text: &str, tier: Option<usize>, id: i32) -> (Reverse<usize>, Reverse<usize>, Reverse<usize>, i32) {
    let (words, len) = specificity(text);
    (Reverse(words), Reverse(len), Reverse(tier.unwrap_or(0)), id)
}

pub fn best_product(candidates: &[ProductCandidate]) -> Option<&ProductCandidate> {
    candidates
        .iter()
        .min_by_key(|c| rank_key(&c.hit.matched_text, c.tier, c.hit.id))
}

pub fn best_manufacturer(candidates: &[ManufacturerCandidate]) -> Option<&ManufacturerCandidate> {
    candidates
        .iter()
        .min_by_key(|c| rank_key(&c.hit.matched_text, c.tier, c.hit.id))
}

/// Apply the selection policy.
///
/// A product, when present, decides the manufacturer too: the reported
/// manufacturer is always the product's owner. Without a product the most
/// specific manufacturer wins. Without either, both ids are `None`.
pub fn select(manufacturers: &[ManufacturerCandidate], products: &[ProductCandidate]) -> Resolution {
    if let Some(p) = best_product(products) {
        let owner_text = manufacturers
            .iter()
            .filter(|m| m.hit.id == p.hit.manufacturer_id)
            .min_by_key(|m| rank_key(&m.hit.matched_text, m.tier, m.hit.id))
            .map(|m| m.hit.matched_text.clone());
        return Resolution {
            manufacturer: Some(p.hit.manufacturer_id),
            product: Some(p.hit.id),
            manufacturer_text: owner_text,
            product_text: Some(p.hit.matched_text.clone()),
        };
    }

    match best_manufacturer(manufacturers) {
        Some(m) => Resolution {
            manufacturer: Some(m.hit.id),
            product: None,
            manufacturer_text: Some(m.hit.matched_text.clone()),
            product_text: None,
        },
        None => Resolution::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn man(id: i32, text: &str, tier: Option<usize>) -> ManufacturerCandidate {
        ManufacturerCandidate {
            hit: ManufacturerHit {
                id,
                matched_text: text.into(),
            },
            tier,
        }
    }

    fn prod(id: i32, manufacturer_id: i32, text: &str, tier: Option<usize>) -> ProductCandidate {
        ProductCandidate {
            hit: ProductHit {
                id,
                manufacturer_id,
                matched_text: text.into(),
            },
            tier,
        }
    }

    #[test]
    fn more_words_win() {
        let ms = vec![man(1, "Acme", Some(1)), man(2, "Acme Medical Devices", Some(3))];
        assert_eq!(select(&ms, &[]).manufacturer, Some(2));

        // same tier, word count still decides
        let ms = vec![man(1, "Acmeeeeeeeeeeeeeeeeeee", None), man(2, "Acme Medical Devices", None)];
        assert_eq!(select(&ms, &[]).manufacturer, Some(2));
    }

    #[test]
    fn longer_text_breaks_word_count_tie() {
        let ps = vec![prod(10, 1, "X20", Some(1)), prod(11, 1, "X2000", Some(1))];
        let ms = vec![man(1, "Acme", Some(1))];
        assert_eq!(select(&ms, &ps).product, Some(11));
    }

    #[test]
    fn full_tie_falls_back_to_lowest_id() {
        let ms = vec![man(7, "Zeta", Some(1)), man(3, "Beta", Some(1))];
        assert_eq!(select(&ms, &[]).manufacturer, Some(3));
    }

    #[test]
    fn manufacturer_follows_product() {
        let ms = vec![man(1, "Acme Medical Devices", Some(3)), man(2, "Omega", Some(1))];
        let ps = vec![prod(20, 2, "BP 20-50", Some(2))];
        let r = select(&ms, &ps);
        assert_eq!(r.product, Some(20));
        assert_eq!(r.manufacturer, Some(2));
        assert_eq!(r.manufacturer_text.as_deref(), Some("Omega"));
    }

    #[test]
    fn nothing_matched() {
        assert_eq!(select(&[], &[]), Resolution::default());
    }

    #[test]
    fn specificity_counts_words_then_chars() {
        assert_eq!(specificity("bp 20-50"), (2, 8));
        assert_eq!(specificity(""), (0, 0));
    }
}
