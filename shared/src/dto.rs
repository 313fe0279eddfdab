use serde::{Deserialize, Serialize};

use crate::catalog::{ManufacturerId, ProductId};

/// One title to resolve, with the ids previously recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// 1-based position after the header row.
    pub row: usize,
    pub title: String,
    pub recorded_manufacturer_id: Option<ManufacturerId>,
    pub recorded_product_id: Option<ProductId>,
}

/// Comparison of the resolved ids against the recorded ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub title: String,
    pub new_man: Option<ManufacturerId>,
    pub old_man: Option<ManufacturerId>,
    pub new_model: Option<ProductId>,
    pub old_model: Option<ProductId>,
}

impl ResultRow {
    /// True when either resolved id disagrees with the recorded one.
    pub fn differs(&self) -> bool {
        self.new_man != self.old_man || self.new_model != self.old_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(new_man: Option<i32>, new_model: Option<i32>) -> ResultRow {
        ResultRow {
            title: "Acme X200".into(),
            new_man,
            old_man: Some(1),
            new_model,
            old_model: Some(10),
        }
    }

    #[test]
    fn identical_ids_do_not_differ() {
        assert!(!row(Some(1), Some(10)).differs());
    }

    #[test]
    fn any_mismatch_differs() {
        assert!(row(Some(2), Some(10)).differs());
        assert!(row(Some(1), None).differs());
    }
}
