//! End-to-end runs of the batch driver against in-memory catalogs.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::config::{EmitPolicy, MatchConfig};
use shared::dto::ResultRow;
use shared::error::{AppError, Result};
use shared::memory::MemoryCatalog;
use shared::{CatalogStore, ManufacturerHit, ManufacturerId, ProductHit};

#[path = "../src/batch.rs"]
mod batch;

use batch::{process, read_input, BatchCfg, BatchSummary, CsvSink, VecSink};

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_manufacturer(1, "Acme")
        .with_product(10, 1, "X200")
        .with_manufacturer(2, "Omega")
}

const SAMPLES: &str = "title,manufacturer_id,product_id\n\
Acme X200 monitor,1,10\n\
Omega device,,\n\
unbranded cable,,\n";

fn diff_only() -> BatchCfg {
    BatchCfg {
        emit_policy: EmitPolicy::DiffOnly,
        max_parallel: 1,
    }
}

/// Fails every lookup for titles containing "poison".
struct FlakyStore {
    inner: MemoryCatalog,
    calls: AtomicUsize,
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn find_manufacturers(&self, candidates: &BTreeSet<String>) -> Result<Vec<ManufacturerHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if candidates.iter().any(|c| c.contains("poison")) {
            return Err(AppError::Database("server closed the connection unexpectedly".into()));
        }
        self.inner.find_manufacturers(candidates).await
    }

    async fn find_products(
        &self,
        manufacturer_ids: &BTreeSet<ManufacturerId>,
        candidates: &BTreeSet<String>,
    ) -> Result<Vec<ProductHit>> {
        self.inner.find_products(manufacturer_ids, candidates).await
    }
}

#[tokio::test]
async fn all_rows_reports_every_title() {
    let mut sink = VecSink::default();
    let summary = process(
        read_input(SAMPLES.as_bytes()),
        &catalog(),
        &mut sink,
        &MatchConfig::default(),
        &BatchCfg::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            read: 3,
            resolved: 3,
            failed: 0,
            emitted: 3
        }
    );
    assert_eq!(
        sink.rows,
        vec![
            ResultRow {
                title: "Acme X200 monitor".into(),
                new_man: Some(1),
                old_man: Some(1),
                new_model: Some(10),
                old_model: Some(10),
            },
            ResultRow {
                title: "Omega device".into(),
                new_man: Some(2),
                old_man: None,
                new_model: None,
                old_model: None,
            },
            ResultRow {
                title: "unbranded cable".into(),
                new_man: None,
                old_man: None,
                new_model: None,
                old_model: None,
            },
        ]
    );
}

#[tokio::test]
async fn diff_only_drops_agreeing_rows() {
    let mut sink = VecSink::default();
    let summary = process(
        read_input(SAMPLES.as_bytes()),
        &catalog(),
        &mut sink,
        &MatchConfig::default(),
        &diff_only(),
    )
    .await
    .unwrap();

    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.emitted, 1);
    assert_eq!(sink.rows.len(), 1);
    assert_eq!(sink.rows[0].title, "Omega device");
}

#[tokio::test]
async fn failing_title_is_skipped() {
    let store = FlakyStore {
        inner: catalog(),
        calls: AtomicUsize::new(0),
    };
    let input = "title,m,p\nAcme X200,,\npoison pill,,\nOmega device,2,\n";
    let mut sink = VecSink::default();
    let summary = process(
        read_input(input.as_bytes()),
        &store,
        &mut sink,
        &MatchConfig::default(),
        &BatchCfg::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.read, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.resolved, 2);
    let titles: Vec<&str> = sink.rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Acme X200", "Omega device"]);
    // each title reached the store
    assert!(store.calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn rejected_input_counts_as_failed() {
    let input = "title,m,p\nAcme X200,one,\nOmega device,2,\n";
    let mut sink = VecSink::default();
    let summary = process(
        read_input(input.as_bytes()),
        &catalog(),
        &mut sink,
        &MatchConfig::default(),
        &diff_only(),
    )
    .await
    .unwrap();

    assert_eq!(
        summary,
        BatchSummary {
            read: 2,
            resolved: 1,
            failed: 1,
            emitted: 0
        }
    );
    assert!(sink.rows.is_empty());
}

#[tokio::test]
async fn parallel_run_keeps_input_order() {
    let mut input = String::from("title,m,p\n");
    for i in 0..40 {
        let title = if i % 2 == 0 { "Acme X200" } else { "Omega device" };
        input.push_str(&format!("{title} #{i},,\n"));
    }
    let cfg = BatchCfg {
        emit_policy: EmitPolicy::AllRows,
        max_parallel: 8,
    };
    let mut sink = VecSink::default();
    process(read_input(input.as_bytes()), &catalog(), &mut sink, &MatchConfig::default(), &cfg)
        .await
        .unwrap();

    assert_eq!(sink.rows.len(), 40);
    for (i, row) in sink.rows.iter().enumerate() {
        assert!(row.title.ends_with(&format!("#{i}")));
        let expected = if i % 2 == 0 { Some(1) } else { Some(2) };
        assert_eq!(row.new_man, expected);
    }
}

#[tokio::test]
async fn writes_csv_once() {
    let mut sink = CsvSink::from_writer(Vec::new());
    process(
        read_input(SAMPLES.as_bytes()),
        &catalog(),
        &mut sink,
        &MatchConfig::default(),
        &BatchCfg::default(),
    )
    .await
    .unwrap();

    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(
        out,
        "title,new_man,old_man,new_model,old_model\n\
         Acme X200 monitor,1,1,10,10\n\
         Omega device,2,,,\n\
         unbranded cable,,,,\n"
    );
}
