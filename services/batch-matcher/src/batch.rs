use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use tracing::{info, warn};

use shared::config::{EmitPolicy, MatchConfig};
use shared::dto::{InputRow, ResultRow};
use shared::resolver::resolve;
use shared::CatalogStore;

const OUTPUT_HEADER: [&str; 5] = ["title", "new_man", "old_man", "new_model", "old_model"];

#[derive(Clone, Debug)]
pub struct BatchCfg {
    pub emit_policy: EmitPolicy,
    pub max_parallel: usize, // MAX_PARALLEL
}

impl Default for BatchCfg {
    fn default() -> Self {
        Self {
            emit_policy: EmitPolicy::AllRows,
            max_parallel: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub read: usize,
    pub resolved: usize,
    pub failed: usize,
    pub emitted: usize,
}

/// Parsed input plus the number of records that could not be used.
#[derive(Clone, Debug, Default)]
pub struct InputBatch {
    pub rows: Vec<InputRow>,
    pub rejected: usize,
}

/// Receives the finished result rows once, after the whole batch ran.
pub trait RowSink {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<()>;
}

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        Self { writer }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<()> {
        self.writer.write_record(OUTPUT_HEADER).context("writing csv header")?;
        for row in rows {
            self.writer.serialize(row).context("writing csv row")?;
        }
        self.writer.flush().context("flushing csv output")?;
        Ok(())
    }
}

/// Writes the rows to a CSV file. The file is only created (and an earlier
/// one replaced) when the rows arrive.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSink for CsvFileSink {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<()> {
        let file = File::create(&self.path).with_context(|| format!("creating {}", self.path.display()))?;
        CsvSink::from_writer(file).write_rows(rows)
    }
}

/// Keeps the rows in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub rows: Vec<ResultRow>,
}

impl RowSink for VecSink {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<()> {
        self.rows.extend_from_slice(rows);
        Ok(())
    }
}

fn parse_id(cell: Option<&str>) -> Result<Option<i32>, String> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i32>().map(Some).map_err(|e| format!("invalid id '{v}': {e}")),
    }
}

/// Read `title, recorded_manufacturer_id, recorded_product_id` records after
/// a header row. Records with unusable ids are logged and counted, not
/// returned.
pub fn read_input<R: Read>(reader: R) -> InputBatch {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut batch = InputBatch::default();
    for (idx, record) in rdr.records().enumerate() {
        let row = idx + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row, %e, "unreadable input record, skipping");
                batch.rejected += 1;
                continue;
            }
        };

        let ids = parse_id(record.get(1)).and_then(|m| parse_id(record.get(2)).map(|p| (m, p)));
        match ids {
            Ok((recorded_manufacturer_id, recorded_product_id)) => batch.rows.push(InputRow {
                row,
                title: record.get(0).unwrap_or("").to_string(),
                recorded_manufacturer_id,
                recorded_product_id,
            }),
            Err(e) => {
                warn!(row, %e, "invalid recorded id, skipping");
                batch.rejected += 1;
            }
        }
    }
    batch
}

pub fn read_input_path(path: impl AsRef<Path>) -> Result<InputBatch> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(read_input(file))
}

/// Resolve every row. Failed titles are logged and left out; the returned
/// rows keep input order.
pub async fn run_batch<S: CatalogStore + ?Sized>(
    rows: &[InputRow],
    store: &S,
    match_cfg: &MatchConfig,
    batch_cfg: &BatchCfg,
) -> (Vec<ResultRow>, BatchSummary) {
    let futs = rows.iter().map(|input| async move {
        let outcome = resolve(&input.title, store, match_cfg).await;
        (input, outcome)
    });

    let outcomes: Vec<_> = stream::iter(futs)
        .buffered(batch_cfg.max_parallel.max(1))
        .collect()
        .await;

    let mut summary = BatchSummary {
        read: rows.len(),
        ..BatchSummary::default()
    };
    let mut out = Vec::new();
    for (input, outcome) in outcomes {
        let resolution = match outcome {
            Ok(r) => r,
            Err(e) => {
                warn!(row = input.row, title = %input.title, %e, "resolution failed, skipping title");
                summary.failed += 1;
                continue;
            }
        };
        summary.resolved += 1;

        let result = ResultRow {
            title: input.title.clone(),
            new_man: resolution.manufacturer,
            old_man: input.recorded_manufacturer_id,
            new_model: resolution.product,
            old_model: input.recorded_product_id,
        };
        if batch_cfg.emit_policy == EmitPolicy::DiffOnly && !result.differs() {
            continue;
        }
        out.push(result);
    }
    summary.emitted = out.len();
    (out, summary)
}

/// Run the batch and hand the rows to `sink` in one go.
pub async fn process<S, K>(
    input: InputBatch,
    store: &S,
    sink: &mut K,
    match_cfg: &MatchConfig,
    batch_cfg: &BatchCfg,
) -> Result<BatchSummary>
where
    S: CatalogStore + ?Sized,
    K: RowSink,
{
    let started = Instant::now();
    let (rows, mut summary) = run_batch(&input.rows, store, match_cfg, batch_cfg).await;
    summary.read += input.rejected;
    summary.failed += input.rejected;

    sink.write_rows(&rows)?;

    info!(
        read = summary.read,
        resolved = summary.resolved,
        failed = summary.failed,
        emitted = summary.emitted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );
    Ok(summary)
}
