use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::sink::{ResultsSink, Row, TableKind};

#[derive(Serialize)]
struct FileHeader<'a> {
    name: &'a str,
    user: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct BatchLine<'a> {
    table: &'a str,
    rows: &'a [Row],
}

/// Results logger writing one JSON object per line: a header record
/// followed by one line per recorded batch. A batch is serialized as a
/// single line, so a torn write never yields a half-parseable batch.
pub struct JsonlLogger {
    dir: PathBuf,
    out: Option<BufWriter<File>>,
}

impl JsonlLogger {
    /// Logger that creates its results files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            out: None,
        }
    }
}

impl ResultsSink for JsonlLogger {
    fn create_results_file(&mut self, name: &str, user: &str, description: &str) -> Result<()> {
        let path = self.dir.join(format!("{name}.results.jsonl"));
        let file = File::create(&path)
            .with_context(|| format!("creating results file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(
            &mut out,
            &FileHeader {
                name,
                user,
                description,
            },
        )?;
        out.write_all(b"\n")?;
        self.out = Some(out);
        Ok(())
    }

    fn record_batch(&mut self, table: TableKind, rows: Vec<Row>) -> Result<()> {
        let out = self.out.as_mut().context("results file not open")?;
        serde_json::to_writer(
            &mut *out,
            &BatchLine {
                table: table.table_name(),
                rows: &rows,
            },
        )?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn close_results_file(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush().context("flushing results file")?;
        }
        Ok(())
    }
}
