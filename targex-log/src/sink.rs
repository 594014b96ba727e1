use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Result tables the session records into. `table_name` values match the
/// original results schema so downstream analysis scripts keep working.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    Trials,
    TargetTrajectory,
    PlayerActions,
    FrameInfo,
    Targets,
    Questions,
}

impl TableKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::Trials => "Trials",
            TableKind::TargetTrajectory => "Target_Trajectory",
            TableKind::PlayerActions => "Player_Action",
            TableKind::FrameInfo => "Frame_Info",
            TableKind::Targets => "Targets",
            TableKind::Questions => "Questions",
        }
    }
}

/// One serialized results row.
pub type Row = Vec<String>;

/// Boundary to the persistence backend.
///
/// `record_batch` hands off ownership of a complete batch; partial-row
/// batches never cross this boundary. A failure is surfaced to the caller,
/// which decides what to drop; the sink does not retry.
pub trait ResultsSink {
    fn create_results_file(&mut self, name: &str, user: &str, description: &str) -> Result<()>;
    fn record_batch(&mut self, table: TableKind, rows: Vec<Row>) -> Result<()>;
    fn close_results_file(&mut self) -> Result<()>;
}

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<(TableKind, Vec<Row>)>,
    pub created: Option<(String, String, String)>,
    pub closed: bool,
    /// When set, `record_batch` for this table fails. Lets tests exercise
    /// the per-buffer failure isolation path.
    pub fail_table: Option<TableKind>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows recorded for `table`, across batches, in order.
    pub fn rows_for(&self, table: TableKind) -> Vec<&Row> {
        self.batches
            .iter()
            .filter(|(kind, _)| *kind == table)
            .flat_map(|(_, rows)| rows.iter())
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

impl ResultsSink for MemorySink {
    fn create_results_file(&mut self, name: &str, user: &str, description: &str) -> Result<()> {
        self.created = Some((name.to_string(), user.to_string(), description.to_string()));
        Ok(())
    }

    fn record_batch(&mut self, table: TableKind, rows: Vec<Row>) -> Result<()> {
        if self.fail_table == Some(table) {
            anyhow::bail!("injected failure for table {}", table.table_name());
        }
        self.batches.push((table, rows));
        Ok(())
    }

    fn close_results_file(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
