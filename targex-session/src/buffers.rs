use targex_core::{FrameInfo, PlayerAction, TargetLocation};
use targex_log::{ResultsSink, Row, TableKind};

use crate::config::LogConfig;
use crate::ledger::LedgerEntry;

/// Append-only, flag-gated record buffer. Disabled buffers ignore pushes
/// so call sites stay unconditional.
#[derive(Clone, Debug)]
pub struct Accumulator<T> {
    enabled: bool,
    records: Vec<T>,
}

impl<T> Accumulator<T> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn push(&mut self, record: T) {
        if self.enabled {
            self.records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.records)
    }
}

/// The three per-trial accumulation buffers, filled during the task
/// window and flushed at trial resolution.
#[derive(Debug)]
pub struct DataBuffers {
    pub trajectory: Accumulator<TargetLocation>,
    pub actions: Accumulator<PlayerAction>,
    pub frames: Accumulator<FrameInfo>,
}

impl DataBuffers {
    pub fn new(config: &LogConfig) -> Self {
        Self {
            trajectory: Accumulator::new(config.enable && config.log_target_trajectories),
            actions: Accumulator::new(config.enable && config.log_player_actions),
            frames: Accumulator::new(config.enable && config.log_frame_info),
        }
    }

    /// Buffers for an unconfigured session: everything off.
    pub fn disabled() -> Self {
        Self {
            trajectory: Accumulator::new(false),
            actions: Accumulator::new(false),
            frames: Accumulator::new(false),
        }
    }

    pub fn clear_all(&mut self) {
        self.trajectory.clear();
        self.actions.clear();
        self.frames.clear();
    }

    /// Flushes each non-empty buffer to the sink as a single batch.
    ///
    /// Buffers are independent: a sink failure drops that one batch (the
    /// loss is reported) and the buffer is cleared either way, so a bad
    /// table can neither stall trial progression nor grow without bound.
    /// Disabled buffers are never pushed to, hence never reach the sink.
    pub fn flush(&mut self, sink: &mut dyn ResultsSink) {
        if !self.trajectory.is_empty() {
            let rows = trajectory_rows(&self.trajectory.take());
            flush_batch(sink, TableKind::TargetTrajectory, rows);
        }
        if !self.actions.is_empty() {
            let rows = action_rows(&self.actions.take());
            flush_batch(sink, TableKind::PlayerActions, rows);
        }
        if !self.frames.is_empty() {
            let rows = frame_rows(&self.frames.take());
            flush_batch(sink, TableKind::FrameInfo, rows);
        }
    }
}

pub(crate) fn flush_batch(sink: &mut dyn ResultsSink, table: TableKind, rows: Vec<Row>) {
    let count = rows.len();
    if let Err(err) = sink.record_batch(table, rows) {
        eprintln!(
            "results sink rejected {count} {} rows, dropping them: {err:#}",
            table.table_name()
        );
    }
}

/// Timestamp column format, microsecond precision.
pub fn format_time(t: f64) -> String {
    format!("{t:.6}")
}

pub fn trajectory_rows(records: &[TargetLocation]) -> Vec<Row> {
    records
        .iter()
        .map(|loc| {
            vec![
                format_time(loc.time),
                loc.name.clone(),
                loc.position.x.to_string(),
                loc.position.y.to_string(),
                loc.position.z.to_string(),
            ]
        })
        .collect()
}

pub fn action_rows(records: &[PlayerAction]) -> Vec<Row> {
    records
        .iter()
        .map(|action| {
            vec![
                format_time(action.time),
                action.view_direction.x.to_string(),
                action.view_direction.y.to_string(),
                action.position.x.to_string(),
                action.position.y.to_string(),
                action.position.z.to_string(),
                action.kind.as_str().to_string(),
                action.target_name.clone(),
            ]
        })
        .collect()
}

pub fn frame_rows(records: &[FrameInfo]) -> Vec<Row> {
    records
        .iter()
        .map(|info| vec![format_time(info.time), info.sim_delta.to_string()])
        .collect()
}

/// One row per configured target, recorded once at session start.
pub fn target_rows(entries: &[LedgerEntry]) -> Vec<Row> {
    let mut rows = Vec::new();
    for (cond_idx, entry) in entries.iter().enumerate() {
        for target in &entry.condition.targets {
            rows.push(vec![
                target.name.clone(),
                target.id.clone(),
                cond_idx.to_string(),
                entry.condition.name.clone(),
                format!("{:?}", target.destination_space).to_lowercase(),
                target.speed.0.to_string(),
                target.speed.1.to_string(),
                target.ecc_h.0.to_string(),
                target.ecc_h.1.to_string(),
                target.ecc_v.0.to_string(),
                target.ecc_v.1.to_string(),
                match target.respawns {
                    targex_core::Respawns::Infinite => "-1".to_string(),
                    targex_core::Respawns::Count(n) => n.to_string(),
                },
            ]);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use targex_log::MemorySink;

    fn all_on() -> LogConfig {
        LogConfig::default()
    }

    fn location(time: f64, name: &str) -> TargetLocation {
        TargetLocation {
            time,
            name: name.to_string(),
            position: Vec3::new(0.1, 0.2, -1.0),
        }
    }

    /// Three ticks logging two targets each flush as exactly six ordered
    /// rows, and the buffer is empty immediately after.
    #[test]
    fn trajectory_flush_yields_ordered_rows_and_empties_the_buffer() {
        let mut buffers = DataBuffers::new(&all_on());
        for tick in 0..3 {
            let t = tick as f64 * 0.01;
            buffers.trajectory.push(location(t, "a"));
            buffers.trajectory.push(location(t, "b"));
        }
        assert_eq!(buffers.trajectory.len(), 6);

        let mut sink = MemorySink::new();
        buffers.flush(&mut sink);

        let rows = sink.rows_for(TableKind::TargetTrajectory);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0][1], "a");
        assert_eq!(rows[1][1], "b");
        assert_eq!(rows[4][0], format_time(0.02));
        assert!(buffers.trajectory.is_empty());
    }

    /// Empty and disabled buffers never invoke the persistence sink.
    #[test]
    fn empty_or_disabled_buffers_never_touch_the_sink() {
        let mut sink = MemorySink::new();

        let mut empty = DataBuffers::new(&all_on());
        empty.flush(&mut sink);
        assert_eq!(sink.batch_count(), 0);

        let mut disabled = DataBuffers::disabled();
        disabled.trajectory.push(location(0.0, "a"));
        disabled.flush(&mut sink);
        assert_eq!(sink.batch_count(), 0);
    }

    /// A failure on one table does not block the other buffers, and the
    /// failing buffer is still cleared.
    #[test]
    fn sink_failure_is_isolated_per_buffer() {
        let mut buffers = DataBuffers::new(&all_on());
        buffers.trajectory.push(location(0.0, "a"));
        buffers.frames.push(FrameInfo {
            time: 0.0,
            sim_delta: 0.016,
        });

        let mut sink = MemorySink {
            fail_table: Some(TableKind::TargetTrajectory),
            ..MemorySink::default()
        };
        buffers.flush(&mut sink);

        assert!(sink.rows_for(TableKind::TargetTrajectory).is_empty());
        assert_eq!(sink.rows_for(TableKind::FrameInfo).len(), 1);
        assert!(buffers.trajectory.is_empty());
        assert!(buffers.frames.is_empty());
    }

    #[test]
    fn action_rows_spell_out_the_action_kind() {
        use targex_core::{PlayerAction, PlayerActionKind};
        let rows = action_rows(&[PlayerAction {
            time: 1.5,
            view_direction: glam::Vec2::new(12.0, -3.0),
            position: Vec3::ZERO,
            kind: PlayerActionKind::Destroy,
            target_name: "s_0_t0_0".into(),
        }]);
        assert_eq!(rows[0][6], "destroy");
        assert_eq!(rows[0][7], "s_0_t0_0");
    }
}
