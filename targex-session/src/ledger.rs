use rand::Rng;
use targex_core::Condition;

/// One (condition, remaining repetitions) pair.
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    pub condition: Condition,
    pub remaining: u32,
}

/// Tracks how many repetitions each condition still owes the session.
///
/// The ledger owns the ordered condition sequence; "remaining" is always a
/// non-negative count and the session is complete exactly when every count
/// is zero.
#[derive(Clone, Debug, Default)]
pub struct TrialLedger {
    entries: Vec<LedgerEntry>,
}

impl TrialLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition with its configured repetition count. No
    /// uniqueness constraint: the same definition may appear twice.
    pub fn add_condition(&mut self, condition: Condition) {
        let remaining = condition.trial_count;
        self.entries.push(LedgerEntry {
            condition,
            remaining,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn condition(&self, idx: usize) -> &Condition {
        &self.entries[idx].condition
    }

    pub fn remaining(&self, idx: usize) -> u32 {
        self.entries[idx].remaining
    }

    /// True iff every entry's repetition budget is exhausted.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.remaining == 0)
    }

    /// Consumes one repetition of a resolved trial. Called exactly once
    /// per resolution; an underflow means something upstream
    /// double-counted and is a fatal consistency error.
    pub fn decrement(&mut self, idx: usize) {
        let entry = &mut self.entries[idx];
        assert!(
            entry.remaining > 0,
            "ledger underflow: condition {idx} (`{}`) already exhausted",
            entry.condition.name
        );
        entry.remaining -= 1;
    }

    /// Fraction of conditions fully exhausted, NaN before configuration.
    pub fn progress(&self) -> f32 {
        if self.entries.is_empty() {
            return f32::NAN;
        }
        let done = self.entries.iter().filter(|e| e.remaining == 0).count();
        done as f32 / self.entries.len() as f32
    }

    /// Picks the next condition uniformly at random among those still
    /// owing repetitions. Returns `None` when every budget is exhausted;
    /// the caller keeps its previous selection and should consult
    /// `is_complete` before treating that as anything but end-of-session.
    pub fn select_next<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let eligible: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.remaining > 0)
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[rng.random_range(0..eligible.len())])
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
