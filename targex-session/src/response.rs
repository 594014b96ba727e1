use targex_core::{Condition, Respawns};

/// Total target budget for one trial.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetTally {
    /// At least one sub-target respawns forever; the trial can never be
    /// fully cleared and the budget stays out of all arithmetic.
    Unbounded,
    Exact(u32),
}

impl TargetTally {
    /// Sums the per-target respawn budgets, short-circuiting on the
    /// infinite-spawn marker.
    pub fn for_condition(condition: &Condition) -> Self {
        let mut total = 0u32;
        for target in &condition.targets {
            match target.respawns {
                Respawns::Infinite => return TargetTally::Unbounded,
                Respawns::Count(n) => total += n,
            }
        }
        TargetTally::Exact(total)
    }

    /// Resolves the destroyed-target count against the budget.
    ///
    /// Panics when more targets were destroyed than the trial could have
    /// presented: that is an upstream counting bug, not a state to clamp
    /// away.
    pub fn resolve(&self, destroyed: u32) -> ResponseOutcome {
        match *self {
            TargetTally::Unbounded => ResponseOutcome::Unbounded,
            TargetTally::Exact(total) => {
                assert!(
                    destroyed <= total,
                    "destroyed {destroyed} targets out of a budget of {total}: upstream miscount"
                );
                match total - destroyed {
                    0 => ResponseOutcome::FullClear,
                    n => ResponseOutcome::Remaining(n),
                }
            }
        }
    }
}

/// Outcome of one trial's response evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Every target destroyed; the trial scores its unused task time.
    FullClear,
    Remaining(u32),
    Unbounded,
}

impl ResponseOutcome {
    pub fn is_full_clear(&self) -> bool {
        matches!(self, ResponseOutcome::FullClear)
    }

    /// Remaining-count column value for the trial row.
    pub fn row_value(&self) -> String {
        match self {
            ResponseOutcome::FullClear => "0".to_string(),
            ResponseOutcome::Remaining(n) => n.to_string(),
            ResponseOutcome::Unbounded => "inf".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use targex_core::{DestinationSpace, TargetSpec};

    fn target(respawns: Respawns) -> TargetSpec {
        TargetSpec {
            id: "t".into(),
            name: String::new(),
            destination_space: DestinationSpace::Player,
            speed: (0.0, 1.0),
            motion_change_period: (1.0, 1.0),
            visual_size: (0.02, 0.02),
            ecc_h: (5.0, 10.0),
            ecc_v: (1.0, 3.0),
            respawns,
            upper_hemisphere_only: false,
            log_trajectory: true,
            destinations: Vec::new(),
            jump: None,
            bounds: None,
        }
    }

    fn condition(budgets: &[Respawns]) -> Condition {
        Condition {
            name: "c".into(),
            targets: budgets.iter().copied().map(target).collect(),
            trial_count: 1,
        }
    }

    #[test]
    fn tally_sums_bounded_budgets() {
        let cond = condition(&[Respawns::Count(2), Respawns::Count(3)]);
        assert_eq!(TargetTally::for_condition(&cond), TargetTally::Exact(5));
    }

    #[test]
    fn one_infinite_target_makes_the_tally_unbounded() {
        let cond = condition(&[Respawns::Count(2), Respawns::Infinite, Respawns::Count(3)]);
        assert_eq!(TargetTally::for_condition(&cond), TargetTally::Unbounded);
    }

    #[test]
    fn full_clear_and_partial_outcomes() {
        let tally = TargetTally::Exact(5);
        assert_eq!(tally.resolve(5), ResponseOutcome::FullClear);
        assert_eq!(tally.resolve(3), ResponseOutcome::Remaining(2));
    }

    #[test]
    fn unbounded_trials_never_fully_clear() {
        let outcome = TargetTally::Unbounded.resolve(1_000);
        assert!(!outcome.is_full_clear());
        assert_eq!(outcome.row_value(), "inf");
    }

    #[test]
    #[should_panic(expected = "upstream miscount")]
    fn destroying_more_than_the_budget_panics() {
        let _ = TargetTally::Exact(2).resolve(3);
    }
}
