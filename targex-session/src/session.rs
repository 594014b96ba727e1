use glam::{Vec2, Vec3};
use rand::Rng;
use targex_core::{FrameInfo, PlayerAction, PlayerActionKind, PresentationState, TargetLocation};
use targex_log::{ResultsSink, Row, TableKind};
use targex_timing::{FrameStats, SimClock, Stopwatch};

use crate::buffers::{self, DataBuffers};
use crate::config::{SessionConfig, TimingConfig};
use crate::error::ConfigError;
use crate::host::{DialogState, SessionHost, TickSignals};
use crate::ledger::TrialLedger;
use crate::response::{ResponseOutcome, TargetTally};
use crate::spawn::{self, SpawnFrame};

/// What the transition check decided for this tick. At most one event
/// fires per tick, so the session moves through at most one state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Initial → Feedback once the continue control is released.
    ContinueReleased,
    /// Ready → Task after the ready duration.
    ReadyExpired,
    /// Task → Feedback: time up, no targets left, or ammo spent.
    TaskEnded,
    /// Feedback display finished; resolve toward Ready or Scoreboard.
    FeedbackExpired,
    /// Scoreboard has been shown; finish the session.
    ScoreboardShown,
}

/// Snapshot of everything the transition function may consult.
#[derive(Copy, Clone, Debug)]
pub struct EnvSnapshot {
    pub elapsed_in_state: f64,
    pub continue_released: bool,
    pub active_targets: usize,
    pub click_count: u32,
}

/// Pure transition check: (state, elapsed, signals) → at most one event.
/// Keeping this free of side effects makes the transition table testable
/// without a live frame loop.
pub fn poll_event(
    state: PresentationState,
    env: &EnvSnapshot,
    timing: &TimingConfig,
    max_ammo: u32,
) -> Option<SessionEvent> {
    match state {
        PresentationState::Initial if env.continue_released => Some(SessionEvent::ContinueReleased),
        PresentationState::Ready if env.elapsed_in_state > f64::from(timing.ready_duration) => {
            Some(SessionEvent::ReadyExpired)
        }
        PresentationState::Task
            if env.elapsed_in_state > f64::from(timing.task_duration)
                || env.active_targets == 0
                || env.click_count >= max_ammo =>
        {
            Some(SessionEvent::TaskEnded)
        }
        PresentationState::Feedback
            if env.elapsed_in_state > f64::from(timing.feedback_duration)
                && env.active_targets == 0 =>
        {
            Some(SessionEvent::FeedbackExpired)
        }
        PresentationState::Scoreboard => Some(SessionEvent::ScoreboardShown),
        _ => None,
    }
}

/// The session orchestrator: a finite-state presentation controller
/// driven once per simulation frame by the host.
///
/// Single-threaded by contract: the host calls `on_tick` exactly once per
/// frame, never concurrently, and the session never blocks inside it.
/// All timing runs on the simulation clock built from the host's deltas.
pub struct Session<R: Rng> {
    rng: R,
    config: Option<SessionConfig>,
    sink: Option<Box<dyn ResultsSink>>,

    state: PresentationState,
    clock: SimClock,
    state_timer: Stopwatch,

    ledger: TrialLedger,
    /// Index of the currently selected condition; kept across a failed
    /// selection so exhaustion is observable, not destructive.
    current: Option<usize>,

    buffers: DataBuffers,
    spawn_frame: SpawnFrame,

    destroyed_targets: u32,
    click_count: u32,
    total_remaining_time: f64,

    task_start_time: f64,
    task_end_time: f64,
    task_execution_time: f64,

    question_idx: Option<usize>,
    feedback_message: String,
    last_fire_at: f64,
    should_advance: bool,
}

impl<R: Rng> Session<R> {
    /// An unconfigured session. Accessors return neutral sentinels until
    /// `on_init` succeeds; `on_tick` only advances the clock.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            config: None,
            sink: None,
            state: PresentationState::Initial,
            clock: SimClock::new(),
            state_timer: Stopwatch::started_at(0.0),
            ledger: TrialLedger::new(),
            current: None,
            buffers: DataBuffers::disabled(),
            spawn_frame: SpawnFrame::new(Vec3::ZERO, 0.0),
            destroyed_targets: 0,
            click_count: 0,
            total_remaining_time: 0.0,
            task_start_time: 0.0,
            task_end_time: 0.0,
            task_execution_time: 0.0,
            question_idx: None,
            feedback_message: String::new(),
            last_fire_at: f64::NEG_INFINITY,
            should_advance: false,
        }
    }

    /// (Re)initializes the session: validates the configuration, restores
    /// every ledger entry to its configured repetition count, clears the
    /// accumulators and counters, creates the results file, and selects
    /// the first condition. Nothing from a previous session leaks across
    /// this call.
    pub fn on_init(
        &mut self,
        mut config: SessionConfig,
        spawn_frame: SpawnFrame,
        mut sink: Box<dyn ResultsSink>,
        user: &str,
    ) -> Result<(), ConfigError> {
        config.validate()?;

        self.state = PresentationState::Initial;
        self.feedback_message =
            "Shoot the reference target when you are ready to begin.".to_string();
        self.clock.reset();
        self.state_timer = Stopwatch::started_at(0.0);
        self.ledger.clear();
        self.current = None;
        self.buffers = DataBuffers::new(&config.logging);
        self.spawn_frame = spawn_frame;
        self.destroyed_targets = 0;
        self.click_count = 0;
        self.total_remaining_time = 0.0;
        self.task_start_time = 0.0;
        self.task_end_time = 0.0;
        self.task_execution_time = 0.0;
        self.question_idx = None;
        self.last_fire_at = f64::NEG_INFINITY;
        self.should_advance = false;

        if config.logging.enable {
            sink.create_results_file(&config.id, user, &config.description)
                .map_err(|err| ConfigError::ResultsFile(format!("{err:#}")))?;
        }

        // Stamp per-target entity names, then hand the conditions to the
        // ledger, which owns them from here on.
        for (cond_idx, condition) in config.conditions.iter_mut().enumerate() {
            for (i, target) in condition.targets.iter_mut().enumerate() {
                target.name = format!("{}_{}_{}_{}", config.id, cond_idx, target.id, i);
            }
        }
        for condition in config.conditions.drain(..) {
            self.ledger.add_condition(condition);
        }

        if config.logging.enable {
            let rows = buffers::target_rows(self.ledger.entries());
            buffers::flush_batch(sink.as_mut(), TableKind::Targets, rows);
        }

        self.current = self.ledger.select_next(&mut self.rng);
        self.sink = Some(sink);
        self.config = Some(config);
        Ok(())
    }

    /// Advances the session by one simulation frame. `dt` is the frame
    /// delta in seconds. Performs at most one state transition, then
    /// accumulates data while the task window is open.
    pub fn on_tick(&mut self, dt: f64, signals: &TickSignals, host: &mut dyn SessionHost) {
        self.clock.advance(dt);
        if self.config.is_none() || self.state.is_terminal() {
            return;
        }

        self.update_presentation_state(signals, host);

        if self.state.is_task() {
            self.accumulate_trajectories(signals, host);
            self.accumulate_frame_info(dt);
        }
    }

    fn update_presentation_state(&mut self, signals: &TickSignals, host: &mut dyn SessionHost) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        let timing = config.timing;
        let max_ammo = config.weapon.max_ammo;

        let env = EnvSnapshot {
            elapsed_in_state: self.state_timer.elapsed(self.clock.now()),
            continue_released: signals.continue_released,
            active_targets: host.active_target_count(),
            click_count: self.click_count,
        };

        if let Some(event) = poll_event(self.state, &env, &timing, max_ammo) {
            self.apply_event(event, host);
        }
    }

    fn apply_event(&mut self, event: SessionEvent, host: &mut dyn SessionHost) {
        match event {
            SessionEvent::ContinueReleased => {
                self.enter_state(PresentationState::Feedback, host);
            }
            SessionEvent::ReadyExpired => {
                self.enter_state(PresentationState::Task, host);
            }
            SessionEvent::TaskEnded => {
                self.task_end_time = self.clock.now();
                self.process_response();
                host.clear_targets();
                self.enter_state(PresentationState::Feedback, host);
            }
            SessionEvent::FeedbackExpired => self.resolve_feedback(host),
            SessionEvent::ScoreboardShown => self.finish_session(host),
        }
    }

    /// Performs a state transition: restarts the state timer, records the
    /// task-start stamp, and re-runs target setup where the state demands
    /// it.
    fn enter_state(&mut self, next: PresentationState, host: &mut dyn SessionHost) {
        self.state_timer.restart(self.clock.now());
        if next == PresentationState::Task {
            self.task_start_time = self.clock.now();
        }
        self.state = next;
        if next.spawns_targets() {
            self.init_trial_targets(host);
        }
    }

    /// Spawns this trial's targets (Task) or the idle reference target
    /// (Feedback), and unconditionally resets the per-trial counters.
    fn init_trial_targets(&mut self, host: &mut dyn SessionHost) {
        if let Some(config) = self.config.as_ref() {
            if self.state.is_task() {
                if let Some(idx) = self.current {
                    let commands = spawn::trial_spawns(
                        &mut self.rng,
                        self.ledger.condition(idx),
                        &self.spawn_frame,
                        config.target_distance,
                        config.target_color,
                    );
                    for command in commands {
                        host.spawn_target(command);
                    }
                }
            } else {
                host.spawn_target(spawn::reference_spawn(
                    &self.spawn_frame,
                    config.target_distance,
                    &config.reference_target,
                ));
            }
        }

        self.destroyed_targets = 0;
        self.click_count = 0;
    }

    /// Scores the trial that just ended and resolves it against the
    /// ledger. The data buffers are flushed before the ledger decrement
    /// becomes observable, so downstream consumers always see the
    /// pre-decrement trial context in the recorded rows.
    fn process_response(&mut self) {
        self.task_execution_time = self.state_timer.elapsed(self.clock.now());
        let Some(idx) = self.current else {
            return;
        };

        let tally = TargetTally::for_condition(self.ledger.condition(idx));
        let outcome = tally.resolve(self.destroyed_targets);

        self.record_trial_response(idx, &outcome);

        if let Some(config) = self.config.as_ref() {
            let training = config.description == "training";
            if outcome.is_full_clear() {
                self.total_remaining_time +=
                    f64::from(config.timing.task_duration) - self.task_execution_time;
                if training {
                    self.feedback_message =
                        format!("{} ms!", (self.task_execution_time * 1000.0) as i64);
                }
            } else if training {
                self.feedback_message = "Failure!".to_string();
            }
        }

        self.ledger.decrement(idx);
    }

    /// Writes the trial row (when enabled) and flushes the accumulators
    /// for the resolved trial.
    fn record_trial_response(&mut self, idx: usize, outcome: &ResponseOutcome) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Some(config) = self.config.as_ref() {
            if config.logging.enable && config.logging.log_trial_response {
                let row: Row = vec![
                    idx.to_string(),
                    config.id.clone(),
                    config.description.clone(),
                    buffers::format_time(self.task_start_time),
                    buffers::format_time(self.task_end_time),
                    self.task_execution_time.to_string(),
                    outcome.row_value(),
                ];
                buffers::flush_batch(sink.as_mut(), TableKind::Trials, vec![row]);
            }
        }

        self.buffers.flush(sink.as_mut());
    }

    /// Feedback has run its course: line up the next trial or, once the
    /// ledger is exhausted, run the question flow and close out.
    fn resolve_feedback(&mut self, host: &mut dyn SessionHost) {
        if self.ledger.is_complete() {
            if self.questions_pending() {
                self.advance_question_flow(host);
                return;
            }
            self.close_results();
            let Some(config) = self.config.as_ref() else {
                return;
            };
            let session_id = config.id.clone();
            host.mark_session_complete(&session_id);

            let score = self.total_remaining_time as i64;
            self.feedback_message = format!("Session complete! You scored {score}!");
            let stats = self.clock.frame_stats();
            println!(
                "session {session_id} complete: score {score}, mean frame {:.2} ms ({:.1} fps)",
                stats.average_delta * 1000.0,
                stats.effective_fps
            );
            self.question_idx = None;
            self.enter_state(PresentationState::Scoreboard, host);
        } else {
            self.feedback_message.clear();
            if let Some(idx) = self.ledger.select_next(&mut self.rng) {
                self.current = Some(idx);
            }
            self.enter_state(PresentationState::Ready, host);
        }
    }

    fn questions_pending(&self) -> bool {
        let Some(config) = self.config.as_ref() else {
            return false;
        };
        match self.question_idx {
            None => !config.questions.is_empty(),
            Some(idx) => idx < config.questions.len(),
        }
    }

    /// Steps the end-of-session question flow by at most one dialog
    /// event per tick: present, wait, record an answer, or re-present a
    /// dismissed dialog.
    fn advance_question_flow(&mut self, host: &mut dyn SessionHost) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        match self.question_idx {
            None => {
                self.question_idx = Some(0);
                host.present_question(&config.questions[0]);
            }
            Some(idx) => match host.dialog_state() {
                DialogState::Open => {}
                DialogState::Answered(answer) => {
                    if config.logging.enable {
                        let row: Row =
                            vec![config.id.clone(), config.questions[idx].prompt.clone(), answer];
                        if let Some(sink) = self.sink.as_mut() {
                            buffers::flush_batch(sink.as_mut(), TableKind::Questions, vec![row]);
                        }
                    }
                    let next = idx + 1;
                    self.question_idx = Some(next);
                    if next < config.questions.len() {
                        host.present_question(&config.questions[next]);
                    }
                }
                DialogState::Dismissed => host.present_question(&config.questions[idx]),
            },
        }
    }

    fn close_results(&mut self) {
        let enabled = self.config.as_ref().is_some_and(|c| c.logging.enable);
        if enabled {
            if let Some(sink) = self.sink.as_mut() {
                if let Err(err) = sink.close_results_file() {
                    eprintln!("failed to close results file: {err:#}");
                }
            }
        }
    }

    /// Scoreboard → Complete: hand control back to the host and report
    /// whether another session remains for this user.
    fn finish_session(&mut self, host: &mut dyn SessionHost) {
        self.enter_state(PresentationState::Complete, host);
        host.open_settings();
        host.save_user_state();
        if host.remaining_sessions().is_empty() {
            self.feedback_message = "All sessions complete!".to_string();
            self.should_advance = false;
        } else {
            self.feedback_message = "Session complete!".to_string();
            self.should_advance = true;
        }
    }

    /// One trajectory record per logged target plus the passive aim
    /// sample. Positions are stored relative to the spawn origin.
    fn accumulate_trajectories(&mut self, signals: &TickSignals, host: &dyn SessionHost) {
        if self.buffers.trajectory.is_enabled() {
            let now = self.clock.now();
            for (name, position) in host.logged_targets() {
                self.buffers.trajectory.push(TargetLocation {
                    time: now,
                    name,
                    position: position - self.spawn_frame.origin,
                });
            }
        }
        self.record_player_action(
            PlayerActionKind::Aim,
            "",
            signals.view_direction,
            signals.player_position,
        );
    }

    fn accumulate_frame_info(&mut self, dt: f64) {
        self.buffers.frames.push(FrameInfo {
            time: self.clock.now(),
            sim_delta: dt as f32,
        });
    }

    /// Records a discrete player action reported by the input layer.
    pub fn record_player_action(
        &mut self,
        kind: PlayerActionKind,
        target_name: &str,
        view_direction: Vec2,
        position: Vec3,
    ) {
        if !self.buffers.actions.is_enabled() {
            return;
        }
        self.buffers.actions.push(PlayerAction {
            time: self.clock.now(),
            view_direction,
            position,
            kind,
            target_name: target_name.to_string(),
        });
    }

    /// Counts one fired shot toward the per-trial ammo limit.
    pub fn register_click(&mut self) {
        self.click_count += 1;
    }

    /// Counts a destroyed target and records the destroy action.
    pub fn register_target_destroyed(
        &mut self,
        target_name: &str,
        view_direction: Vec2,
        position: Vec3,
    ) {
        self.destroyed_targets += 1;
        self.record_player_action(
            PlayerActionKind::Destroy,
            target_name,
            view_direction,
            position,
        );
    }

    /// Rate-limits firing to one shot per configured fire period of
    /// simulated time. Granting a shot latches the fire time.
    pub fn can_fire(&mut self) -> bool {
        let Some(config) = self.config.as_ref() else {
            return true;
        };
        let now = self.clock.now();
        if now - self.last_fire_at > f64::from(config.weapon.fire_period) {
            self.last_fire_at = now;
            true
        } else {
            false
        }
    }

    /// Cooldown recovery in [0, 1]; 1.0 means ready to fire.
    pub fn weapon_cooldown_fraction(&self) -> f32 {
        let Some(config) = self.config.as_ref() else {
            return 1.0;
        };
        if config.weapon.fire_period == 0.0 {
            return 1.0;
        }
        let fraction =
            (self.clock.now() - self.last_fire_at) / f64::from(config.weapon.fire_period);
        (fraction as f32).min(1.0)
    }

    pub fn remaining_ammo(&self) -> u32 {
        match self.config.as_ref() {
            None => 100,
            Some(config) => config.weapon.max_ammo.saturating_sub(self.click_count),
        }
    }

    /// Seconds left in the current task window.
    pub fn remaining_trial_time(&self) -> f32 {
        match self.config.as_ref() {
            None => 10.0,
            Some(config) => {
                config.timing.task_duration - self.state_timer.elapsed(self.clock.now()) as f32
            }
        }
    }

    /// Fraction of conditions fully exhausted; NaN when unconfigured.
    pub fn progress(&self) -> f32 {
        if self.config.is_some() {
            self.ledger.progress()
        } else {
            f32::NAN
        }
    }

    pub fn score(&self) -> i32 {
        (10.0 * self.total_remaining_time) as i32
    }

    pub fn feedback_message(&self) -> &str {
        &self.feedback_message
    }

    pub fn presentation_state(&self) -> PresentationState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.config.is_some() && self.ledger.is_complete()
    }

    /// True at Complete when the user still has sessions to run.
    pub fn should_advance(&self) -> bool {
        self.should_advance
    }

    pub fn ledger(&self) -> &TrialLedger {
        &self.ledger
    }

    pub fn current_condition(&self) -> Option<&targex_core::Condition> {
        self.current.map(|idx| self.ledger.condition(idx))
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.clock.frame_stats()
    }
}
