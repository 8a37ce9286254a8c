use std::time::{Duration, Instant};

use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

pub const WORK_DURATION: Duration = Duration::from_secs(25 * 60);
pub const BREAK_DURATION: Duration = Duration::from_secs(5 * 60);
pub const TICK: Duration = Duration::from_secs(1);
/// Every tick that leaves this much time or less in the phase beeps.
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(10);

// ============================================================================
// Data Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn name(&self) -> &str {
        match self {
            Self::Work => "🎯 WORK",
            Self::Break => "☕ BREAK",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::Work => WORK_DURATION,
            Self::Break => BREAK_DURATION,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining: Duration,
    pub running: bool,
    pub paused: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: Phase::Work,
            remaining: WORK_DURATION,
            running: false,
            paused: false,
        }
    }
}

impl TimerState {
    pub fn remaining_ms(&self) -> u64 {
        self.remaining.as_millis() as u64
    }

    pub fn progress_ratio(&self) -> f64 {
        let total = self.phase.duration().as_secs_f64();
        let remaining = self.remaining.as_secs_f64();
        (1.0 - (remaining / total)).clamp(0.0, 1.0)
    }
}

/// What a single tick did, for the caller to turn into side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Counted,
    Warning { remaining: Duration },
    PhaseEnded { finished: Phase, next: Phase },
}

// ============================================================================
// Timer
// ============================================================================

/// Owns the timer state and the single pending tick.
///
/// `next_tick` is `Some` exactly while the timer is running and not paused.
/// Clearing it is the cancellation, so once `pause` or `reset` returns no
/// stale tick can be observed by `advance`.
#[derive(Debug, Default)]
pub struct Timer {
    state: TimerState,
    next_tick: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Returns `false` when the timer was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state.running {
            return false;
        }
        self.state.running = true;
        self.state.paused = false;
        self.next_tick = Some(now + TICK);
        debug!(phase = ?self.state.phase, remaining_ms = self.state.remaining_ms(), "timer started");
        true
    }

    /// Only a running timer can be paused.
    pub fn pause(&mut self) -> bool {
        if !self.state.running || self.state.paused {
            return false;
        }
        self.state.paused = true;
        self.next_tick = None;
        debug!(remaining_ms = self.state.remaining_ms(), "timer paused");
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if !self.state.paused {
            return false;
        }
        self.state.paused = false;
        if self.state.running {
            self.next_tick = Some(now + TICK);
        }
        debug!(remaining_ms = self.state.remaining_ms(), "timer resumed");
        true
    }

    /// Flips between paused and running. Returns whether anything changed.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.state.paused {
            self.resume(now)
        } else {
            self.pause()
        }
    }

    pub fn reset(&mut self) {
        self.next_tick = None;
        self.state = TimerState::default();
        debug!("timer reset");
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running || self.state.paused {
            return TickOutcome::Idle;
        }

        self.state.remaining = self.state.remaining.saturating_sub(TICK);

        if self.state.remaining.is_zero() {
            self.on_phase_end()
        } else if self.state.remaining <= WARNING_THRESHOLD {
            TickOutcome::Warning { remaining: self.state.remaining }
        } else {
            TickOutcome::Counted
        }
    }

    // The next phase keeps ticking on the same cadence; nobody has to press
    // start again.
    fn on_phase_end(&mut self) -> TickOutcome {
        let finished = self.state.phase;
        let next = finished.next();
        self.state.phase = next;
        self.state.remaining = next.duration();
        debug!(?finished, ?next, "phase ended");
        TickOutcome::PhaseEnded { finished, next }
    }

    /// Runs every tick due at or before `now`, at a fixed rate.
    pub fn advance(&mut self, now: Instant) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        while let Some(due) = self.next_tick {
            if due > now {
                break;
            }
            self.next_tick = Some(due + TICK);
            outcomes.push(self.tick());
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_timer() -> (Timer, Instant) {
        let now = Instant::now();
        let mut timer = Timer::new();
        assert!(timer.start(now));
        (timer, now)
    }

    #[test]
    fn starts_in_work_with_full_duration() {
        let timer = Timer::new();
        let state = timer.state();
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.remaining_ms(), 1_500_000);
        assert!(!state.running);
        assert!(!state.paused);
        assert!(timer.next_tick().is_none());
    }

    #[test]
    fn start_is_idempotent() {
        let (mut timer, now) = running_timer();
        let scheduled = timer.next_tick();

        assert!(!timer.start(now + Duration::from_millis(700)));
        assert_eq!(timer.next_tick(), scheduled);
        assert_eq!(scheduled, Some(now + TICK));
    }

    #[test]
    fn tick_does_nothing_when_stopped() {
        let mut timer = Timer::new();
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.state().remaining, WORK_DURATION);
    }

    #[test]
    fn work_phase_ends_after_exactly_1500_ticks() {
        let (mut timer, _) = running_timer();

        for _ in 0..1499 {
            assert!(!matches!(timer.tick(), TickOutcome::PhaseEnded { .. }));
            assert_eq!(timer.state().phase, Phase::Work);
        }

        assert_eq!(
            timer.tick(),
            TickOutcome::PhaseEnded { finished: Phase::Work, next: Phase::Break }
        );
        assert_eq!(timer.state().phase, Phase::Break);
        assert_eq!(timer.state().remaining_ms(), 300_000);
        assert!(timer.state().running);
    }

    #[test]
    fn break_phase_flips_back_to_work() {
        let (mut timer, _) = running_timer();
        let ended: Vec<_> = (0..1800)
            .map(|_| timer.tick())
            .filter(|o| matches!(o, TickOutcome::PhaseEnded { .. }))
            .collect();

        assert_eq!(
            ended,
            vec![
                TickOutcome::PhaseEnded { finished: Phase::Work, next: Phase::Break },
                TickOutcome::PhaseEnded { finished: Phase::Break, next: Phase::Work },
            ]
        );
        assert_eq!(timer.state().remaining, WORK_DURATION);
    }

    #[test]
    fn warns_on_every_tick_of_the_last_ten_seconds() {
        let (mut timer, _) = running_timer();
        let warnings: Vec<u64> = (0..1500)
            .filter_map(|_| match timer.tick() {
                TickOutcome::Warning { remaining } => Some(remaining.as_secs()),
                _ => None,
            })
            .collect();

        assert_eq!(warnings, (1..=10).rev().collect::<Vec<u64>>());
    }

    #[test]
    fn remaining_never_increases_within_a_phase() {
        let (mut timer, _) = running_timer();
        let mut last = timer.state().remaining;

        for _ in 0..1499 {
            timer.tick();
            let remaining = timer.state().remaining;
            assert!(remaining <= last);
            last = remaining;
        }
    }

    #[test]
    fn paused_timer_holds_its_remaining_time() {
        let (mut timer, now) = running_timer();
        for _ in 0..42 {
            timer.tick();
        }
        let before = timer.state().clone();

        assert!(timer.pause());
        for _ in 0..10 {
            assert_eq!(timer.tick(), TickOutcome::Idle);
        }
        assert!(timer.advance(now + Duration::from_secs(3600)).is_empty());
        assert_eq!(timer.state().remaining, before.remaining);

        assert!(timer.resume(now));
        assert_eq!(timer.state(), &before);
    }

    #[test]
    fn pause_resume_round_trip_is_a_no_op() {
        let (mut timer, now) = running_timer();
        timer.tick();
        let before = timer.state().clone();

        assert!(timer.toggle_pause(now));
        assert!(timer.state().paused);
        assert!(timer.toggle_pause(now));

        assert_eq!(timer.state(), &before);
    }

    #[test]
    fn pause_requires_a_running_timer() {
        let mut timer = Timer::new();
        assert!(!timer.pause());
        assert!(!timer.state().paused);
        assert!(!timer.resume(Instant::now()));
    }

    #[test]
    fn resume_waits_a_full_tick() {
        let (mut timer, now) = running_timer();
        timer.pause();
        let later = now + Duration::from_millis(2500);

        timer.resume(later);

        assert_eq!(timer.next_tick(), Some(later + TICK));
    }

    #[test]
    fn reset_restores_the_initial_state_from_anywhere() {
        let (mut timer, now) = running_timer();
        for _ in 0..1600 {
            timer.tick();
        }
        timer.pause();
        assert_eq!(timer.state().phase, Phase::Break);

        timer.reset();

        assert_eq!(timer.state(), &TimerState::default());
        assert_eq!(timer.state().remaining_ms(), 1_500_000);
        assert!(timer.next_tick().is_none());
        assert!(timer.advance(now + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn advance_runs_only_due_ticks() {
        let (mut timer, now) = running_timer();

        assert!(timer.advance(now + Duration::from_millis(999)).is_empty());
        assert_eq!(timer.advance(now + TICK), vec![TickOutcome::Counted]);

        let outcomes = timer.advance(now + Duration::from_millis(4500));
        assert_eq!(outcomes.len(), 3);
        assert_eq!(timer.state().remaining, WORK_DURATION - Duration::from_secs(4));
        assert_eq!(timer.next_tick(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn advance_carries_over_into_the_next_phase() {
        let (mut timer, now) = running_timer();

        let outcomes = timer.advance(now + Duration::from_secs(1501));

        let ended = outcomes
            .iter()
            .filter(|o| matches!(o, TickOutcome::PhaseEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(timer.state().phase, Phase::Break);
        assert_eq!(timer.state().remaining, BREAK_DURATION - TICK);
    }

    #[test]
    fn progress_ratio_tracks_elapsed_time() {
        let (mut timer, _) = running_timer();
        assert_eq!(timer.state().progress_ratio(), 0.0);
        for _ in 0..750 {
            timer.tick();
        }
        assert!((timer.state().progress_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
