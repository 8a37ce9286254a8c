use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{error, info, warn};

use crate::alert::Alert;
use crate::history::{self, StudyLog};
use crate::timer::{Phase, TickOutcome, Timer, TimerState};

pub const MIN_SCALE: u16 = 1;
pub const MAX_SCALE: u16 = 4;
pub const DEFAULT_SCALE: u16 = 2;
const REFRESH_RATE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPanel {
    pub lines: Vec<String>,
    pub today: usize,
    pub scroll: u16,
}

// ============================================================================
// Application State
// ============================================================================

pub struct App<A: Alert> {
    timer: Timer,
    log: StudyLog,
    alert: A,
    pub scale: u16,
    pub message: String,
    pub notice: Option<Notice>,
    pub history: Option<HistoryPanel>,
}

impl<A: Alert> App<A> {
    pub fn new(log: StudyLog, alert: A) -> Self {
        Self {
            timer: Timer::new(),
            log,
            alert,
            scale: DEFAULT_SCALE,
            message: String::new(),
            notice: None,
            history: None,
        }
    }

    pub fn timer(&self) -> &TimerState {
        self.timer.state()
    }

    #[cfg(test)]
    pub fn alert(&self) -> &A {
        &self.alert
    }

    /// How long the event loop may block before the next tick is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.timer
            .next_tick()
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(REFRESH_RATE)
            .min(REFRESH_RATE)
    }

    pub fn start(&mut self, now: Instant) {
        if self.timer.start(now) {
            self.message = "Timer started!".into();
        }
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        if !self.timer.toggle_pause(now) {
            self.message = "Timer is not running.".into();
        } else if self.timer.state().paused {
            self.message = "Timer paused!".into();
        } else {
            self.message = "Timer resumed!".into();
        }
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.message = "Timer reset!".into();
    }

    pub fn increase_scale(&mut self) {
        self.scale = (self.scale + 1).min(MAX_SCALE);
    }

    pub fn decrease_scale(&mut self) {
        self.scale = self.scale.saturating_sub(1).max(MIN_SCALE);
    }

    pub fn open_history(&mut self) {
        match self.log.read_history() {
            Ok(Some(lines)) => {
                let today = history::completions_on(&lines, Local::now().date_naive());
                self.history = Some(HistoryPanel { lines, today, scroll: 0 });
            }
            Ok(None) => {
                self.notice = Some(Notice {
                    title: "Study History".into(),
                    body: "No history found.".into(),
                    kind: NoticeKind::Warning,
                });
            }
            Err(e) => {
                error!(error = %e, "history read failed");
                self.notice = Some(Notice {
                    title: "Study History".into(),
                    body: e.to_string(),
                    kind: NoticeKind::Error,
                });
            }
        }
    }

    pub fn scroll_history(&mut self, down: bool) {
        if let Some(panel) = self.history.as_mut() {
            let max = u16::try_from(panel.lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
            panel.scroll = if down {
                panel.scroll.saturating_add(1).min(max)
            } else {
                panel.scroll.saturating_sub(1)
            };
        }
    }

    /// Drives the timer up to `now` and reacts to what the ticks did.
    pub fn update(&mut self, now: Instant) {
        for outcome in self.timer.advance(now) {
            match outcome {
                TickOutcome::Warning { remaining } => self.alert.warning(remaining),
                TickOutcome::PhaseEnded { finished, next } => self.on_phase_end(finished, next),
                TickOutcome::Idle | TickOutcome::Counted => {}
            }
        }
    }

    fn on_phase_end(&mut self, finished: Phase, next: Phase) {
        self.alert.phase_end(finished, next);
        self.message = match finished {
            Phase::Work => "Work cycle complete! Time for a break.".into(),
            Phase::Break => "Break over! Back to work.".into(),
        };
        info!(?finished, ?next, "cycle complete");

        // Timing wins over persistence: the timer has already moved on.
        if let Err(e) = self.log.record_completion(Local::now().naive_local()) {
            warn!(error = %e, "could not record completed cycle");
            self.alert.notice("Study history not saved", &e.to_string());
            self.notice = Some(Notice {
                title: "History not saved".into(),
                body: e.to_string(),
                kind: NoticeKind::Error,
            });
        }
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return false;
        }

        if self.history.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') => self.history = None,
                KeyCode::Down | KeyCode::Char('j') => self.scroll_history(true),
                KeyCode::Up | KeyCode::Char('k') => self.scroll_history(false),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('s') | KeyCode::Enter => self.start(now),
            KeyCode::Char(' ') | KeyCode::Char('p') => self.toggle_pause(now),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.increase_scale(),
            KeyCode::Char('-') => self.decrease_scale(),
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }

        false
    }
}
