//! The interval state machine.
//!
//! Remaining time is always derived from a wall-clock deadline, never by
//! counting ticks, so the countdown stays correct when ticks are delayed or
//! the machine sleeps. `tick` is only a trigger to look at the clock again.

use crate::clock::Clock;
use crate::history::{HistoryStore, RETENTION_DAYS};
use crate::models::{CompletionEvent, DayCount, IntervalMode, SettingChange, Settings, TimerState};
use crate::notifications::{
    Notifier, BREAK_DONE_BODY, BREAK_DONE_TITLE, FOCUS_DONE_BODY, FOCUS_DONE_TITLE,
};
use crate::persistence::{self, KeyValueStore};
use chrono::{DateTime, Duration, Local, NaiveDate};
use log::{error, info, warn};
use std::sync::Arc;

pub struct TimerEngine {
    state: TimerState,
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    history: HistoryStore,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    /// Day that `state.completed_focus_today` describes.
    count_date: NaiveDate,
}

impl TimerEngine {
    /// Loads settings, prunes stale history and starts idle in Focus.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let settings = persistence::load_settings(store.as_ref());
        let history = HistoryStore::new(Arc::clone(&store), Arc::clone(&clock));

        match history.prune(RETENTION_DAYS) {
            Ok(removed) if removed > 0 => info!("Pruned {removed} old history entries"),
            Ok(_) => {}
            Err(e) => warn!("Failed to prune history: {e}"),
        }

        let today = clock.today();
        let completed = history.count(today);
        let state = TimerState::new(settings.duration_for(IntervalMode::Focus), completed);

        Self {
            state,
            settings,
            store,
            history,
            clock,
            notifier,
            count_date: today,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> IntervalMode {
        self.state.mode
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn completed_today(&self) -> u32 {
        self.state.completed_focus_today
    }

    /// Configured duration of `mode` in seconds.
    pub fn duration_for(&self, mode: IntervalMode) -> u32 {
        self.settings.duration_for(mode)
    }

    /// Starts (or resumes) the countdown. Does nothing if already running.
    pub fn start(&mut self) {
        if self.state.is_running() {
            return;
        }
        if self.state.remaining_secs == 0 {
            self.state.remaining_secs = self.duration_for(self.state.mode);
        }
        let deadline = self.clock.now() + Duration::seconds(self.state.remaining_secs as i64);
        self.state.deadline = Some(deadline);
    }

    /// Freezes the countdown at its current remaining time.
    ///
    /// If the deadline already passed without a tick noticing, the interval
    /// is completed first and the timer is left paused on the next one.
    pub fn pause(&mut self) -> Option<CompletionEvent> {
        let deadline = self.state.deadline.take()?;
        let remaining = self.seconds_until(deadline);
        if remaining > 0 {
            self.state.remaining_secs = remaining;
            return None;
        }

        let event = self.complete();
        self.state.deadline = None;
        Some(event)
    }

    /// Stops and rewinds the current interval to its full duration.
    pub fn reset(&mut self) {
        self.state.deadline = None;
        self.state.remaining_secs = self.duration_for(self.state.mode);
    }

    /// Stops and jumps to `mode` at its full duration.
    pub fn switch_mode(&mut self, mode: IntervalMode) {
        self.state.deadline = None;
        self.state.mode = mode;
        self.state.remaining_secs = self.duration_for(mode);
    }

    /// Stops and advances to the interval that would follow completion,
    /// without crediting the current one.
    pub fn skip_to_next(&mut self) {
        let next = self
            .state
            .mode
            .next(self.state.completed_focus_today, self.settings.long_break_interval);
        self.switch_mode(next);
    }

    /// Re-reads the clock. Returns (state_changed, optional_completion_event).
    pub fn tick(&mut self) -> (bool, Option<CompletionEvent>) {
        let Some(deadline) = self.state.deadline else {
            return (false, None);
        };

        let remaining = self.seconds_until(deadline);
        if remaining > 0 {
            let changed = remaining != self.state.remaining_secs;
            self.state.remaining_secs = remaining;
            return (changed, None);
        }

        (true, Some(self.complete()))
    }

    /// Retargets an idle timer after the duration of `mode` was edited.
    /// No-op when running or showing a different mode.
    pub fn apply_duration_change(&mut self, mode: IntervalMode) {
        if self.state.mode == mode && !self.state.is_running() {
            self.state.remaining_secs = self.duration_for(mode);
        }
    }

    /// Applies and persists a setting, then retargets the idle timer if the
    /// edited duration belongs to the current mode.
    pub fn update_setting(&mut self, change: SettingChange) {
        let applied = self.settings.apply(change);
        if let Err(e) = persistence::save_setting(self.store.as_ref(), &applied) {
            error!("Failed to save setting {}: {e}", applied.key());
        }
        info!("Setting {} = {}", applied.key(), applied.value());

        if let Some(mode) = applied.affected_mode() {
            self.apply_duration_change(mode);
        }
    }

    pub fn set_auto_start_next(&mut self, enabled: bool) {
        self.update_setting(SettingChange::AutoStartNext(enabled));
    }

    /// Resets the daily count when the calendar day has changed.
    /// Returns true if a rollover happened.
    pub fn check_day_rollover(&mut self) -> bool {
        let today = self.clock.today();
        if today == self.count_date {
            return false;
        }
        self.count_date = today;
        self.state.completed_focus_today = self.history.count(today);
        true
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn time_string(&self) -> String {
        crate::timer::format_time(self.state.remaining_secs)
    }

    /// Fraction of the current interval already elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let total = self.duration_for(self.state.mode);
        if total == 0 {
            return 1.0;
        }
        (1.0 - self.state.remaining_secs as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn recent_history(&self, days: u32) -> Vec<DayCount> {
        self.history.recent(days)
    }

    pub fn total_pomodoros(&self, days: u32) -> u32 {
        self.history.total(days)
    }

    fn seconds_until(&self, deadline: DateTime<Local>) -> u32 {
        let millis = (deadline - self.clock.now()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            // ceil to whole seconds
            ((millis + 999) / 1000) as u32
        }
    }

    fn complete(&mut self) -> CompletionEvent {
        self.state.deadline = None;
        self.state.remaining_secs = 0;

        let finished = self.state.mode;
        if finished == IntervalMode::Focus {
            // Credit the day the interval ends on, not the one it started on.
            self.check_day_rollover();
            self.state.completed_focus_today += 1;
            if let Err(e) = self.history.increment(self.count_date) {
                error!("Failed to record completed focus interval: {e}");
            }
            self.notifier
                .request_notification(FOCUS_DONE_TITLE, FOCUS_DONE_BODY);
        } else {
            self.notifier
                .request_notification(BREAK_DONE_TITLE, BREAK_DONE_BODY);
        }

        let next = finished.next(
            self.state.completed_focus_today,
            self.settings.long_break_interval,
        );
        let event = match finished {
            IntervalMode::Focus => CompletionEvent::FocusComplete {
                count: self.state.completed_focus_today,
                next,
            },
            IntervalMode::ShortBreak | IntervalMode::LongBreak => CompletionEvent::BreakComplete,
        };

        info!("{} complete, next: {}", finished.name(), next.name());
        self.state.mode = next;
        self.state.remaining_secs = self.duration_for(next);

        if self.settings.auto_start_next {
            self.start();
        }
        event
    }
}
