//! Data models for the Tomabar application.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Valid range for any interval duration, in minutes.
pub const MIN_DURATION_MINS: u32 = 1;
pub const MAX_DURATION_MINS: u32 = 120;

/// Valid range for the number of focus intervals before a long break.
pub const MIN_LONG_BREAK_INTERVAL: u32 = 2;
pub const MAX_LONG_BREAK_INTERVAL: u32 = 10;

/// The kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntervalMode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl IntervalMode {
    pub const ALL: [IntervalMode; 3] = [Self::Focus, Self::ShortBreak, Self::LongBreak];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Self::Focus)
    }

    /// Selects the interval that follows this one.
    ///
    /// `completed_today` is the focus count *after* crediting the interval
    /// that just ended. From Focus a long break is due whenever that count is
    /// a positive multiple of `long_break_interval`; every break leads back to
    /// Focus.
    pub fn next(&self, completed_today: u32, long_break_interval: u32) -> IntervalMode {
        match self {
            Self::Focus => {
                if completed_today > 0 && completed_today % long_break_interval.max(1) == 0 {
                    Self::LongBreak
                } else {
                    Self::ShortBreak
                }
            }
            Self::ShortBreak | Self::LongBreak => Self::Focus,
        }
    }
}

/// User-configurable settings for the pomodoro timer.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Duration of a focus interval in minutes.
    pub focus_mins: u32,
    /// Duration of a short break in minutes.
    pub short_break_mins: u32,
    /// Duration of a long break in minutes.
    pub long_break_mins: u32,
    /// Number of completed focus intervals before a long break.
    pub long_break_interval: u32,
    /// Whether a completed interval immediately starts the next one.
    pub auto_start_next: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_mins: 25,
            short_break_mins: 5,
            long_break_mins: 15,
            long_break_interval: 4,
            auto_start_next: false,
        }
    }
}

impl Settings {
    /// Configured minutes for `mode`.
    pub fn minutes_for(&self, mode: IntervalMode) -> u32 {
        match mode {
            IntervalMode::Focus => self.focus_mins,
            IntervalMode::ShortBreak => self.short_break_mins,
            IntervalMode::LongBreak => self.long_break_mins,
        }
    }

    /// Configured duration of `mode` in seconds.
    pub fn duration_for(&self, mode: IntervalMode) -> u32 {
        self.minutes_for(mode) * 60
    }

    /// Applies a change after clamping it into range.
    /// Returns the change as actually applied.
    pub fn apply(&mut self, change: SettingChange) -> SettingChange {
        let change = change.clamped();
        match change {
            SettingChange::FocusMinutes(v) => self.focus_mins = v,
            SettingChange::ShortBreakMinutes(v) => self.short_break_mins = v,
            SettingChange::LongBreakMinutes(v) => self.long_break_mins = v,
            SettingChange::LongBreakInterval(v) => self.long_break_interval = v,
            SettingChange::AutoStartNext(v) => self.auto_start_next = v,
        }
        change
    }

    /// Returns a copy with every value forced into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            focus_mins: clamp_duration(self.focus_mins),
            short_break_mins: clamp_duration(self.short_break_mins),
            long_break_mins: clamp_duration(self.long_break_mins),
            long_break_interval: clamp_interval(self.long_break_interval),
            auto_start_next: self.auto_start_next,
        }
    }
}

pub fn clamp_duration(mins: u32) -> u32 {
    mins.clamp(MIN_DURATION_MINS, MAX_DURATION_MINS)
}

pub fn clamp_interval(count: u32) -> u32 {
    count.clamp(MIN_LONG_BREAK_INTERVAL, MAX_LONG_BREAK_INTERVAL)
}

/// A single edit to [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    FocusMinutes(u32),
    ShortBreakMinutes(u32),
    LongBreakMinutes(u32),
    LongBreakInterval(u32),
    AutoStartNext(bool),
}

impl SettingChange {
    /// Persistence key for this setting.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FocusMinutes(_) => KEY_FOCUS_MINUTES,
            Self::ShortBreakMinutes(_) => KEY_SHORT_BREAK_MINUTES,
            Self::LongBreakMinutes(_) => KEY_LONG_BREAK_MINUTES,
            Self::LongBreakInterval(_) => KEY_LONG_BREAK_INTERVAL,
            Self::AutoStartNext(_) => KEY_AUTO_START_NEXT,
        }
    }

    /// Persisted text form of the value.
    pub fn value(&self) -> String {
        match self {
            Self::FocusMinutes(v)
            | Self::ShortBreakMinutes(v)
            | Self::LongBreakMinutes(v)
            | Self::LongBreakInterval(v) => v.to_string(),
            Self::AutoStartNext(v) => v.to_string(),
        }
    }

    /// The interval whose duration this change retargets, if any.
    pub fn affected_mode(&self) -> Option<IntervalMode> {
        match self {
            Self::FocusMinutes(_) => Some(IntervalMode::Focus),
            Self::ShortBreakMinutes(_) => Some(IntervalMode::ShortBreak),
            Self::LongBreakMinutes(_) => Some(IntervalMode::LongBreak),
            Self::LongBreakInterval(_) | Self::AutoStartNext(_) => None,
        }
    }

    fn clamped(self) -> Self {
        match self {
            Self::FocusMinutes(v) => Self::FocusMinutes(clamp_duration(v)),
            Self::ShortBreakMinutes(v) => Self::ShortBreakMinutes(clamp_duration(v)),
            Self::LongBreakMinutes(v) => Self::LongBreakMinutes(clamp_duration(v)),
            Self::LongBreakInterval(v) => Self::LongBreakInterval(clamp_interval(v)),
            Self::AutoStartNext(v) => Self::AutoStartNext(v),
        }
    }
}

pub const KEY_FOCUS_MINUTES: &str = "focusMinutes";
pub const KEY_SHORT_BREAK_MINUTES: &str = "shortBreakMinutes";
pub const KEY_LONG_BREAK_MINUTES: &str = "longBreakMinutes";
pub const KEY_LONG_BREAK_INTERVAL: &str = "longBreakInterval";
pub const KEY_AUTO_START_NEXT: &str = "autoStartNext";

/// The mutable countdown session.
///
/// A countdown is running exactly when `deadline` is set; pausing takes the
/// deadline and freezes `remaining_secs`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    pub mode: IntervalMode,
    pub remaining_secs: u32,
    pub deadline: Option<DateTime<Local>>,
    /// Completed focus intervals today, mirrored from history.
    pub completed_focus_today: u32,
}

impl TimerState {
    pub fn new(remaining_secs: u32, completed_focus_today: u32) -> Self {
        Self {
            mode: IntervalMode::Focus,
            remaining_secs,
            deadline: None,
            completed_focus_today,
        }
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Raised when a running interval reaches zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionEvent {
    FocusComplete { count: u32, next: IntervalMode },
    BreakComplete,
}

/// Completed focus intervals on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

impl DayCount {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_for_each_mode() {
        let settings = Settings {
            focus_mins: 50,
            short_break_mins: 7,
            long_break_mins: 30,
            ..Settings::default()
        };
        assert_eq!(settings.duration_for(IntervalMode::Focus), 3000);
        assert_eq!(settings.duration_for(IntervalMode::ShortBreak), 420);
        assert_eq!(settings.duration_for(IntervalMode::LongBreak), 1800);
    }

    #[test]
    fn test_duration_unaffected_by_other_modes() {
        let mut settings = Settings::default();
        settings.apply(SettingChange::ShortBreakMinutes(10));
        settings.apply(SettingChange::LongBreakMinutes(45));
        assert_eq!(settings.duration_for(IntervalMode::Focus), 25 * 60);
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.focus_mins, 25);
        assert_eq!(settings.short_break_mins, 5);
        assert_eq!(settings.long_break_mins, 15);
        assert_eq!(settings.long_break_interval, 4);
        assert!(!settings.auto_start_next);
    }

    #[test]
    fn test_apply_clamps_values() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.apply(SettingChange::FocusMinutes(0)),
            SettingChange::FocusMinutes(1)
        );
        assert_eq!(
            settings.apply(SettingChange::LongBreakMinutes(500)),
            SettingChange::LongBreakMinutes(120)
        );
        assert_eq!(
            settings.apply(SettingChange::LongBreakInterval(1)),
            SettingChange::LongBreakInterval(2)
        );
        assert_eq!(settings.focus_mins, 1);
        assert_eq!(settings.long_break_mins, 120);
        assert_eq!(settings.long_break_interval, 2);
    }

    #[test]
    fn test_settings_clamped() {
        let settings = Settings {
            focus_mins: 0,
            short_break_mins: 121,
            long_break_mins: 15,
            long_break_interval: 11,
            auto_start_next: true,
        }
        .clamped();
        assert_eq!(settings.focus_mins, 1);
        assert_eq!(settings.short_break_mins, 120);
        assert_eq!(settings.long_break_mins, 15);
        assert_eq!(settings.long_break_interval, 10);
        assert!(settings.auto_start_next);
    }

    #[test]
    fn test_setting_change_keys_and_values() {
        assert_eq!(SettingChange::FocusMinutes(30).key(), "focusMinutes");
        assert_eq!(SettingChange::FocusMinutes(30).value(), "30");
        assert_eq!(SettingChange::AutoStartNext(true).key(), "autoStartNext");
        assert_eq!(SettingChange::AutoStartNext(true).value(), "true");
        assert_eq!(
            SettingChange::ShortBreakMinutes(3).affected_mode(),
            Some(IntervalMode::ShortBreak)
        );
        assert_eq!(SettingChange::LongBreakInterval(3).affected_mode(), None);
    }

    #[test]
    fn test_next_mode_from_focus() {
        assert_eq!(IntervalMode::Focus.next(1, 4), IntervalMode::ShortBreak);
        assert_eq!(IntervalMode::Focus.next(2, 4), IntervalMode::ShortBreak);
        assert_eq!(IntervalMode::Focus.next(3, 4), IntervalMode::ShortBreak);
        assert_eq!(IntervalMode::Focus.next(4, 4), IntervalMode::LongBreak);
        assert_eq!(IntervalMode::Focus.next(5, 4), IntervalMode::ShortBreak);
        assert_eq!(IntervalMode::Focus.next(8, 4), IntervalMode::LongBreak);
    }

    #[test]
    fn test_next_mode_zero_count_is_short_break() {
        assert_eq!(IntervalMode::Focus.next(0, 4), IntervalMode::ShortBreak);
    }

    #[test]
    fn test_next_mode_from_breaks() {
        assert_eq!(IntervalMode::ShortBreak.next(4, 4), IntervalMode::Focus);
        assert_eq!(IntervalMode::LongBreak.next(0, 4), IntervalMode::Focus);
    }

    #[test]
    fn test_timer_state_new_is_idle_focus() {
        let state = TimerState::new(1500, 3);
        assert_eq!(state.mode, IntervalMode::Focus);
        assert_eq!(state.remaining_secs, 1500);
        assert_eq!(state.completed_focus_today, 3);
        assert!(!state.is_running());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(IntervalMode::Focus.name(), "Focus");
        assert_eq!(IntervalMode::ShortBreak.name(), "Short Break");
        assert!(IntervalMode::LongBreak.is_break());
        assert!(!IntervalMode::Focus.is_break());
    }
}
