//! Menu event handling.

use crate::engine::TimerEngine;
use crate::launch_agent;
use crate::menu::{
    mode_id, MenuItems, ID_AUTO_START_TOGGLE, ID_LOGIN_TOGGLE, ID_PAUSE, ID_QUIT, ID_RESET,
    ID_SKIP, ID_START,
};
use crate::models::{IntervalMode, SettingChange};
use crate::timer::log_completion;
use log::warn;
use muda::MenuEvent;

/// Result of handling a menu event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Event handled, nothing to redraw.
    Continue,
    /// User requested quit.
    Quit,
    /// State or settings changed, menu and title need update.
    StateChanged,
}

/// Handles a menu event and updates the engine accordingly.
pub fn handle_menu_event(
    engine: &mut TimerEngine,
    items: &MenuItems,
    event: MenuEvent,
) -> EventResult {
    let id = event.id().as_ref();

    match id {
        ID_START => {
            engine.start();
            EventResult::StateChanged
        }
        ID_PAUSE => {
            // The deadline may have passed before the next poll noticed.
            if let Some(done) = engine.pause() {
                log_completion(done);
            }
            EventResult::StateChanged
        }
        ID_RESET => {
            engine.reset();
            EventResult::StateChanged
        }
        ID_SKIP => {
            engine.skip_to_next();
            EventResult::StateChanged
        }
        ID_AUTO_START_TOGGLE => {
            let enabled = !engine.settings().auto_start_next;
            engine.set_auto_start_next(enabled);
            EventResult::StateChanged
        }
        ID_LOGIN_TOGGLE => {
            toggle_launch_at_login(items);
            EventResult::Continue
        }
        ID_QUIT => EventResult::Quit,
        _ => {
            if let Some(mode) = parse_mode_id(id) {
                engine.switch_mode(mode);
                return EventResult::StateChanged;
            }
            if let Some(change) = parse_setting_id(id) {
                engine.update_setting(change);
                return EventResult::StateChanged;
            }
            EventResult::Continue
        }
    }
}

fn toggle_launch_at_login(items: &MenuItems) {
    let wanted = !launch_agent::is_enabled();
    if let Err(e) = launch_agent::set_enabled(wanted) {
        warn!("Failed to update launch at login: {}", e);
    }
    // Reflect what the OS actually has, not what was requested.
    items.login_toggle.set_checked(launch_agent::is_enabled());
}

fn parse_mode_id(id: &str) -> Option<IntervalMode> {
    IntervalMode::ALL.into_iter().find(|mode| mode_id(*mode) == id)
}

/// Maps a settings picker id such as `focus_30` to its change.
fn parse_setting_id(id: &str) -> Option<SettingChange> {
    let (prefix, value) = id.rsplit_once('_')?;
    let value: u32 = value.parse().ok()?;
    match prefix {
        "focus" => Some(SettingChange::FocusMinutes(value)),
        "short" => Some(SettingChange::ShortBreakMinutes(value)),
        "long" => Some(SettingChange::LongBreakMinutes(value)),
        "interval" => Some(SettingChange::LongBreakInterval(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    // Dispatch itself needs live menu items; the id parsing is tested here
    // and the engine operations in the engine module.
    use super::*;

    #[test]
    fn test_parse_setting_id() {
        assert_eq!(
            parse_setting_id("focus_30"),
            Some(SettingChange::FocusMinutes(30))
        );
        assert_eq!(
            parse_setting_id("short_5"),
            Some(SettingChange::ShortBreakMinutes(5))
        );
        assert_eq!(
            parse_setting_id("long_20"),
            Some(SettingChange::LongBreakMinutes(20))
        );
        assert_eq!(
            parse_setting_id("interval_4"),
            Some(SettingChange::LongBreakInterval(4))
        );
        assert_eq!(parse_setting_id("history_3"), None);
        assert_eq!(parse_setting_id("focus_abc"), None);
        assert_eq!(parse_setting_id("quit"), None);
    }

    #[test]
    fn test_parse_mode_id() {
        assert_eq!(parse_mode_id("mode_focus"), Some(IntervalMode::Focus));
        assert_eq!(parse_mode_id("mode_long_break"), Some(IntervalMode::LongBreak));
        assert_eq!(parse_mode_id("mode_nap"), None);
    }
}
