//! Polling loop that drives the engine's clock checks.
//!
//! The loop is only a trigger. The deadline held by the engine is the source
//! of truth, so a late or skipped poll never loses time.

use crate::engine::TimerEngine;
use crate::models::{CompletionEvent, TimerState};
use log::{debug, info};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How often the engine re-reads the clock.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Message sent from the timer thread to the main thread.
#[derive(Debug, Clone)]
pub enum TimerMessage {
    /// Timer state has changed, UI needs update.
    StateChanged { title: String },
    /// A timer completed.
    Completed(CompletionEvent),
}

/// Runs the polling loop until the receiving side goes away.
///
/// Ticks take the engine lock, and a paused engine ignores ticks, so a poll
/// that lands right after `pause()` cannot move the countdown.
pub fn run_timer_loop(engine: Arc<Mutex<TimerEngine>>, tx: Sender<TimerMessage>) {
    loop {
        thread::sleep(POLL_INTERVAL);

        let messages = {
            let mut engine = engine.lock().unwrap_or_else(|e| e.into_inner());

            let rolled_over = engine.check_day_rollover();
            let (changed, completion) = engine.tick();

            let mut messages = Vec::new();
            if let Some(event) = completion {
                messages.push(TimerMessage::Completed(event));
            }
            if changed || rolled_over {
                let title = format_tray_title(engine.state());
                messages.push(TimerMessage::StateChanged { title });
            }
            messages
        };

        for msg in messages {
            if tx.send(msg).is_err() {
                debug!("Timer channel closed, stopping poll loop");
                return;
            }
        }
    }
}

/// Logs a completion, whether a poll or a late pause noticed it.
pub fn log_completion(event: CompletionEvent) {
    info!("{}", describe_completion(event));
}

/// One-line summary of a completion for the log.
pub fn describe_completion(event: CompletionEvent) -> String {
    match event {
        CompletionEvent::FocusComplete { count, next } => {
            format!("Focus interval {} done today, next: {}", count, next.name())
        }
        CompletionEvent::BreakComplete => "Break done".to_string(),
    }
}

/// Formats the tray title based on current timer state.
pub fn format_tray_title(state: &TimerState) -> String {
    if !state.is_running() {
        return "🍅".to_string();
    }
    let glyph = if state.mode.is_break() { "☕" } else { "🍅" };
    format!("{} {}", glyph, format_time(state.remaining_secs))
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntervalMode;
    use chrono::Local;

    fn running(mode: IntervalMode, remaining_secs: u32) -> TimerState {
        TimerState {
            mode,
            remaining_secs,
            deadline: Some(Local::now()),
            completed_focus_today: 0,
        }
    }

    #[test]
    fn test_format_tray_title_idle() {
        let state = TimerState::new(1500, 0);
        assert_eq!(format_tray_title(&state), "🍅");
    }

    #[test]
    fn test_format_tray_title_focus_running() {
        let state = running(IntervalMode::Focus, 1432);
        assert_eq!(format_tray_title(&state), "🍅 23:52");
    }

    #[test]
    fn test_format_tray_title_break_running() {
        let state = running(IntervalMode::ShortBreak, 272);
        assert_eq!(format_tray_title(&state), "☕ 04:32");

        let state = running(IntervalMode::LongBreak, 900);
        assert_eq!(format_tray_title(&state), "☕ 15:00");
    }

    #[test]
    fn test_describe_completion() {
        let focus = CompletionEvent::FocusComplete {
            count: 4,
            next: IntervalMode::LongBreak,
        };
        assert_eq!(
            describe_completion(focus),
            "Focus interval 4 done today, next: Long Break"
        );
        assert_eq!(describe_completion(CompletionEvent::BreakComplete), "Break done");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(60), "01:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(7200), "120:00");
    }
}
