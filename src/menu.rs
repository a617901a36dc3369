//! Menu building and updating for the tray dropdown.

use crate::engine::TimerEngine;
use crate::models::{DayCount, IntervalMode, Settings};
use crate::timer::format_time;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::HashMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_STATS: &str = "stats";
pub const ID_START: &str = "start";
pub const ID_PAUSE: &str = "pause";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_AUTO_START_TOGGLE: &str = "auto_start_toggle";
pub const ID_LOGIN_TOGGLE: &str = "login_toggle";
pub const ID_QUIT: &str = "quit";

/// Days listed in the history submenu.
pub const HISTORY_DAYS: u32 = 7;

const FOCUS_CHOICES: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_BREAK_CHOICES: [u32; 4] = [3, 5, 10, 15];
const LONG_BREAK_CHOICES: [u32; 4] = [10, 15, 20, 30];
const INTERVAL_CHOICES: [u32; 9] = [2, 3, 4, 5, 6, 7, 8, 9, 10];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Menu item id for switching to `mode`.
pub fn mode_id(mode: IntervalMode) -> &'static str {
    match mode {
        IntervalMode::Focus => "mode_focus",
        IntervalMode::ShortBreak => "mode_short_break",
        IntervalMode::LongBreak => "mode_long_break",
    }
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub stats: MenuItem,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub mode_checks: HashMap<IntervalMode, CheckMenuItem>,
    pub history_lines: Vec<MenuItem>,
    pub auto_start_toggle: CheckMenuItem,
    pub login_toggle: CheckMenuItem,
    pub focus: ChoicePicker,
    pub short_break: ChoicePicker,
    pub long_break: ChoicePicker,
    pub interval: ChoicePicker,
}

/// A settings submenu of checkable values whose title shows the current one.
pub struct ChoicePicker {
    submenu: Submenu,
    label: &'static str,
    unit: &'static str,
    checks: HashMap<u32, CheckMenuItem>,
}

impl ChoicePicker {
    /// Builds the submenu with item ids `{prefix}_{value}`.
    fn new(
        label: &'static str,
        prefix: &str,
        unit: &'static str,
        choices: &[u32],
        current: u32,
    ) -> Result<Self, MenuError> {
        let submenu = Submenu::new(format_picker_title(label, current, unit), true);
        let mut checks = HashMap::new();
        for &value in choices {
            let item = CheckMenuItem::with_id(
                MenuId::new(format!("{}_{}", prefix, value)),
                format!("{} {}", value, unit),
                true,
                value == current,
                None::<Accelerator>,
            );
            submenu.append(&item)?;
            checks.insert(value, item);
        }
        Ok(Self {
            submenu,
            label,
            unit,
            checks,
        })
    }

    /// Retitles the submenu and moves the check mark to `current`.
    fn sync(&self, current: u32) {
        self.submenu
            .set_text(format_picker_title(self.label, current, self.unit));
        for (&value, check) in &self.checks {
            check.set_checked(value == current);
        }
    }
}

fn info_item(id: &str, text: String) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

/// Builds the complete menu structure.
pub fn build_menu(
    engine: &TimerEngine,
    launch_at_login: bool,
) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();

    // Status display (disabled, info only)
    let status = info_item(ID_STATUS, format_status(engine));
    menu.append(&status)?;
    let progress = info_item(ID_PROGRESS, format_progress(engine.progress()));
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let stats = info_item(
        ID_STATS,
        format_stats(engine.completed_today(), engine.total_pomodoros(HISTORY_DAYS)),
    );
    menu.append(&stats)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let running = engine.is_running();
    let start = MenuItem::with_id(MenuId::new(ID_START), "▶  Start", !running, None::<Accelerator>);
    let pause = MenuItem::with_id(MenuId::new(ID_PAUSE), "⏸  Pause", running, None::<Accelerator>);
    let reset = MenuItem::with_id(MenuId::new(ID_RESET), "↺  Reset", true, None::<Accelerator>);
    let skip = MenuItem::with_id(
        MenuId::new(ID_SKIP),
        "⏭  Skip to Next",
        true,
        None::<Accelerator>,
    );
    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&reset)?;
    menu.append(&skip)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let mut mode_checks = HashMap::new();
    for mode in IntervalMode::ALL {
        let item = CheckMenuItem::with_id(
            MenuId::new(mode_id(mode)),
            mode.name(),
            true,
            mode == engine.mode(),
            None::<Accelerator>,
        );
        menu.append(&item)?;
        mode_checks.insert(mode, item);
    }

    menu.append(&PredefinedMenuItem::separator())?;

    // History submenu
    let history_sub = Submenu::new(format!("Last {} Days", HISTORY_DAYS), true);
    let mut history_lines = Vec::new();
    for (i, day) in engine.recent_history(HISTORY_DAYS).iter().enumerate() {
        let item = info_item(&format!("history_{}", i), format_history_line(day));
        history_sub.append(&item)?;
        history_lines.push(item);
    }
    menu.append(&history_sub)?;

    let settings = build_settings_submenu(engine.settings(), launch_at_login)?;
    menu.append(&settings.submenu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = MenuItem::with_id(MenuId::new(ID_QUIT), "Quit Tomabar", true, None::<Accelerator>);
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        stats,
        start,
        pause,
        mode_checks,
        history_lines,
        auto_start_toggle: settings.auto_start_toggle,
        login_toggle: settings.login_toggle,
        focus: settings.focus,
        short_break: settings.short_break,
        long_break: settings.long_break,
        interval: settings.interval,
    };

    Ok((menu, items))
}

struct SettingsSubmenu {
    submenu: Submenu,
    focus: ChoicePicker,
    short_break: ChoicePicker,
    long_break: ChoicePicker,
    interval: ChoicePicker,
    auto_start_toggle: CheckMenuItem,
    login_toggle: CheckMenuItem,
}

fn build_settings_submenu(
    settings: &Settings,
    launch_at_login: bool,
) -> Result<SettingsSubmenu, MenuError> {
    let submenu = Submenu::new("⚙  Settings", true);

    let focus = ChoicePicker::new("Focus", "focus", "min", &FOCUS_CHOICES, settings.focus_mins)?;
    let short_break = ChoicePicker::new(
        "Short Break",
        "short",
        "min",
        &SHORT_BREAK_CHOICES,
        settings.short_break_mins,
    )?;
    let long_break = ChoicePicker::new(
        "Long Break",
        "long",
        "min",
        &LONG_BREAK_CHOICES,
        settings.long_break_mins,
    )?;
    let interval = ChoicePicker::new(
        "Long Break After",
        "interval",
        "focus",
        &INTERVAL_CHOICES,
        settings.long_break_interval,
    )?;
    for picker in [&focus, &short_break, &long_break, &interval] {
        submenu.append(&picker.submenu)?;
    }

    submenu.append(&PredefinedMenuItem::separator())?;

    let auto_start_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_AUTO_START_TOGGLE),
        "Auto-start Next Interval",
        true,
        settings.auto_start_next,
        None::<Accelerator>,
    );
    submenu.append(&auto_start_toggle)?;

    let login_toggle = CheckMenuItem::with_id(
        MenuId::new(ID_LOGIN_TOGGLE),
        "Launch at Login",
        true,
        launch_at_login,
        None::<Accelerator>,
    );
    submenu.append(&login_toggle)?;

    Ok(SettingsSubmenu {
        submenu,
        focus,
        short_break,
        long_break,
        interval,
        auto_start_toggle,
        login_toggle,
    })
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, engine: &TimerEngine) {
    items.status.set_text(format_status(engine));
    items.progress.set_text(format_progress(engine.progress()));
    items.stats.set_text(format_stats(
        engine.completed_today(),
        engine.total_pomodoros(HISTORY_DAYS),
    ));

    let running = engine.is_running();
    items.start.set_enabled(!running);
    items.pause.set_enabled(running);

    for (mode, check) in &items.mode_checks {
        check.set_checked(*mode == engine.mode());
    }

    let history = engine.recent_history(HISTORY_DAYS);
    for (line, day) in items.history_lines.iter().zip(history.iter()) {
        line.set_text(format_history_line(day));
    }

    let settings = engine.settings();
    items.focus.sync(settings.focus_mins);
    items.short_break.sync(settings.short_break_mins);
    items.long_break.sync(settings.long_break_mins);
    items.interval.sync(settings.long_break_interval);
    items.auto_start_toggle.set_checked(settings.auto_start_next);
}

/// Formats a settings picker title such as `Focus: 25 min`.
pub fn format_picker_title(label: &str, value: u32, unit: &str) -> String {
    format!("{}: {} {}", label, value, unit)
}

/// Formats the status line for the menu.
pub fn format_status(engine: &TimerEngine) -> String {
    let mode = engine.mode();
    let time = engine.time_string();
    if engine.is_running() {
        format!("⏱  {} - {} remaining", mode.name(), time)
    } else if engine.state().remaining_secs < engine.duration_for(mode) {
        format!("⏸  {} - {} (paused)", mode.name(), time)
    } else {
        format!("{} - {}", mode.name(), time)
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(fraction: f64) -> String {
    let pct = fraction.clamp(0.0, 1.0);
    let filled = (pct * 20.0).round() as usize;
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

fn tomatoes(count: u32) -> String {
    let mut s = "🍅".repeat(count.min(10) as usize);
    if count > 10 {
        s.push_str(&format!("+{}", count - 10));
    }
    s
}

/// Formats the daily and weekly totals for the menu.
pub fn format_stats(today: u32, week: u32) -> String {
    if today == 0 {
        format!("Today: —  0   ·   {} days: {}", HISTORY_DAYS, week)
    } else {
        format!(
            "Today: {}  {}   ·   {} days: {}",
            tomatoes(today),
            today,
            HISTORY_DAYS,
            week
        )
    }
}

/// Formats one day of the history submenu.
pub fn format_history_line(day: &DayCount) -> String {
    let label = day.date.format("%a %m-%d");
    if day.count == 0 {
        format!("{}   —", label)
    } else {
        format!("{}   {}  {}", label, tomatoes(day.count), day.count)
    }
}
