//! Tomabar - a menubar Pomodoro timer.
//!
//! Alternates focus and break intervals, counts completed focus intervals
//! per day and keeps a rolling month of history.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use log::info;
use muda::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod clock;
mod engine;
mod event;
mod history;
mod launch_agent;
mod menu;
mod models;
mod notifications;
mod persistence;
mod timer;

use clock::SystemClock;
use engine::TimerEngine;
use event::EventResult;
use menu::MenuItems;
use notifications::DesktopNotifier;
use persistence::Database;
use timer::TimerMessage;

/// Application handler for the winit event loop.
struct Tomabar {
    engine: Arc<Mutex<TimerEngine>>,
    tray: Option<TrayIcon>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
}

impl Tomabar {
    fn new(engine: Arc<Mutex<TimerEngine>>, tray: TrayIcon, timer_rx: Receiver<TimerMessage>) -> Self {
        Self {
            engine,
            tray: Some(tray),
            menu_items: None,
            timer_rx,
        }
    }

    fn set_menu_items(&mut self, items: MenuItems) {
        self.menu_items = Some(items);
    }

    fn engine(&self) -> MutexGuard<'_, TimerEngine> {
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refresh(&self) {
        let title = {
            let engine = self.engine();
            if let Some(ref items) = self.menu_items {
                menu::update_menu_items(items, &engine);
            }
            timer::format_tray_title(engine.state())
        };
        self.update_tray_title(&title);
    }

    fn update_tray_title(&self, title: &str) {
        if let Some(ref tray) = self.tray {
            tray.set_title(Some(title));
        }
    }

    fn process_timer_messages(&mut self) {
        let mut dirty = false;
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::StateChanged { title } => {
                    self.update_tray_title(&title);
                    dirty = true;
                }
                TimerMessage::Completed(event) => {
                    timer::log_completion(event);
                    dirty = true;
                }
            }
        }
        if dirty {
            self.refresh();
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        if let Ok(event) = MenuEvent::receiver().try_recv() {
            if let Some(ref items) = self.menu_items {
                let result = {
                    let mut engine = self.engine();
                    event::handle_menu_event(&mut engine, items, event)
                };

                match result {
                    EventResult::Quit => {
                        event_loop.exit();
                    }
                    EventResult::StateChanged => self.refresh(),
                    EventResult::Continue => {}
                }
            }
        }
    }
}

impl ApplicationHandler for Tomabar {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        // Process timer messages from the background thread
        self.process_timer_messages();

        // Process menu events
        self.process_menu_events(event_loop);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Opening database at {}", Database::db_path().display());
    let store = Arc::new(Database::new()?);
    let engine = TimerEngine::new(store, Arc::new(SystemClock), Box::new(DesktopNotifier));
    info!("Loaded settings: {:?}", engine.settings());
    let engine = Arc::new(Mutex::new(engine));

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = {
        let engine = engine.lock().unwrap_or_else(|e| e.into_inner());
        menu::build_menu(&engine, launch_agent::is_enabled())?
    };

    // No icon image, just the title text on macOS
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title("🍅")
        .with_tooltip("Tomabar - Pomodoro Timer")
        .build()?;

    let (tx, rx) = mpsc::channel();

    let engine_clone = Arc::clone(&engine);
    thread::spawn(move || {
        timer::run_timer_loop(engine_clone, tx);
    });

    let mut app = Tomabar::new(Arc::clone(&engine), tray, rx);
    app.set_menu_items(menu_items);

    event_loop.run_app(&mut app)?;

    Ok(())
}
