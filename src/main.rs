//! keycut daemon entry point.
//!
//! Wires the engine together: loads config and stores, starts the window
//! tracker and the hotkey listener, then runs the single-threaded event
//! loop that owns every mutation and session transition. The visual
//! surfaces (main window, search popup) are external collaborators that
//! drive this loop over stdin control commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, warn};

use keycut::config::{self, Config};
use keycut::control::{self, ControlCommand};
use keycut::error::ResultExt;
use keycut::logging;
use keycut::platform::{self, StubWindowQuery, WindowQuery};
use keycut::registry::{self, GlobalShortcutRegistry, SystemCommand};
use keycut::service::{HotkeyDraft, HotkeyService};
use keycut::session::{Opened, SessionManager};
use keycut::store::{HotkeyStore, TokenStore};
use keycut::tracker::{self, WindowContext, WindowTracker};

#[derive(Parser, Debug)]
#[command(name = "keycut", about = "Context-scoped hotkey engine", version)]
struct Cli {
    /// Data directory override (default: ~/.config/keycut)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Tracker poll interval in milliseconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Probe the foreground window once, print it, and exit
    #[arg(long)]
    once: bool,
}

/// Everything the UI-owning event loop reacts to.
enum AppEvent {
    System(SystemCommand),
    Control(ControlCommand),
    ContextRefreshed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let mut config = config::load_config(&config::default_config_path());
    apply_cli_overrides(&mut config, &cli);

    if cli.once {
        return probe_once();
    }

    run(config)
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.to_string_lossy().to_string());
    }
    if let Some(interval) = cli.poll_interval {
        config.poll_interval_ms = interval;
    }
}

/// Diagnostics: one window query, no daemon.
fn probe_once() -> Result<()> {
    let query = platform::native_query()?;
    match query.active_window() {
        Some(raw) => println!("{}", tracker::normalize_identifier(&raw)),
        None => println!("{}", keycut::matcher::UNKNOWN_WINDOW),
    }
    Ok(())
}

/// A window query failure at startup is the same as one mid-run: the
/// context just stays at "Unknown".
fn window_query_or_stub() -> Box<dyn WindowQuery + Send> {
    match platform::native_query() {
        Ok(query) => query,
        Err(e) => {
            warn!(error = %e, "Window query unavailable, context will stay Unknown");
            Box::new(StubWindowQuery::default())
        }
    }
}

fn run(config: Config) -> Result<()> {
    let mut store = HotkeyStore::with_path(config.hotkeys_path());
    store.load().log_err();

    let mut tokens = TokenStore::with_path(config.token_path());
    tokens.load().warn_on_err();
    info!(
        token_present = !tokens.token().is_empty(),
        "Token store loaded"
    );

    // No display connection means no OS shortcuts; the engine still runs
    // (store mutations, tracking, search via control commands).
    let registry = match GlobalShortcutRegistry::new(&config.shortcuts) {
        Ok(registry) => Some(Arc::new(Mutex::new(registry))),
        Err(e) => {
            warn!(error = %e, "Global shortcuts unavailable, continuing without them");
            None
        }
    };

    let (tx, rx) = async_channel::bounded::<AppEvent>(32);

    if let Some(registry) = &registry {
        registry.lock().rebuild(store.definitions());
        let forward = tx.clone();
        registry::spawn_event_pump(Arc::clone(registry), move |command| {
            if forward.try_send(AppEvent::System(command)).is_err() {
                warn!("Event queue full, dropping system command");
            }
        });
    }

    let context = tracker::shared_context();
    let window_tracker = WindowTracker::new(Duration::from_millis(config.poll_interval_ms));
    let tracker_handle = window_tracker.start(window_query_or_stub(), context.clone(), {
        let notify = tx.clone();
        move || {
            // Lossy by design: the loop only needs to know "something
            // changed", not how many times.
            let _ = notify.try_send(AppEvent::ContextRefreshed);
        }
    });

    let control_rx = control::start_stdin_listener();
    {
        let forward = tx.clone();
        std::thread::spawn(move || {
            while let Ok(command) = control_rx.recv_blocking() {
                if forward.send_blocking(AppEvent::Control(command)).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut service = HotkeyService::new(store, registry);
    let mut sessions = SessionManager::new();

    logging::status(&format!(
        "Ready | {} to search hotkeys",
        config.shortcuts.open_search
    ));

    // Single-threaded UI-owning context: all collection mutations and
    // session transitions happen here.
    while let Ok(event) = rx.recv_blocking() {
        match event {
            AppEvent::ContextRefreshed => {
                // Label refresh seam for the embedding surface
                tracing::trace!(window = %context.get(), "Context refreshed");
            }
            AppEvent::System(command) => {
                handle_system(command, &mut service, &mut sessions, &context);
            }
            AppEvent::Control(command) => {
                handle_control(command, &mut service, &mut sessions, &context);
            }
        }
    }

    window_tracker.stop();
    if let Some(handle) = tracker_handle {
        handle.join().ok();
    }
    info!("Event queue closed, shutting down");
    Ok(())
}

fn open_search(service: &HotkeyService, sessions: &mut SessionManager, context: &WindowContext) {
    let window_id = context.get();
    match sessions.open(service.definitions(), &window_id) {
        Opened::New => {
            let count = sessions
                .active_mut()
                .map(|s| s.results().len())
                .unwrap_or(0);
            info!(window = %window_id, results = count, "Search session opened");
        }
        Opened::AlreadyOpen => {
            // At most one session; the surface raises the existing one
            info!("Search session already open, raising");
        }
    }
}

fn handle_system(
    command: SystemCommand,
    service: &mut HotkeyService,
    sessions: &mut SessionManager,
    context: &WindowContext,
) {
    match command {
        SystemCommand::SaveAll => service.save_all(),
        SystemCommand::ToggleMainWindow => {
            // Window management belongs to the embedding surface
            logging::status("Toggle main window requested");
        }
        SystemCommand::OpenSearch => open_search(service, sessions, context),
    }
}

fn handle_control(
    command: ControlCommand,
    service: &mut HotkeyService,
    sessions: &mut SessionManager,
    context: &WindowContext,
) {
    match command {
        ControlCommand::OpenSearch => open_search(service, sessions, context),
        ControlCommand::SetQuery { text } => {
            if let Some(session) = sessions.active_mut() {
                session.set_query(&text);
            }
        }
        ControlCommand::MoveDown => {
            if let Some(session) = sessions.active_mut() {
                session.move_down();
            }
        }
        ControlCommand::MoveUp => {
            if let Some(session) = sessions.active_mut() {
                session.move_up();
            }
        }
        ControlCommand::Confirm => {
            if let Some(chosen) = sessions.active_mut().and_then(|s| s.confirm()) {
                service.dispatch(&chosen);
            }
        }
        ControlCommand::Select { index } => {
            if let Some(chosen) = sessions.active_mut().and_then(|s| s.select_at(index)) {
                service.dispatch(&chosen);
            }
        }
        ControlCommand::Escape => sessions.dismiss(),
        ControlCommand::Add {
            window,
            hotkey,
            description,
            action,
        } => {
            let draft = HotkeyDraft {
                window_scope: window,
                key_combo: hotkey,
                description,
                action,
            };
            if let Err(e) = service.add(draft) {
                logging::status(&e.user_message());
            }
        }
        ControlCommand::Edit {
            index,
            window,
            hotkey,
            description,
            action,
        } => {
            let draft = HotkeyDraft {
                window_scope: window,
                key_combo: hotkey,
                description,
                action,
            };
            if let Err(e) = service.edit(index, draft) {
                logging::status(&e.user_message());
            }
        }
        ControlCommand::Remove { index } => {
            if let Err(e) = service.remove(index) {
                logging::status(&e.user_message());
            }
        }
        ControlCommand::Save => service.save_all(),
        ControlCommand::CurrentWindow => {
            logging::status(&format!("Current window: {}", context.get()));
        }
    }
}
