//! The synchronous event loop: stdin in, timeline out.

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use client_logging::client_info;
use domainlens_core::{update, AppState, Msg};
use domainlens_engine::{ClientError, EngineConfig, EngineHandle, SessionIdentity};

use super::commands::{self, Command};
use super::effects::EffectRunner;
use super::render::Renderer;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Everything the main loop reacts to. Status and help are handled here;
/// core messages go through `update`.
pub enum AppEvent {
    Core(Msg),
    ShowStatus,
    ShowHelp,
}

pub fn run_app() -> Result<(), ClientError> {
    let base_url =
        std::env::var("DOMAINLENS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let session = SessionIdentity::generate();
    client_logging::set_session_label(session.short_label());
    client_info!("session {} against {base_url}", session.id());

    let (engine, engine_events) = EngineHandle::new(EngineConfig::new(&base_url, session))?;
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();

    let runner = EffectRunner::new(engine);
    runner.spawn_event_pump(engine_events, event_tx.clone());
    runner.bootstrap();
    spawn_input_reader(event_tx);

    let mut renderer = Renderer::new();
    renderer.print_welcome(&base_url);

    let mut state = AppState::new();
    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::ShowHelp => renderer.print_help(),
            AppEvent::ShowStatus => renderer.print_status(&state.view()),
            AppEvent::Core(msg) => {
                let quitting = matches!(msg, Msg::QuitRequested);
                let (next, effects) = update(std::mem::take(&mut state), msg);
                state = next;
                runner.enqueue(effects);
                if state.consume_dirty() {
                    renderer.render_new(&state.view());
                }
                if quitting {
                    break;
                }
            }
        }
    }
    client_info!("exiting");
    Ok(())
}

fn spawn_input_reader(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(event) = event_for(commands::parse_line(&line)) {
                if events.send(event).is_err() {
                    return;
                }
            }
        }
        // EOF on stdin ends the session.
        let _ = events.send(AppEvent::Core(Msg::QuitRequested));
    });
}

fn event_for(command: Command) -> Option<AppEvent> {
    match command {
        Command::Empty => None,
        Command::Help => Some(AppEvent::ShowHelp),
        Command::Status => Some(AppEvent::ShowStatus),
        Command::Quit => Some(AppEvent::Core(Msg::QuitRequested)),
        Command::Confirm => Some(AppEvent::Core(Msg::ConfirmSubmitted)),
        Command::Cancel => Some(AppEvent::Core(Msg::BatchCancelRequested)),
        Command::Say(text) => Some(AppEvent::Core(Msg::ChatSubmitted(text))),
        Command::Analyze(email) => Some(AppEvent::Core(Msg::EmailSubmitted(email))),
        Command::Upload(path) => match std::fs::metadata(&path) {
            Ok(metadata) => Some(AppEvent::Core(Msg::FileSubmitted {
                path,
                size_bytes: metadata.len(),
            })),
            Err(error) => {
                println!("! cannot read {path}: {error}");
                None
            }
        },
    }
}
