//! Terminal worker: renders per-directory progress sent by the monitor.
//!
//! Runs as its own process (`pagewatch-tui`). It connects to the socket named
//! in `PAGEWATCH_IPC_SOCKET`, announces itself with `childReady`, then draws
//! whatever `config` and `dataFromParent` messages arrive.

mod render;
pub mod state;

use std::io::{self, BufRead, BufReader, Stdout, Write};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::json;

pub use state::{Action, TuiState};

use crate::worker::protocol::{Message, SOCKET_ENV};

/// Poll timeout for the event loop (100ms for responsive UI)
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

fn send(stream: &mut UnixStream, message: &Message) -> Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    stream.write_all(line.as_bytes()).context("Failed to write to monitor")?;
    Ok(())
}

/// Forward decoded messages from the monitor until the socket closes.
fn spawn_reader(stream: UnixStream) -> Receiver<Message> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            match serde_json::from_str::<Message>(&line) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("Ignoring malformed message: {e}"),
            }
        }
    });
    rx
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    messages: &Receiver<Message>,
    monitor: &mut UnixStream,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = TuiState::new();

    while !shutdown.load(Ordering::SeqCst) {
        loop {
            match messages.try_recv() {
                Ok(message) => state.apply(message),
                Err(TryRecvError::Empty) => break,
                // Monitor went away; nothing left to display
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        terminal.draw(|frame| render::draw(frame, &state))?;

        if !event::poll(POLL_TIMEOUT)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => state.select_next(),
            KeyCode::Enter => match state.activate() {
                Some(Action::Quit) => break,
                Some(Action::Selected(dir)) => {
                    send(monitor, &Message::Log { result: json!({ "selected": dir }) })?;
                }
                None => {}
            },
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            _ => {}
        }
    }

    // Best effort: the monitor may already be gone
    let _ = send(monitor, &Message::Log { result: json!("quit") });
    Ok(())
}

/// Entry point of the `pagewatch-tui` binary.
pub fn run() -> Result<()> {
    let socket = std::env::var(SOCKET_ENV).with_context(|| format!("{SOCKET_ENV} is not set"))?;
    let mut stream = UnixStream::connect(&socket)
        .with_context(|| format!("Failed to connect to {socket}"))?;
    let messages = spawn_reader(stream.try_clone().context("Failed to clone socket")?);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .context("Failed to install signal handler")?;
    }

    send(&mut stream, &Message::ChildReady)?;

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &messages, &mut stream, &shutdown);
    restore_terminal(&mut terminal)?;
    result
}
