// ABOUTME: Entry point for the wayfarer terminal client
// ABOUTME: Parses CLI args and launches the TUI or runs subcommands

use std::io::Stdout;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event as TermEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use wayfarer_client::{ClientEvent, Connection};
use wayfarer_tui::app::{Action, App, Mode};
use wayfarer_tui::config::Config;
use wayfarer_tui::{send, ui};

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Terminal client for the wayfarer travel agent")]
struct Args {
    /// Server URL, e.g. ws://127.0.0.1:8000 (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// Session to resume (overrides config and saved state)
    #[arg(long)]
    session: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Send one travel request non-interactively and print the plan
    Send {
        /// The travel request to send
        message: String,
    },
}

fn main() {
    let args = Args::parse();

    let config = match Config::load(args.server.as_deref(), args.session.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Some(Command::Send { message }) => {
            wayfarer_log::init();
            if let Err(e) = rt.block_on(send::run(&config, &message)) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            wayfarer_log::init_file("tui");
            if let Err(e) = rt.block_on(run_tui(&config)) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let state_dir = Config::state_dir()?;
    let mut app = App::load(&state_dir, config.session_id.clone());

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, config, &state_dir).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Blocking reads on a dedicated thread; the terminal has no async source
fn spawn_input_reader() -> mpsc::UnboundedReceiver<TermEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "terminal input read failed");
                break;
            }
        }
    });
    rx
}

async fn next_client_event(
    events: &mut Option<mpsc::UnboundedReceiver<ClientEvent>>,
) -> Option<ClientEvent> {
    match events {
        Some(rx) => rx.recv().await,
        // No live channel, park this select arm
        None => std::future::pending().await,
    }
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    config: &Config,
    state_dir: &std::path::Path,
) -> Result<()> {
    let mut input_rx = spawn_input_reader();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    let mut connection: Option<Connection> = None;
    let mut events: Option<mpsc::UnboundedReceiver<ClientEvent>> = None;
    match Connection::open(&config.server_url, &app.session_id).await {
        Ok((conn, rx)) => {
            connection = Some(conn);
            events = Some(rx);
        }
        Err(e) => {
            app.error = Some(format!("connect failed: {}", e));
        }
    }

    loop {
        app.observe_revision();
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            maybe_input = input_rx.recv() => {
                let Some(event) = maybe_input else { break };
                let TermEvent::Key(key) = event else { continue };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key) {
                    Some(Action::Quit) => {
                        if let Err(e) = app.save(state_dir) {
                            tracing::warn!(error = %e, "failed to persist state");
                        }
                        if let Some(conn) = &connection {
                            conn.close();
                        }
                        break;
                    }
                    Some(Action::SendMessage(content)) => {
                        let sent = match &connection {
                            Some(conn) => match conn.send_request(&content) {
                                Ok(sent) => sent,
                                Err(e) => {
                                    app.error = Some(e.to_string());
                                    false
                                }
                            },
                            None => false,
                        };
                        if sent {
                            app.session.push_user_message(content);
                        } else {
                            if app.error.is_none() {
                                app.error =
                                    Some("not connected, press Ctrl+R to reconnect".to_string());
                            }
                            app.mode = Mode::Chat;
                        }
                    }
                    Some(Action::Reconnect) => {
                        // Drop the old channel first, then surface the gap so a
                        // mid-turn reconnect aborts the turn visibly
                        if let Some(conn) = connection.take() {
                            conn.close();
                        }
                        events = None;
                        app.handle_client_event(ClientEvent::Disconnected);
                        match Connection::open(&config.server_url, &app.session_id).await {
                            Ok((conn, rx)) => {
                                connection = Some(conn);
                                events = Some(rx);
                                app.error = None;
                            }
                            Err(e) => {
                                app.error = Some(format!("reconnect failed: {}", e));
                            }
                        }
                    }
                    None => {}
                }
            }
            maybe_event = next_client_event(&mut events) => {
                match maybe_event {
                    Some(event) => {
                        if app.handle_client_event(event) {
                            if let Some(conn) = &connection {
                                conn.end_turn();
                            }
                        }
                    }
                    None => {
                        events = None;
                    }
                }
            }
            _ = tick.tick() => {
                app.tick();
            }
        }
    }

    Ok(())
}
