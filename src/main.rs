mod app;
mod board;
mod cli;
mod config;
mod dialog;
mod issue;
mod keybinds;
mod logging;
mod store;
mod theme;
mod time_label;
mod ui;

use std::env;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};

use crate::app::{App, AppAction};
use crate::cli::{CliCommand, parse_args};
use crate::config::{Config, config_path};
use crate::issue::IssueId;
use crate::store::{BoardFile, board_path, delete_board, load_board, save_board};

type TuiBackend = CrosstermBackend<Stdout>;
type Tui = Terminal<TuiBackend>;

const TICK_RATE: Duration = Duration::from_millis(100);

enum AppEvent {
    BoardSaved { issue: IssueId },
    SaveFailed { issue: IssueId, message: String },
}

struct SaveJob {
    issue: IssueId,
    board: BoardFile,
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    match parse_args(&args)? {
        CliCommand::ConfigPath => {
            println!("{}", config_path().display());
            Ok(())
        }
        CliCommand::BoardReset => handle_board_reset(),
        CliCommand::Run { board } => run(board),
    }
}

fn handle_board_reset() -> Result<()> {
    if delete_board()? {
        println!("Board removed.");
        return Ok(());
    }

    println!("No saved board found.");
    Ok(())
}

fn run(board: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    logging::init(config.log_filter.as_deref())?;

    let path = board.unwrap_or_else(board_path);
    let board = load_board(&path)?;
    info!(path = %path.display(), issues = board.issues.len(), "board loaded");
    let mut app = App::new(&config, board);

    let (event_tx, event_rx) = mpsc::channel();
    let save_tx = spawn_saver(path, event_tx)?;

    let mut terminal_guard = TerminalGuard::init()?;
    run_app(terminal_guard.terminal_mut(), &mut app, &save_tx, &event_rx)
}

fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    save_tx: &Sender<SaveJob>,
    event_rx: &Receiver<AppEvent>,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        handle_events(app, event_rx);
        terminal.draw(|frame| ui::draw(frame, app))?;

        if app.should_quit() {
            return Ok(());
        }

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if !event::poll(timeout)? {
            if last_tick.elapsed() >= TICK_RATE {
                last_tick = Instant::now();
            }
            continue;
        }

        match event::read()? {
            Event::Key(key) => app.on_key(key),
            Event::Mouse(mouse) => app.on_mouse(mouse),
            _ => {}
        }

        handle_actions(app, save_tx);

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }
    }
}

fn handle_actions(app: &mut App, save_tx: &Sender<SaveJob>) {
    while let Some(action) = app.take_action() {
        match action {
            AppAction::SaveBoard { issue } => {
                let job = SaveJob {
                    issue,
                    board: app.board_snapshot(),
                };
                if save_tx.send(job).is_err() {
                    app.finish_save(issue, Err("save worker stopped".to_string()));
                }
            }
        }
    }
}

fn handle_events(app: &mut App, event_rx: &Receiver<AppEvent>) {
    while let Ok(event) = event_rx.try_recv() {
        match event {
            AppEvent::BoardSaved { issue } => app.finish_save(issue, Ok(())),
            AppEvent::SaveFailed { issue, message } => app.finish_save(issue, Err(message)),
        }
    }
}

/// Saves run one at a time, in submission order, off the UI thread.
fn spawn_saver(path: PathBuf, event_tx: Sender<AppEvent>) -> Result<Sender<SaveJob>> {
    let (job_tx, job_rx) = mpsc::channel::<SaveJob>();
    thread::Builder::new()
        .name("board-saver".to_string())
        .spawn(move || {
            while let Ok(job) = job_rx.recv() {
                let event = match save_board(&path, &job.board) {
                    Ok(()) => {
                        info!(issue = %job.issue, path = %path.display(), "board saved");
                        AppEvent::BoardSaved { issue: job.issue }
                    }
                    Err(err) => {
                        error!(issue = %job.issue, error = %format!("{:#}", err), "board save failed");
                        AppEvent::SaveFailed {
                            issue: job.issue,
                            message: format!("{:#}", err),
                        }
                    }
                };
                if event_tx.send(event).is_err() {
                    return;
                }
            }
        })
        .context("Failed to start save worker")?;
    Ok(job_tx)
}

struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    fn init() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}
