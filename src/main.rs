mod alert;
mod app;
mod history;
mod timer;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::{
    io::{self, Write},
    time::Instant,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alert::DesktopAlert;
use app::App;
use history::StudyLog;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "🍅 relogio - A Pomodoro timer that logs every completed cycle")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the study history and exit
    History,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    // The TUI owns the terminal, so diagnostics stay off unless RUST_LOG asks
    // for them (redirect stderr to keep the screen clean).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let log = StudyLog::default();

    if let Some(Command::History) = args.command {
        return print_history(&log, &mut io::stdout().lock());
    }

    let mut app = App::new(log, DesktopAlert);

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    info!("timer ui started");
    let res = run(&mut terminal, &mut app);

    drop(terminal);
    drop(guard);
    res
}

/// Raw mode plus the alternate screen, undone on drop whatever happened in
/// between.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        report_restore([
            ("disable raw mode", disable_raw_mode()),
            ("leave alternate screen", execute!(io::stdout(), LeaveAlternateScreen)),
            ("show cursor", execute!(io::stdout(), cursor::Show)),
        ]);
    }
}

/// Logs every failed restore step and returns how many failed.
fn report_restore<const N: usize>(steps: [(&str, io::Result<()>); N]) -> usize {
    let mut failed = 0;
    for (step, result) in steps {
        if let Err(e) = result {
            warn!(step, error = %e, "terminal restore step failed");
            failed += 1;
        }
    }
    failed
}

fn print_history(log: &StudyLog, out: &mut impl Write) -> Result<()> {
    match log.read_history()? {
        Some(lines) => {
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        None => writeln!(out, "No history found in {}.", log.path().display())?,
    }
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App<DesktopAlert>) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key, Instant::now()) {
                    return Ok(());
                }
            }
        }

        app.update(Instant::now());
    }
}
