use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keypace::{
    app::App,
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    corpus::{Difficulty, ReferenceText, TextCorpus},
    history::{export_csv_file, HistoryLog, MemoryRecorder, ResultsRecorder, SqliteRecorder},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::filter::LevelFilter;

const REDRAW_INTERVAL_MS: u64 = 100;

/// terminal typing speed test with live wpm and accuracy
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test. Type a passage against the clock, watch your words per minute and accuracy update live, and keep a short history of recent results."
)]
pub struct Cli {
    /// number of seconds the test runs for
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    duration: Option<u32>,

    /// passage difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// custom passage to type instead of a built-in one
    #[clap(short = 'p', long)]
    passage: Option<String>,

    /// print recent results and exit
    #[clap(long)]
    history: bool,

    /// write recent results as CSV to this path and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// where to write the log (defaults to the app state directory)
    #[clap(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(long)]
    verbose: bool,
}

impl Cli {
    /// Stored preferences with command line overrides applied
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        config
    }
}

/// Install a file-backed subscriber. The terminal belongs to the TUI, so
/// nothing is logged when no file can be opened.
fn init_logging(cli: &Cli) {
    let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(_) => return,
    };

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init();
}

fn open_recorder() -> Box<dyn ResultsRecorder> {
    match SqliteRecorder::open_default() {
        Ok(recorder) => Box::new(recorder),
        Err(e) => {
            tracing::warn!(error = %e, "history database unavailable, results kept in memory");
            Box::new(MemoryRecorder::new())
        }
    }
}

fn print_history(recorder: &dyn ResultsRecorder) -> Result<(), Box<dyn Error>> {
    let results: HistoryLog = recorder.history()?.into_iter().collect();
    let now = chrono::Local::now();

    println!("{}", ui::history::summary_line(&results));
    for r in results.iter().rev() {
        println!(
            "{:>16}  {:>4} wpm  {:>3}% acc  {:>4}s  {:>5} chars  {} · {}s",
            ui::history::format_age(r.recorded_at, now),
            r.wpm,
            r.accuracy,
            r.elapsed_display_secs(),
            r.total_chars,
            r.difficulty,
            r.duration_secs,
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let recorder = open_recorder();

    if let Some(path) = &cli.export {
        export_csv_file(&recorder.history()?, path)?;
        tracing::info!(path = %path.display(), "history exported");
        return Ok(());
    }
    if cli.history {
        return print_history(recorder.as_ref());
    }

    let custom_passage = match cli.passage.as_deref().map(ReferenceText::custom).transpose() {
        Ok(passage) => passage,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    tracing::debug!(path = %store.path().display(), "config loaded");
    let corpus = TextCorpus::builtin()?;
    corpus.validate()?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(REDRAW_INTERVAL_MS)),
    );
    let mut app = App::new(
        corpus,
        config,
        custom_passage,
        recorder,
        Box::new(store),
        SystemClock,
        runner.sender(),
    )?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    tracing::info!(
        duration = app.config.duration_secs,
        difficulty = %app.config.difficulty,
        "starting"
    );
    let res = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    while !app.should_quit() {
        terminal.draw(|f| ui::draw(app, f))?;
        let event = runner.step();
        app.handle_event(event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["keypace"]);

        assert_eq!(cli.duration, None);
        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.passage, None);
        assert!(!cli.history);
        assert_eq!(cli.export, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_duration() {
        let cli = Cli::parse_from(["keypace", "-s", "30"]);
        assert_eq!(cli.duration, Some(30));

        let cli = Cli::parse_from(["keypace", "--duration", "120"]);
        assert_eq!(cli.duration, Some(120));
    }

    #[test]
    fn test_cli_rejects_zero_duration() {
        assert!(Cli::try_parse_from(["keypace", "-s", "0"]).is_err());
    }

    #[test]
    fn test_cli_difficulty() {
        let cli = Cli::parse_from(["keypace", "-d", "hard"]);
        assert_eq!(cli.difficulty, Some(Difficulty::Hard));

        assert!(Cli::try_parse_from(["keypace", "--difficulty", "extreme"]).is_err());
    }

    #[test]
    fn test_cli_custom_passage() {
        let cli = Cli::parse_from(["keypace", "-p", "hello world"]);
        assert_eq!(cli.passage, Some("hello world".to_string()));

        let cli = Cli::parse_from(["keypace", "--passage", "custom text"]);
        assert_eq!(cli.passage, Some("custom text".to_string()));
    }

    #[test]
    fn test_cli_export_and_history() {
        let cli = Cli::parse_from(["keypace", "--history", "--export", "out.csv"]);
        assert!(cli.history);
        assert_eq!(cli.export, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_cli_overrides_stored_config() {
        let stored = Config {
            duration_secs: 15,
            difficulty: Difficulty::Medium,
        };

        let cli = Cli::parse_from(["keypace", "-s", "45"]);
        let config = cli.apply_to(stored.clone());
        assert_eq!(config.duration_secs, 45);
        assert_eq!(config.difficulty, Difficulty::Medium);

        let cli = Cli::parse_from(["keypace"]);
        assert_eq!(cli.apply_to(stored.clone()), stored);
    }

    #[test]
    fn test_print_history_on_empty_recorder() {
        let recorder = MemoryRecorder::new();
        assert!(print_history(&recorder).is_ok());
    }
}
