use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, Read, Stdout},
    ops::ControlFlow,
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use quizline::{
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    context::QuizContext,
    history::HistoryStore,
    quiz::{build, Quiz},
    results::ResultsLog,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    samples,
    storage::{KeyValueStore, MemoryStore, SqliteStore},
};

const MIN_TICK_RATE_MS: u64 = 20;

/// terminal quiz runner with instant feedback, history and results tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take JSON-defined quizzes in the terminal. Five question types, instant or deferred feedback, a results breakdown and a history of the last 50 quizzes."
)]
pub struct Cli {
    /// quiz JSON file, `-` reads stdin (defaults to the last quiz entered)
    file: Option<PathBuf>,

    /// hide correctness until the end; answers are recorded as they are entered
    #[clap(short = 'e', long)]
    results_at_end: bool,

    /// take one of the bundled sample quizzes
    #[clap(short = 's', long, conflicts_with = "file")]
    sample: Option<String>,

    /// open the history screen first
    #[clap(long)]
    history: bool,

    /// validate the quiz and print a summary without starting the TUI
    #[clap(long)]
    check: bool,

    /// delete every history entry and exit
    #[clap(long)]
    clear_history: bool,

    /// list the bundled sample quizzes and exit
    #[clap(long)]
    list_samples: bool,
}

impl Cli {
    /// Quiz text named on the command line, if any
    fn explicit_input(&self) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(name) = &self.sample {
            return match samples::get(name) {
                Some(raw) => Ok(Some(raw.to_string())),
                None => {
                    let msg = format!(
                        "unknown sample `{name}` (available: {})",
                        samples::names().join(", ")
                    );
                    Cli::command().error(ErrorKind::InvalidValue, msg).exit()
                }
            };
        }

        match &self.file {
            None => Ok(None),
            Some(path) if path.as_os_str() == "-" => {
                let mut raw = String::new();
                io::stdin().read_to_string(&mut raw)?;
                Ok(Some(raw))
            }
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if cli.list_samples {
        for name in samples::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = FileConfigStore::new().load();
    if cli.results_at_end {
        config.only_show_results_at_end = true;
    }

    let explicit = cli.explicit_input()?;
    let mut context = QuizContext::new(HistoryStore::load(open_store()));
    if let Some(path) = AppDirs::results_log_path() {
        context = context.with_results_log(ResultsLog::with_path(path));
    }

    if cli.clear_history {
        context.history_mut().clear();
        println!("History cleared");
        return Ok(());
    }

    if cli.check {
        let Some(raw) = explicit.or_else(|| context.draft()) else {
            Cli::command()
                .error(ErrorKind::MissingRequiredArgument, "no quiz given and none saved")
                .exit()
        };
        match build(&raw, config.only_show_results_at_end) {
            Ok(quiz) => {
                print!("{}", summary(&quiz));
                return Ok(());
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    if !io::stdout().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdout must be a tty").exit();
    }

    let tick_rate = Duration::from_millis(config.tick_rate_ms.max(MIN_TICK_RATE_MS));
    let draft = context.draft();
    let mut app = App::new(context, config);

    match (explicit, draft) {
        (Some(raw), _) => {
            if let Err(e) = app.start_quiz(&raw) {
                Cli::command().error(ErrorKind::InvalidValue, e.to_string()).exit();
            }
        }
        (None, Some(raw)) => {
            if let Err(e) = app.start_quiz(&raw) {
                tracing::warn!(error = %e, "saved quiz no longer builds");
            }
        }
        (None, None) => {}
    }
    if cli.history || app.session().is_none() {
        app.open_history();
    }

    let mut terminal = setup_terminal()?;

    let result = start_tui(&mut terminal, &mut app, tick_rate);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Raw mode and the alternate screen, undone again if any later step fails
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Box<dyn Error>> {
    enable_raw_mode()?;
    let entered = execute!(io::stdout(), EnterAlternateScreen)
        .and_then(|_| Terminal::new(CrosstermBackend::new(io::stdout())));
    Ok(or_restore(entered, || {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })?)
}

fn or_restore<T, E>(result: Result<T, E>, restore: impl FnOnce()) -> Result<T, E> {
    if result.is_err() {
        restore();
    }
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    let mut outcome = Ok(());
    runner.run_until(None, |event| {
        match event {
            QuizEvent::Key(key) => {
                if app.on_key(key).is_break() {
                    return ControlFlow::Break(());
                }
            }
            QuizEvent::Tick(dt) => app.on_tick(dt),
            QuizEvent::Resize => {}
        }
        match terminal.draw(|f| f.render_widget(&*app, f.area())) {
            Ok(_) => ControlFlow::Continue(()),
            Err(e) => {
                outcome = Err(e);
                ControlFlow::Break(())
            }
        }
    });
    Ok(outcome?)
}

fn open_store() -> Box<dyn KeyValueStore> {
    match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "history database unavailable, keeping history in memory");
            Box::new(MemoryStore::new())
        }
    }
}

/// The terminal belongs to the TUI, so logs go to a file in the state dir
fn init_logging() {
    let Some(path) = AppDirs::log_file_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizline=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Title, question count and per-type breakdown printed by `--check`
fn summary(quiz: &Quiz) -> String {
    let mut out = format!("{}: {} questions\n", quiz.display_title(), quiz.len());
    for (kind, count) in quiz
        .questions()
        .iter()
        .map(|q| q.kind)
        .counts()
        .into_iter()
        .sorted()
    {
        out.push_str(&format!("  {kind}: {count}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["quizline"]);

        assert_eq!(cli.file, None);
        assert!(!cli.results_at_end);
        assert_eq!(cli.sample, None);
        assert!(!cli.history);
        assert!(!cli.check);
        assert!(!cli.clear_history);
        assert!(!cli.list_samples);
    }

    #[test]
    fn test_cli_file_and_flags() {
        let cli = Cli::parse_from(["quizline", "quiz.json", "-e", "--check"]);

        assert_eq!(cli.file, Some(PathBuf::from("quiz.json")));
        assert!(cli.results_at_end);
        assert!(cli.check);
    }

    #[test]
    fn test_cli_sample_conflicts_with_file() {
        let result = Cli::try_parse_from(["quizline", "quiz.json", "--sample", "rust_basics"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_input_from_sample() {
        let cli = Cli::parse_from(["quizline", "--sample", "world_capitals"]);
        let raw = cli.explicit_input().unwrap().unwrap();
        assert!(build(&raw, false).is_ok());
    }

    #[test]
    fn test_explicit_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        fs::write(&path, "{}").unwrap();
        let cli = Cli::parse_from(["quizline".into(), path.into_os_string()]);
        assert_eq!(cli.explicit_input().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_explicit_input_missing_file() {
        let cli = Cli::parse_from(["quizline", "/definitely/not/here.json"]);
        assert!(cli.explicit_input().is_err());
    }

    #[test]
    fn test_failed_terminal_setup_is_restored() {
        let mut restored = false;
        let result: Result<(), io::Error> =
            or_restore(Err(io::Error::new(io::ErrorKind::NotFound, "no tty")), || restored = true);
        assert!(result.is_err());
        assert!(restored);

        let mut restored = false;
        assert_eq!(or_restore(Ok::<_, io::Error>(7), || restored = true).unwrap(), 7);
        assert!(!restored);
    }

    #[test]
    fn test_summary_counts_kinds() {
        let quiz = build(
            r#"{"quizTitle":"Mix","quiz":[
                {"question":"a","type":"text","answer":"a"},
                {"question":"b","type":"text","answer":"b"},
                {"question":"c","type":"number","answer":1}
            ]}"#,
            false,
        )
        .unwrap();
        assert_eq!(summary(&quiz), "Mix: 3 questions\n  number: 1\n  text: 2\n");
    }
}
