mod commands;
mod terminal;

use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::Quiz;
use services::{
    HttpSubmitter, HttpSubmitterConfig, QuizSessionService, QuizSubmitter, RepositorySubmitter,
    UserAction, run_session,
};
use storage::repository::Storage;
use storage::parse_quiz_json;
use tokio::sync::mpsc;

use commands::Input;
use terminal::TerminalDisplay;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingQuiz,
    InvalidAttemptsTaken { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingQuiz => write!(f, "no quiz file given (--quiz or QUIZ_FILE)"),
            ArgsError::InvalidAttemptsTaken { raw } => {
                write!(f, "invalid --attempts-taken value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take [--quiz <file>] [--submit-url <url>] [--attempts-taken <n>]");
    eprintln!("  cargo run -p app -- show [--quiz <file>] [--attempts-taken <n>]");
    eprintln!();
    eprintln!("Without --submit-url, answers are graded locally.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_FILE, QUIZ_SUBMIT_URL, QUIZ_SUBMIT_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Show,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "show" => Some(Self::Show),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    quiz_path: String,
    submit: Option<HttpSubmitterConfig>,
    attempts_taken: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut quiz_path = std::env::var("QUIZ_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut submit = HttpSubmitterConfig::from_env();
        let mut attempts_taken = 0;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--quiz" => quiz_path = Some(require_value(args, "--quiz")?),
                "--submit-url" => {
                    let value = require_value(args, "--submit-url")?;
                    let token = submit.take().and_then(|config| config.token);
                    submit = Some(HttpSubmitterConfig::new(value).with_token(token));
                }
                "--attempts-taken" => {
                    let value = require_value(args, "--attempts-taken")?;
                    attempts_taken = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidAttemptsTaken { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            quiz_path: quiz_path.ok_or(ArgsError::MissingQuiz)?,
            submit,
            attempts_taken,
        })
    }
}

/// Load the quiz into local storage and replay prior attempts.
async fn prepare_storage(
    args: &Args,
    clock: Clock,
) -> Result<(Storage, Quiz), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&args.quiz_path)?;
    let quiz = parse_quiz_json(&raw)?;

    let storage = Storage::in_memory();
    storage.quizzes.upsert_quiz(&quiz).await?;
    for _ in 0..args.attempts_taken {
        storage
            .attempts
            .record_attempt(quiz.id(), &[], clock.now())
            .await?;
    }
    log::debug!(
        "loaded quiz {} with {} questions from {}",
        quiz.id(),
        quiz.questions().len(),
        args.quiz_path
    );

    Ok((storage, quiz))
}

/// Forward stdin lines as user actions until EOF or `quit`.
///
/// Runs on a plain thread: a blocking stdin read cannot be cancelled and would
/// hold up runtime shutdown.
fn spawn_input_reader(tx: mpsc::Sender<UserAction>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match commands::parse(&line) {
                Ok(Input::Action(action)) => {
                    if tx.blocking_send(action).is_err() {
                        break;
                    }
                }
                Ok(Input::Help) => println!("{}", commands::HELP),
                Ok(Input::Quit) => break,
                Err(err) => eprintln!("{err}"),
            }
        }
    });
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means `take`.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default_clock();
    let (storage, quiz) = prepare_storage(&parsed, clock).await?;

    let submitter: Arc<dyn QuizSubmitter> = match &parsed.submit {
        Some(config) => {
            log::info!("submitting to {}", config.base_url);
            Arc::new(HttpSubmitter::new(Some(config.clone())))
        }
        None => Arc::new(RepositorySubmitter::new(
            clock,
            Arc::clone(&storage.attempts),
        )),
    };
    let service = QuizSessionService::new(
        Arc::clone(&storage.quizzes),
        Arc::clone(&storage.attempts),
        submitter,
    );

    match cmd {
        Command::Show => {
            let remaining = service.remaining_attempts(&quiz).await?;
            println!("{}", terminal::quiz_info(&quiz, remaining));
            Ok(())
        }
        Command::Take => {
            let session = service
                .start_session(quiz.id(), Box::new(TerminalDisplay::new()))
                .await?;
            println!("{}", commands::HELP);

            let (tx, rx) = mpsc::channel(16);
            spawn_input_reader(tx);

            let attempt = run_session(session, rx).await?;
            println!("{}", terminal::results(&quiz, &attempt));
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        // Binary glue: print once.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
