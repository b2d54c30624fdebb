use std::fmt;

use quiz_core::model::QuestionId;
use services::UserAction;

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Action(UserAction),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingQuestion { command: &'static str },
    InvalidQuestion { raw: String },
    MissingAnswer,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command, or `help`"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            CommandError::MissingQuestion { command } => {
                write!(f, "{command} requires a question id")
            }
            CommandError::InvalidQuestion { raw } => write!(f, "invalid question id: {raw}"),
            CommandError::MissingAnswer => write!(f, "answer requires a value"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
Commands:
  reveal <question>          start a timed question
  answer <question> <value>  select an answer (the rest of the line is the value)
  submit                     submit your answers
  retry                      resend after a failed submission
  help                       show this list
  quit                       leave without submitting";

fn question_id(raw: Option<&str>, command: &'static str) -> Result<QuestionId, CommandError> {
    let raw = raw.ok_or(CommandError::MissingQuestion { command })?;
    raw.parse().map_err(|_| CommandError::InvalidQuestion {
        raw: raw.to_owned(),
    })
}

/// Parse one input line.
///
/// # Errors
///
/// Returns `CommandError` for blank lines, unknown verbs and malformed arguments.
pub fn parse(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim_start()));

    match verb.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "reveal" | "ok" => {
            let id = question_id(rest.split_whitespace().next(), "reveal")?;
            Ok(Input::Action(UserAction::Reveal(id)))
        }
        "answer" | "a" => {
            let (raw_id, text) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(id, text)| (id, text.trim()));
            let question_id = question_id(Some(raw_id).filter(|s| !s.is_empty()), "answer")?;
            if text.is_empty() {
                return Err(CommandError::MissingAnswer);
            }
            Ok(Input::Action(UserAction::SetAnswer {
                question_id,
                text: text.to_owned(),
            }))
        }
        "submit" => Ok(Input::Action(UserAction::Submit)),
        "retry" => Ok(Input::Action(UserAction::Retry)),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        _ => Err(CommandError::Unknown(verb.to_owned())),
    }
}
