//! Plain-text rendering of session views and results.

use std::fmt::Write as _;

use quiz_core::model::{Attempt, Quiz, QuestionKind};
use services::{DisplaySurface, QuestionView, SessionView};

/// Prints the session whenever something other than a countdown changes, and
/// the countdowns whenever one of them reaches a ten-second mark.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    last_screen: Option<String>,
    last_timers: Option<String>,
}

impl TerminalDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySurface for TerminalDisplay {
    fn render(&mut self, view: &SessionView) {
        let screen = screen(view);
        if self.last_screen.as_deref() != Some(screen.as_str()) {
            println!("{screen}");
            self.last_screen = Some(screen);
        }

        if let Some(line) = countdown_line(view) {
            if self.last_timers.as_deref() != Some(line.as_str()) {
                println!("{line}");
                self.last_timers = Some(line);
            }
        }
    }
}

fn screen(view: &SessionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", view.title);
    for question in &view.questions {
        write_question(&mut out, question);
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Submission failed: {error}");
        if view.retry_available {
            let _ = writeln!(out, "Type `retry` to resend the same answers.");
        }
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "{notice}");
    }
    out
}

fn write_question(out: &mut String, question: &QuestionView) {
    let _ = writeln!(
        out,
        "[{}] ({} pt) {}",
        question.question_id,
        question.points,
        kind_label(question.kind)
    );
    if !question.is_visible() {
        if let Some(prompt) = &question.prompt {
            let _ = writeln!(out, "  {}", prompt.replace("\n\n", "\n  "));
        }
        let _ = writeln!(out, "  Type `reveal {}` to start.", question.question_id);
        return;
    }

    let _ = writeln!(out, "  {}", question.text);
    for choice in &question.choices {
        let mark = if question.selected.as_deref() == Some(choice.as_str()) {
            "(x)"
        } else {
            "( )"
        };
        let _ = writeln!(out, "    {mark} {choice}");
    }
    if let Some(time_up) = question.time_up {
        let _ = writeln!(out, "  {time_up}");
    }
}

fn kind_label(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::MultipleChoice => "Multiple choice",
        QuestionKind::TrueFalse => "True / False",
    }
}

/// Countdowns worth printing now: every running timer, whenever at least one
/// of them sits on a ten-second mark.
fn countdown_line(view: &SessionView) -> Option<String> {
    if !view.state.is_active() {
        return None;
    }
    let mut parts: Vec<(String, &str)> = Vec::new();
    if let Some(global) = &view.global_remaining {
        parts.push(("quiz".to_owned(), global.as_str()));
    }
    for question in &view.questions {
        if let (Some(remaining), false, true) =
            (&question.remaining, question.locked, question.is_visible())
        {
            parts.push((format!("q{}", question.question_id), remaining.as_str()));
        }
    }

    // `m:ss` ends in `0` exactly on a ten-second mark.
    if !parts.iter().any(|(_, remaining)| remaining.ends_with('0')) {
        return None;
    }
    let joined: Vec<String> = parts
        .iter()
        .map(|(label, remaining)| format!("{label} {remaining}"))
        .collect();
    Some(format!("time left: {}", joined.join(", ")))
}

/// Header block shown by `show`.
#[must_use]
pub fn quiz_info(quiz: &Quiz, remaining_attempts: Option<u32>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", quiz.title());
    if !quiz.description().is_empty() {
        let _ = writeln!(out, "{}", quiz.description());
    }
    let _ = writeln!(out, "Total marks: {}", quiz.total_mark());
    let _ = writeln!(out, "Questions: {}", quiz.questions().len());
    match quiz.attempts_allowed() {
        Some(allowed) => {
            let _ = writeln!(
                out,
                "Attempts allowed: {allowed} ({} left)",
                remaining_attempts.unwrap_or(allowed)
            );
        }
        None => {
            let _ = writeln!(out, "Attempts allowed: Open");
        }
    }
    let limit = quiz
        .time_limit()
        .map_or_else(|| "None".to_owned(), |limit| limit.label());
    let _ = write!(out, "Time limit: {limit}");
    out
}

/// Results block shown after the attempt is recorded.
#[must_use]
pub fn results(quiz: &Quiz, attempt: &Attempt) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Attempt {} for {}", attempt.id, quiz.title());
    let _ = writeln!(out, "Score: {} / {}", attempt.score, quiz.total_mark());
    for question in quiz.questions() {
        let line = match attempt.answer_for(question.id()) {
            Some(answer) => {
                let verdict = match answer.is_correct {
                    Some(true) => "correct",
                    Some(false) => "incorrect",
                    None => "ungraded",
                };
                format!("{} ({verdict})", answer.answer_text)
            }
            None => "no answer".to_owned(),
        };
        let _ = writeln!(out, "  [{}] {}: {line}", question.id(), question.text());
    }
    out
}
