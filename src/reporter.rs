// ABOUTME: Operator-facing progress output for the setup flow
// ABOUTME: Reporter trait with a colored console writer and an in-memory recorder for tests

use std::io::{self, IsTerminal, Write};

/// Kind of progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Step,
    Info,
    Success,
    Warning,
    Error,
}

impl ReportKind {
    fn marker(self) -> &'static str {
        match self {
            ReportKind::Step => "▶",
            ReportKind::Info => "ℹ",
            ReportKind::Success => "✓",
            ReportKind::Warning => "⚠",
            ReportKind::Error => "✗",
        }
    }

    fn color(self) -> &'static str {
        match self {
            ReportKind::Step => "\x1b[1;36m",
            ReportKind::Info => "\x1b[34m",
            ReportKind::Success => "\x1b[32m",
            ReportKind::Warning => "\x1b[33m",
            ReportKind::Error => "\x1b[31m",
        }
    }
}

/// Sink for progress lines. `report` is the only required method.
pub trait Reporter {
    fn report(&mut self, kind: ReportKind, message: &str);

    fn step(&mut self, message: &str) {
        self.report(ReportKind::Step, message);
    }

    fn info(&mut self, message: &str) {
        self.report(ReportKind::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.report(ReportKind::Success, message);
    }

    fn warning(&mut self, message: &str) {
        self.report(ReportKind::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.report(ReportKind::Error, message);
    }
}

/// Writes one marked line per report, colored when the target is a terminal
pub struct ConsoleReporter<W> {
    out: W,
    color: bool,
}

/// Standard stream that carries human-facing output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Stdout,
    Stderr,
}

impl Terminal {
    /// Progress and prompts move to stderr when stdout carries the JSON report
    pub fn for_operator(json: bool) -> Self {
        if json {
            Terminal::Stderr
        } else {
            Terminal::Stdout
        }
    }

    /// The stream, and whether it is attached to a terminal
    pub fn writer(self) -> (Box<dyn Write>, bool) {
        match self {
            Terminal::Stdout => {
                let out = io::stdout();
                let tty = out.is_terminal();
                (Box::new(out), tty)
            }
            Terminal::Stderr => {
                let out = io::stderr();
                let tty = out.is_terminal();
                (Box::new(out), tty)
            }
        }
    }
}

impl ConsoleReporter<Box<dyn Write>> {
    /// Color is off when the stream is redirected or `NO_COLOR` is set.
    pub fn on(terminal: Terminal) -> Self {
        let (out, tty) = terminal.writer();
        Self::new(out, use_color(tty))
    }
}

fn use_color(is_terminal: bool) -> bool {
    is_terminal && std::env::var_os("NO_COLOR").is_none()
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, kind: ReportKind, message: &str) {
        log::debug!(target: "progress", "{:?}: {}", kind, message);

        let line = if self.color {
            format!("{}{} {}\x1b[0m", kind.color(), kind.marker(), message)
        } else {
            format!("{} {}", kind.marker(), message)
        };
        // Steps open a new block of output
        let result = if kind == ReportKind::Step {
            writeln!(self.out).and_then(|_| writeln!(self.out, "{}", line))
        } else {
            writeln!(self.out, "{}", line)
        };
        if let Err(e) = result {
            log::warn!("Failed to write progress output: {}", e);
        }
    }
}

/// Keeps every report in order, without formatting
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    entries: Vec<(ReportKind, String)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(ReportKind, String)] {
        &self.entries
    }

    /// Messages of one kind, in order
    pub fn messages(&self, kind: ReportKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// Whether any message of any kind contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|(_, m)| m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, kind: ReportKind, message: &str) {
        self.entries.push((kind, message.to_string()));
    }
}
