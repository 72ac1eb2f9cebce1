use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Character-indexed region of the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start, other.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    /// Missing or misplaced `BEGIN CODE` / `END CODE`.
    Structure,
    /// Redeclaration or an unknown type keyword.
    Declaration,
    Runtime,
    /// The while-loop iteration cap was exceeded.
    LoopLimit,
    /// Declaration-time coercion failed; the unconverted value is kept.
    Conversion,
    /// A SCAN line did not parse as the variable's declared type.
    Input,
}

impl ErrorKind {
    /// Recoverable errors are reported and execution continues.
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::Conversion | ErrorKind::Input)
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Lex | ErrorKind::Parse | ErrorKind::Structure => 2,
            ErrorKind::Declaration => 3,
            ErrorKind::Runtime => 4,
            ErrorKind::LoopLimit => 5,
            ErrorKind::Conversion | ErrorKind::Input => 0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ErrorKind::Lex => "Lexical Error",
            ErrorKind::Parse => "Parse Error",
            ErrorKind::Structure => "Structure Error",
            ErrorKind::Declaration => "Declaration Error",
            ErrorKind::Runtime => "Runtime Error",
            ErrorKind::LoopLimit => "Possible Infinite Loop",
            ErrorKind::Conversion => "Conversion Warning",
            ErrorKind::Input => "Input Warning",
        }
    }

    fn color(self) -> Color {
        match self {
            ErrorKind::Lex => Color::Red,
            ErrorKind::Parse | ErrorKind::Structure => Color::Yellow,
            ErrorKind::Declaration => Color::Blue,
            ErrorKind::Runtime | ErrorKind::LoopLimit => Color::Magenta,
            ErrorKind::Conversion | ErrorKind::Input => Color::Cyan,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CodeError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl CodeError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Parse, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new(ErrorKind::Parse, span, message).with_help(help)
    }

    pub fn structure_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Structure, span, message)
    }

    pub fn declaration_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Declaration, span, message)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Runtime, span, message)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new(ErrorKind::Runtime, span, message).with_help(help)
    }

    pub fn loop_limit(span: Span, limit: usize) -> Self {
        Self::new(
            ErrorKind::LoopLimit,
            span,
            format!("Possible infinite loop: WHILE exceeded {} iterations", limit),
        )
        .with_help("Make sure the loop condition eventually becomes FALSE.")
    }

    pub fn conversion_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Conversion, span, message)
    }

    pub fn input_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Input, span, message)
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Render the error against `source` on stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<source>");
        let color = self.kind.color();
        let report_kind = if self.is_recoverable() {
            ReportKind::Warning
        } else {
            ReportKind::Error
        };

        let mut report_builder = Report::build(report_kind, filename, self.span.start)
            .with_message(format!("{}: {}", self.kind.label().fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..self.span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(error) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            eprintln!("{}: {} ({})", self.kind.label(), self.message, error);
        }
    }
}
