use {failure::Fail, std::fmt};

/// A type alias of `Result<T, E>` whose error type is restricted to `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// An error which will be thrown when a URI template is malformed.
#[derive(Debug, Fail)]
pub struct Error {
    kind: ErrorKind,
    template: String,
    position: usize,
    message: String,
}

/// The stage at which a template was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected by the lexer.
    Lex,
    /// Rejected by the parser.
    Parse,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.kind {
            ErrorKind::Lex => "lexical error",
            ErrorKind::Parse => "parse error",
        };
        write!(
            f,
            "{} in URI template \"{}\" at offset {}: {}",
            stage, self.template, self.position, self.message
        )
    }
}

impl Error {
    pub(crate) fn lex(template: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Lex,
            template: template.into(),
            position,
            message: message.into(),
        }
    }

    pub(crate) fn parse(template: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            template: template.into(),
            position,
            message: message.into(),
        }
    }

    /// Returns the stage which rejected the template.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the template text which caused this error.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the 0-based character offset where the error was detected.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the description of the error, without the template.
    pub fn message(&self) -> &str {
        &self.message
    }
}
