//! Fatal error kinds (§7) and source locations.

use std::fmt;

/// A 1-based line/column pair pointing into the source that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl Location {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CascadeError {
    #[error("lex error at {loc}: {message}")]
    Lex { message: String, loc: Location },

    #[error("parse error at {loc}: {message}")]
    Parse { message: String, loc: Location },

    #[error("reference error at {loc}: undefined variable `{name}`")]
    Reference { name: String, loc: Location },

    #[error("type error at {loc}: {message}")]
    Type { message: String, loc: Location },

    #[error("assertion failed at {loc}: {message}")]
    Assertion { message: String, loc: Location },
}

impl CascadeError {
    pub fn lex(message: impl Into<String>, loc: Location) -> Self {
        Self::Lex { message: message.into(), loc }
    }

    pub fn parse(message: impl Into<String>, loc: Location) -> Self {
        Self::Parse { message: message.into(), loc }
    }

    pub fn reference(name: impl Into<String>, loc: Location) -> Self {
        Self::Reference { name: name.into(), loc }
    }

    pub fn type_error(message: impl Into<String>, loc: Location) -> Self {
        Self::Type { message: message.into(), loc }
    }

    pub fn assertion(message: impl Into<String>, loc: Location) -> Self {
        Self::Assertion { message: message.into(), loc }
    }
}
