//! Shared error type for every phase of the MiniLang toolchain.
//!
//! The lexer, parser, semantic analyzer and interpreter all report the same
//! four kinds of failure and all stop at the first one (see the language
//! spec: no recovery, single-error reporting). Centralizing the shape here
//! keeps the fixed message formats from drifting between phases.

use span::Line;

/// One of the four fatal error categories a MiniLang run can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// Raised by the lexer when the scan-then-rollback loop empties its
  /// accepting stack without finding an accepting state.
  #[error("Lexical Error on line {line}!\nLexeme: {lexeme}\n")]
  Lexical { line: Line, lexeme: String },
  /// Raised by the parser on a grammar mismatch.
  #[error("Line {line}: {message}")]
  Syntax { line: Line, message: String },
  /// Raised by the semantic analyzer on a type or scope violation.
  #[error("Line {line}: {message}")]
  Semantic { line: Line, message: String },
  /// Raised by the interpreter; reachable only if a program that should
  /// have been rejected by the semantic analyzer slips through.
  #[error("Line {line}: {message}")]
  Runtime { line: Line, message: String },
}

impl Error {
  pub fn lexical(line: impl Into<Line>, lexeme: impl Into<String>) -> Self {
    Error::Lexical {
      line: line.into(),
      lexeme: lexeme.into(),
    }
  }

  pub fn syntax(line: impl Into<Line>, message: impl Into<String>) -> Self {
    Error::Syntax {
      line: line.into(),
      message: message.into(),
    }
  }

  pub fn semantic(line: impl Into<Line>, message: impl Into<String>) -> Self {
    Error::Semantic {
      line: line.into(),
      message: message.into(),
    }
  }

  pub fn runtime(line: impl Into<Line>, message: impl Into<String>) -> Self {
    Error::Runtime {
      line: line.into(),
      message: message.into(),
    }
  }

  pub fn line(&self) -> Line {
    match self {
      Error::Lexical { line, .. }
      | Error::Syntax { line, .. }
      | Error::Semantic { line, .. }
      | Error::Runtime { line, .. } => *line,
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
