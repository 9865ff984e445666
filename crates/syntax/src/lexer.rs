//! A table-driven lexical analyzer.
//!
//! The lexer is a deterministic finite-state automaton: [`State`] is the
//! automaton's state set, [`CharClass`] partitions the input alphabet into
//! the columns of the transition table, and [`State::step`] *is* the
//! table — a pure function of `(state, class)` to the next state, which is
//! the idiomatic way to express a small dense transition matrix without
//! hand-maintaining a 2D array of magic numbers.
//!
//! Tokenizing a single token always overshoots: the scanner reads past the
//! longest accepting prefix until it hits a dead state or end of input,
//! pushing every state it passed through onto an "accepting stack" (cleared
//! each time a *new* accepting state is reached, so it only ever remembers
//! the steps back to the most recent one). It then rolls that stack back
//! until it lands on an accepting state again. This guarantees maximal
//! munch: whatever the automaton accepts is the longest prefix it could
//! possibly accept.

use diag::{Error, Result};
use span::Line;

use crate::token::{Token, TokenKind};

/// The alphabet the automaton reads over. Every punctuation/operator
/// character gets its own class, exactly as the table needs to
/// distinguish e.g. `<` from `>` at the very first transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
  Newline,
  Space,
  Digit,
  Letter,
  Underscore,
  Quote,
  Plus,
  Minus,
  Star,
  Slash,
  Lt,
  Gt,
  Eq,
  Bang,
  Comma,
  Dot,
  Colon,
  Semicolon,
  LParen,
  RParen,
  LBrace,
  RBrace,
  Other,
  Unknown,
}

fn classify(c: char) -> CharClass {
  match c {
    '\n' => CharClass::Newline,
    c if c.is_whitespace() => CharClass::Space,
    c if c.is_ascii_digit() => CharClass::Digit,
    '+' => CharClass::Plus,
    '-' => CharClass::Minus,
    '*' => CharClass::Star,
    '/' => CharClass::Slash,
    '<' => CharClass::Lt,
    '>' => CharClass::Gt,
    '=' => CharClass::Eq,
    '!' => CharClass::Bang,
    ',' => CharClass::Comma,
    '.' => CharClass::Dot,
    '_' => CharClass::Underscore,
    '"' => CharClass::Quote,
    ':' => CharClass::Colon,
    ';' => CharClass::Semicolon,
    '(' => CharClass::LParen,
    ')' => CharClass::RParen,
    '{' => CharClass::LBrace,
    '}' => CharClass::RBrace,
    c if c.is_alphabetic() => CharClass::Letter,
    c if !c.is_control() => CharClass::Other,
    _ => CharClass::Unknown,
  }
}

/// What arriving in a state means, if anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Accept {
  /// Not a valid stopping point.
  Reject,
  /// A run of whitespace; dropped, never reaches the parser.
  Whitespace,
  /// A line or block comment; dropped, never reaches the parser.
  Comment,
  /// A real token of this kind.
  Token(TokenKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Start,
  Space,
  Int,
  IntDot,
  Float,
  StrBody,
  Str,
  Ident,
  Plus,
  Minus,
  Star,
  SlashTok,
  LineComment,
  LineCommentDone,
  BlockComment,
  BlockCommentStar,
  BlockCommentDone,
  Lt,
  LtEq,
  Gt,
  GtEq,
  EqTok,
  EqEqTok,
  Bang,
  BangEq,
  Comma,
  PunctDot,
  Colon,
  Semicolon,
  LParen,
  RParen,
  LBrace,
  RBrace,
  /// The dead state. Every undefined transition lands here.
  Dead,
}

impl State {
  /// What kind of token (if any) this state represents, equivalent to an
  /// `accepting[state]` lookup table.
  fn accept(self) -> Accept {
    use Accept::*;
    use State::*;
    match self {
      Start | IntDot | StrBody | BlockComment | BlockCommentStar | Bang | Dead => Reject,
      Space => Whitespace,
      LineComment | LineCommentDone | BlockCommentDone => Comment,
      Int => Token(TokenKind::IntLiteral),
      Float => Token(TokenKind::FloatLiteral),
      Str => Token(TokenKind::StringLiteral),
      Ident => Token(TokenKind::Identifier),
      Plus => Token(TokenKind::Plus),
      Minus => Token(TokenKind::Minus),
      Star => Token(TokenKind::Star),
      SlashTok => Token(TokenKind::Slash),
      Lt => Token(TokenKind::Lt),
      LtEq => Token(TokenKind::Le),
      Gt => Token(TokenKind::Gt),
      GtEq => Token(TokenKind::Ge),
      EqTok => Token(TokenKind::Eq),
      EqEqTok => Token(TokenKind::EqEq),
      BangEq => Token(TokenKind::NotEq),
      Comma => Token(TokenKind::Comma),
      PunctDot => Token(TokenKind::Dot),
      Colon => Token(TokenKind::Colon),
      Semicolon => Token(TokenKind::Semicolon),
      LParen => Token(TokenKind::LParen),
      RParen => Token(TokenKind::RParen),
      LBrace => Token(TokenKind::LBrace),
      RBrace => Token(TokenKind::RBrace),
    }
  }

  /// The transition table (`delta[state][class]`), expressed as a
  /// function instead of a literal matrix.
  fn step(self, class: CharClass) -> State {
    use CharClass as C;
    use State::*;
    match (self, class) {
      (Start, C::Newline | C::Space) => Space,
      (Start, C::Digit) => Int,
      (Start, C::Letter | C::Underscore) => Ident,
      (Start, C::Quote) => StrBody,
      (Start, C::Plus) => Plus,
      (Start, C::Minus) => Minus,
      (Start, C::Star) => Star,
      (Start, C::Slash) => SlashTok,
      (Start, C::Lt) => Lt,
      (Start, C::Gt) => Gt,
      (Start, C::Eq) => EqTok,
      (Start, C::Bang) => Bang,
      (Start, C::Comma) => Comma,
      (Start, C::Dot) => PunctDot,
      (Start, C::Colon) => Colon,
      (Start, C::Semicolon) => Semicolon,
      (Start, C::LParen) => LParen,
      (Start, C::RParen) => RParen,
      (Start, C::LBrace) => LBrace,
      (Start, C::RBrace) => RBrace,

      (Space, C::Newline | C::Space) => Space,

      (Int, C::Digit) => Int,
      (Int, C::Dot) => IntDot,
      (IntDot, C::Digit) => Float,
      (Float, C::Digit) => Float,

      (Ident, C::Letter | C::Digit | C::Underscore) => Ident,

      (StrBody, C::Quote) => Str,
      (StrBody, _) => StrBody,

      (SlashTok, C::Slash) => LineComment,
      (SlashTok, C::Star) => BlockComment,
      (LineComment, C::Newline) => LineCommentDone,
      (LineComment, _) => LineComment,

      (BlockComment, C::Star) => BlockCommentStar,
      (BlockComment, _) => BlockComment,
      (BlockCommentStar, C::Slash) => BlockCommentDone,
      (BlockCommentStar, C::Star) => BlockCommentStar,
      (BlockCommentStar, _) => BlockComment,

      (Lt, C::Eq) => LtEq,
      (Gt, C::Eq) => GtEq,
      (EqTok, C::Eq) => EqEqTok,
      (Bang, C::Eq) => BangEq,

      _ => Dead,
    }
  }
}

/// The reserved-word table: identifiers that double as keywords.
fn reserved_word(lexeme: &str) -> Option<TokenKind> {
  TokenKind::keyword(lexeme)
}

/// Streams a source string into tokens, one at a time.
pub struct Lexer<'src> {
  chars: Vec<char>,
  pos: usize,
  line: u32,
}

impl<'src> Lexer<'src> {
  pub fn new(src: &'src str) -> Self {
    Lexer {
      chars: src.chars().collect(),
      pos: 0,
      line: 1,
    }
  }

  fn peek(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  /// Scans and returns the next real token, silently consuming whitespace
  /// and comments along the way. Returns `TokenKind::End` once the input
  /// is exhausted.
  pub fn next_token(&mut self) -> Result<Token> {
    loop {
      if self.pos >= self.chars.len() {
        return Ok(Token::new(TokenKind::End, Line::new(self.line)));
      }

      let start_line = self.line;
      let (accept, lexeme, consumed) = self.scan_one()?;

      self.pos += consumed;
      self.line += lexeme.matches('\n').count() as u32;

      match accept {
        Accept::Whitespace | Accept::Comment => continue,
        Accept::Token(TokenKind::Identifier) => {
          return Ok(match reserved_word(&lexeme) {
            Some(kind) => Token::new(kind, Line::new(start_line)),
            None => Token::with_lexeme(TokenKind::Identifier, Line::new(start_line), lexeme),
          });
        }
        Accept::Token(kind @ (TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::StringLiteral)) => {
          return Ok(Token::with_lexeme(kind, Line::new(start_line), lexeme));
        }
        Accept::Token(kind) => return Ok(Token::new(kind, Line::new(start_line))),
        Accept::Reject => unreachable!("scan_one never returns Reject"),
      }
    }
  }

  /// Runs the scan-then-rollback loop once and returns the accepted kind,
  /// the lexeme text, and how many characters were consumed. Fails with a
  /// lexical error if the accepting stack empties before a match is found.
  fn scan_one(&mut self) -> Result<(Accept, String, usize)> {
    let mut state = State::Start;
    let mut lexeme = String::new();
    // Mirrors the "bad state" sentinel pushed before scanning begins: an
    // empty stack means rollback has nowhere left to go.
    let mut stack: Vec<State> = Vec::new();
    let mut i = 0usize;

    while state != State::Dead {
      let Some(c) = self.peek(i) else { break };

      if state.accept() != Accept::Reject {
        stack.clear();
      }
      stack.push(state);

      state = state.step(classify(c));
      lexeme.push(c);
      i += 1;
    }

    let error_lexeme = lexeme.clone();

    while state.accept() == Accept::Reject {
      match stack.pop() {
        Some(prev) => {
          state = prev;
          lexeme.pop();
        }
        None => {
          return Err(Error::lexical(Line::new(self.line), error_lexeme));
        }
      }
    }

    let consumed = lexeme.chars().count();
    Ok((state.accept(), lexeme, consumed))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(src);
    let mut out = vec![];
    loop {
      let tok = lexer.next_token().unwrap();
      if tok.kind == TokenKind::End {
        break;
      }
      out.push(tok.kind);
    }
    out
  }

  #[test]
  fn keywords_and_identifiers() {
    assert_eq!(kinds("let x int"), vec![TokenKind::Let, TokenKind::Identifier, TokenKind::Int]);
  }

  #[test]
  fn maximal_munch_relational_operators() {
    assert_eq!(kinds("< <= > >= == !="), vec![
      TokenKind::Lt,
      TokenKind::Le,
      TokenKind::Gt,
      TokenKind::Ge,
      TokenKind::EqEq,
      TokenKind::NotEq,
    ]);
  }

  #[test]
  fn integer_then_float() {
    let mut lexer = Lexer::new("3 3.5 3.");
    let a = lexer.next_token().unwrap();
    assert_eq!(a.kind, TokenKind::IntLiteral);
    assert_eq!(a.text(), Some("3"));

    let b = lexer.next_token().unwrap();
    assert_eq!(b.kind, TokenKind::FloatLiteral);
    assert_eq!(b.text(), Some("3.5"));

    // "3." rolls back the dangling dot: an int literal, then a lone dot.
    let c = lexer.next_token().unwrap();
    assert_eq!(c.kind, TokenKind::IntLiteral);
    assert_eq!(c.text(), Some("3"));
    let d = lexer.next_token().unwrap();
    assert_eq!(d.kind, TokenKind::Dot);
  }

  #[test]
  fn string_literal_keeps_its_quotes() {
    let mut lexer = Lexer::new(r#""hello world""#);
    let tok = lexer.next_token().unwrap();
    assert_eq!(tok.kind, TokenKind::StringLiteral);
    assert_eq!(tok.text(), Some(r#""hello world""#));
  }

  #[test]
  fn line_and_block_comments_are_dropped() {
    assert_eq!(kinds("1 // trailing comment\n2"), vec![TokenKind::IntLiteral, TokenKind::IntLiteral]);
    assert_eq!(kinds("1 /* spans\nlines */ 2"), vec![TokenKind::IntLiteral, TokenKind::IntLiteral]);
  }

  #[test]
  fn lone_bang_is_a_lexical_error() {
    let mut lexer = Lexer::new("!");
    assert!(lexer.next_token().is_err());
  }

  #[test]
  fn line_numbers_advance_across_newlines() {
    let mut lexer = Lexer::new("1\n2\n3");
    assert_eq!(lexer.next_token().unwrap().line, Line::new(1));
    assert_eq!(lexer.next_token().unwrap().line, Line::new(2));
    assert_eq!(lexer.next_token().unwrap().line, Line::new(3));
  }

  #[test]
  fn unterminated_string_is_a_lexical_error() {
    let mut lexer = Lexer::new(r#""never closed"#);
    assert!(lexer.next_token().is_err());
  }

  #[test]
  fn unknown_input_is_a_lexical_error() {
    let mut lexer = Lexer::new("12abc$");
    // "12" lexes fine, "abc" lexes fine as an identifier, "$" fails.
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::IntLiteral);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert!(lexer.next_token().is_err());
  }
}
