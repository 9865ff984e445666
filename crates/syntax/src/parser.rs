//! A recursive-descent parser with two-token lookahead.
//!
//! The grammar only needs the second token of lookahead in one place: after
//! `let Identifier`, seeing `:` means a variable declaration and seeing `(`
//! means a function declaration. Everywhere else one token is enough, but
//! carrying the second along uniformly is simpler than special-casing it.
//!
//! Binary operators are right-associative: each precedence tier's rule
//! calls back into the *same* tier on its right-hand side
//! (`SimpleExpression -> Term (AddOp SimpleExpression)?`), which a
//! recursive-descent parser builds as a right-leaning tree for free,
//! without an explicit precedence-climbing loop.

use diag::{Error, Result};
use span::Line;

use crate::ast::{BinOp, Block, Expr, FormalParam, Program, Stmt, Ty, UnOp};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub fn parse(src: &str) -> Result<Program> {
  let mut parser = Parser::new(src)?;
  parser.parse_program()
}

struct Parser<'src> {
  lexer: Lexer<'src>,
  tok: Token,
  peek2: Token,
}

impl<'src> Parser<'src> {
  fn new(src: &'src str) -> Result<Self> {
    let mut lexer = Lexer::new(src);
    let tok = lexer.next_token()?;
    let peek2 = lexer.next_token()?;
    Ok(Parser { lexer, tok, peek2 })
  }

  fn line(&self) -> Line {
    self.tok.line
  }

  fn bump(&mut self) -> Result<Token> {
    let next = self.lexer.next_token()?;
    let consumed = std::mem::replace(&mut self.tok, std::mem::replace(&mut self.peek2, next));
    Ok(consumed)
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.tok.kind == kind
  }

  fn expect(&mut self, kind: TokenKind) -> Result<Token> {
    if self.tok.kind == kind {
      self.bump()
    } else {
      Err(Error::syntax(
        self.line(),
        format!("Expected {}, found {}", kind.type_name(), self.tok.kind.type_name()),
      ))
    }
  }

  fn expect_identifier(&mut self) -> Result<String> {
    if self.tok.kind == TokenKind::Identifier {
      let tok = self.bump()?;
      Ok(tok.lexeme.expect("identifier token always carries a lexeme"))
    } else {
      Err(Error::syntax(
        self.line(),
        format!("Expected Identifier, found {}", self.tok.kind.type_name()),
      ))
    }
  }

  fn parse_type(&mut self) -> Result<Ty> {
    let ty = match self.tok.kind {
      TokenKind::Bool => Ty::Bool,
      TokenKind::Float => Ty::Float,
      TokenKind::Int => Ty::Int,
      TokenKind::String => Ty::String,
      _ => {
        return Err(Error::syntax(
          self.line(),
          format!("Expected a type, found {}", self.tok.kind.type_name()),
        ));
      }
    };
    self.bump()?;
    Ok(ty)
  }

  // ---- top level -------------------------------------------------------

  fn parse_program(&mut self) -> Result<Program> {
    let line = self.line();
    let mut statements = Vec::new();
    while !self.check(TokenKind::End) {
      statements.push(self.parse_statement()?);
    }
    Ok(Program {
      block: Block { line, statements },
    })
  }

  fn parse_block(&mut self) -> Result<Block> {
    let line = self.line();
    self.expect(TokenKind::LBrace)?;
    let mut statements = Vec::new();
    while !self.check(TokenKind::RBrace) {
      statements.push(self.parse_statement()?);
    }
    self.expect(TokenKind::RBrace)?;
    Ok(Block { line, statements })
  }

  fn parse_statement(&mut self) -> Result<Stmt> {
    match self.tok.kind {
      TokenKind::Let => self.parse_variable_decl(),
      TokenKind::Print => self.parse_print(),
      TokenKind::Return => self.parse_return(),
      TokenKind::If => self.parse_if(),
      TokenKind::For => self.parse_for(),
      TokenKind::While => self.parse_while(),
      TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
      TokenKind::Identifier => self.parse_assignment(),
      TokenKind::Bool | TokenKind::Float | TokenKind::Int | TokenKind::String => self.parse_function_decl(),
      _ => Err(Error::syntax(
        self.line(),
        format!("Unexpected {}", self.tok.kind.type_name()),
      )),
    }
  }

  /// `'let' Identifier ':' Type '=' Expression ';'`
  fn parse_variable_decl(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::Let)?;
    let name = self.expect_identifier()?;
    self.expect(TokenKind::Colon)?;
    let ty = self.parse_type()?;
    self.expect(TokenKind::Eq)?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon)?;
    Ok(Stmt::VariableDecl { line, name, ty, value })
  }

  /// `Type Identifier '(' [FormalParam {',' FormalParam}] ')' Block` — a
  /// function declaration is led by its return type, not by `let`.
  fn parse_function_decl(&mut self) -> Result<Stmt> {
    let line = self.line();
    let ret = self.parse_type()?;
    let name = self.expect_identifier()?;
    self.expect(TokenKind::LParen)?;
    let mut params = Vec::new();
    if !self.check(TokenKind::RParen) {
      params.push(self.parse_formal_param()?);
      while self.check(TokenKind::Comma) {
        self.bump()?;
        params.push(self.parse_formal_param()?);
      }
    }
    self.expect(TokenKind::RParen)?;
    let body = self.parse_block()?;
    Ok(Stmt::FunctionDecl { line, name, params, ret, body })
  }

  fn parse_formal_param(&mut self) -> Result<FormalParam> {
    let line = self.line();
    let name = self.expect_identifier()?;
    self.expect(TokenKind::Colon)?;
    let ty = self.parse_type()?;
    Ok(FormalParam { line, name, ty })
  }

  fn parse_assignment(&mut self) -> Result<Stmt> {
    let line = self.line();
    let name = self.expect_identifier()?;
    self.expect(TokenKind::Eq)?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon)?;
    Ok(Stmt::Assignment { line, name, value })
  }

  fn parse_print(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::Print)?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon)?;
    Ok(Stmt::Print { line, value })
  }

  fn parse_return(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::Return)?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon)?;
    Ok(Stmt::Return { line, value })
  }

  fn parse_if(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::If)?;
    self.expect(TokenKind::LParen)?;
    let cond = self.parse_expression()?;
    self.expect(TokenKind::RParen)?;
    let then_branch = self.parse_block()?;
    let else_branch = if self.check(TokenKind::Else) {
      self.bump()?;
      Some(self.parse_block()?)
    } else {
      None
    };
    Ok(Stmt::If { line, cond, then_branch, else_branch })
  }

  /// `for ( [VariableDecl] ; Expression ; [Assignment] ) Block`. Both the
  /// init declaration and the step assignment are optional; only the loop
  /// condition is mandatory.
  fn parse_for(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::For)?;
    self.expect(TokenKind::LParen)?;

    let init = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(Box::new(self.parse_variable_decl()?))
    };
    if init.is_none() {
      self.expect(TokenKind::Semicolon)?;
    }

    let cond = self.parse_expression()?;
    self.expect(TokenKind::Semicolon)?;

    let step = if self.check(TokenKind::RParen) {
      None
    } else {
      let step_line = self.line();
      let name = self.expect_identifier()?;
      self.expect(TokenKind::Eq)?;
      let value = self.parse_expression()?;
      Some(Box::new(Stmt::Assignment { line: step_line, name, value }))
    };
    self.expect(TokenKind::RParen)?;

    let body = self.parse_block()?;
    Ok(Stmt::For { line, init, cond, step, body })
  }

  fn parse_while(&mut self) -> Result<Stmt> {
    let line = self.line();
    self.expect(TokenKind::While)?;
    self.expect(TokenKind::LParen)?;
    let cond = self.parse_expression()?;
    self.expect(TokenKind::RParen)?;
    let body = self.parse_block()?;
    Ok(Stmt::While { line, cond, body })
  }

  // ---- expressions -------------------------------------------------------

  /// `Expression -> SimpleExpression (RelOp SimpleExpression)?`
  fn parse_expression(&mut self) -> Result<Expr> {
    let left = self.parse_simple_expression()?;
    let op = match self.tok.kind {
      TokenKind::Lt => BinOp::Lt,
      TokenKind::Le => BinOp::Le,
      TokenKind::Gt => BinOp::Gt,
      TokenKind::Ge => BinOp::Ge,
      TokenKind::EqEq => BinOp::Eq,
      TokenKind::NotEq => BinOp::Ne,
      _ => return Ok(left),
    };
    let line = self.line();
    self.bump()?;
    let right = self.parse_simple_expression()?;
    Ok(Expr::Binary { line, op, left: Box::new(left), right: Box::new(right) })
  }

  /// `SimpleExpression -> Term (AddOp SimpleExpression)?`, right-recursive
  /// so a chain of `+`/`-`/`or` builds a right-leaning tree.
  fn parse_simple_expression(&mut self) -> Result<Expr> {
    let left = self.parse_term()?;
    let op = match self.tok.kind {
      TokenKind::Plus => BinOp::Add,
      TokenKind::Minus => BinOp::Sub,
      TokenKind::Or => BinOp::Or,
      _ => return Ok(left),
    };
    let line = self.line();
    self.bump()?;
    let right = self.parse_simple_expression()?;
    Ok(Expr::Binary { line, op, left: Box::new(left), right: Box::new(right) })
  }

  /// `Term -> Factor (MultOp Term)?`, likewise right-recursive.
  fn parse_term(&mut self) -> Result<Expr> {
    let left = self.parse_factor()?;
    let op = match self.tok.kind {
      TokenKind::Star => BinOp::Mul,
      TokenKind::Slash => BinOp::Div,
      TokenKind::And => BinOp::And,
      _ => return Ok(left),
    };
    let line = self.line();
    self.bump()?;
    let right = self.parse_term()?;
    Ok(Expr::Binary { line, op, left: Box::new(left), right: Box::new(right) })
  }

  fn parse_factor(&mut self) -> Result<Expr> {
    let line = self.line();
    match self.tok.kind {
      // The operand is a full `Expression`, not just the next `Factor` —
      // grounded in the original parser's `parseUnary`, which recurses
      // into `parseExpression`. So `-a + b` parses as `-(a + b)`.
      TokenKind::Minus => {
        self.bump()?;
        let operand = self.parse_expression()?;
        Ok(Expr::Unary { line, op: UnOp::Neg, operand: Box::new(operand) })
      }
      TokenKind::Not => {
        self.bump()?;
        let operand = self.parse_expression()?;
        Ok(Expr::Unary { line, op: UnOp::Not, operand: Box::new(operand) })
      }
      TokenKind::IntLiteral => {
        let tok = self.bump()?;
        let text = tok.lexeme.expect("int literal always carries a lexeme");
        let value = text
          .parse::<i64>()
          .map_err(|_| Error::syntax(line, format!("Invalid integer literal: {text}")))?;
        Ok(Expr::LiteralInt { line, value })
      }
      TokenKind::FloatLiteral => {
        let tok = self.bump()?;
        let text = tok.lexeme.expect("float literal always carries a lexeme");
        let value = text
          .parse::<f64>()
          .map_err(|_| Error::syntax(line, format!("Invalid float literal: {text}")))?;
        Ok(Expr::LiteralFloat { line, value })
      }
      TokenKind::StringLiteral => {
        let tok = self.bump()?;
        let raw = tok.lexeme.expect("string literal always carries a lexeme");
        // The lexeme still carries its surrounding quotes; this is the one
        // place they get stripped.
        let value = raw.trim_start_matches('"').trim_end_matches('"').to_string();
        Ok(Expr::LiteralString { line, value })
      }
      TokenKind::True => {
        self.bump()?;
        Ok(Expr::LiteralBool { line, value: true })
      }
      TokenKind::False => {
        self.bump()?;
        Ok(Expr::LiteralBool { line, value: false })
      }
      TokenKind::LParen => {
        self.bump()?;
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(inner)
      }
      TokenKind::Identifier => {
        let name = self.expect_identifier()?;
        if self.check(TokenKind::LParen) {
          self.bump()?;
          let mut args = Vec::new();
          if !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
              self.bump()?;
              args.push(self.parse_expression()?);
            }
          }
          self.expect(TokenKind::RParen)?;
          Ok(Expr::Call { line, callee: name, args })
        } else {
          Ok(Expr::Identifier { line, name })
        }
      }
      _ => Err(Error::syntax(
        line,
        format!("Unexpected {}", self.tok.kind.type_name()),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use indoc::indoc;

  use super::*;

  fn parse_ok(src: &str) -> Program {
    parse(src).unwrap_or_else(|e| panic!("expected {src:?} to parse, got {e}"))
  }

  #[test]
  fn variable_decl_and_print() {
    let program = parse_ok("let x : int = 1 ; print x ;");
    assert_eq!(program.block.statements.len(), 2);
  }

  #[test]
  fn right_associative_addition() {
    let program = parse_ok("let x : int = 1 + 2 + 3 ; ");
    let Stmt::VariableDecl { value, .. } = &program.block.statements[0] else {
      panic!("expected variable decl");
    };
    // 1 + (2 + 3): the right child of the outer `+` is itself a `+`.
    let Expr::Binary { op: BinOp::Add, right, .. } = value else {
      panic!("expected addition");
    };
    assert!(matches!(**right, Expr::Binary { op: BinOp::Add, .. }));
  }

  #[test]
  fn precedence_tiers() {
    // 1 + 2 * 3 < 10: relational loosest, then +, then *.
    let program = parse_ok("print 1 + 2 * 3 < 10 ;");
    let Stmt::Print { value, .. } = &program.block.statements[0] else {
      panic!("expected print");
    };
    assert!(matches!(value, Expr::Binary { op: BinOp::Lt, .. }));
  }

  #[test]
  fn function_decl_is_led_by_its_return_type() {
    let program = parse_ok(indoc! {"
      int f ( a : int ) {
        return a ;
      }
    "});
    assert!(matches!(program.block.statements[0], Stmt::FunctionDecl { .. }));

    let program = parse_ok("let x : int = 0 ;");
    assert!(matches!(program.block.statements[0], Stmt::VariableDecl { .. }));
  }

  #[test]
  fn unary_minus_binds_looser_than_addition() {
    // Grounded on the original parser: parseUnary recurses into a full
    // Expression, so `-a + b` parses as `-(a + b)`, not `(-a) + b`.
    let program = parse_ok("print - a + b ;");
    let Stmt::Print { value, .. } = &program.block.statements[0] else {
      panic!("expected print");
    };
    let Expr::Unary { op: UnOp::Neg, operand, .. } = value else {
      panic!("expected unary negation");
    };
    assert!(matches!(**operand, Expr::Binary { op: BinOp::Add, .. }));
  }

  #[test]
  fn for_loop_allows_omitted_init_and_step() {
    let program = parse_ok("for ( ; true ; ) { }");
    let Stmt::For { init, step, .. } = &program.block.statements[0] else {
      panic!("expected for loop");
    };
    assert!(init.is_none());
    assert!(step.is_none());
  }

  #[test]
  fn missing_semicolon_is_a_syntax_error() {
    assert!(parse("let x : int = 1").is_err());
  }

  #[test]
  fn string_literal_loses_its_quotes_in_the_ast() {
    let program = parse_ok(r#"print "hi" ;"#);
    let Stmt::Print { value, .. } = &program.block.statements[0] else {
      panic!("expected print");
    };
    assert_eq!(*value, Expr::LiteralString { line: Line::new(1), value: "hi".into() });
  }
}
