//! The abstract syntax tree the parser produces.
//!
//! Every node carries the source [`Line`] it started on, so a later pass
//! (the analyzer, the interpreter, the XML printer) can report against it
//! without threading a separate position argument through every call.

use span::Line;

/// The four value types a MiniLang expression can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ty {
  Bool,
  Float,
  Int,
  String,
}

impl Ty {
  pub fn name(self) -> &'static str {
    match self {
      Ty::Bool => "bool",
      Ty::Float => "float",
      Ty::Int => "int",
      Ty::String => "string",
    }
  }
}

/// A binary operator, spanning both the arithmetic and relational tiers
/// of the grammar (`and`/`or` included — they parse at the same tier as
/// the other multiplicative/additive operators).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  And,
  Or,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Ne,
}

impl BinOp {
  pub fn name(self) -> &'static str {
    match self {
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
      BinOp::And => "and",
      BinOp::Or => "or",
      BinOp::Lt => "<",
      BinOp::Le => "<=",
      BinOp::Gt => ">",
      BinOp::Ge => ">=",
      BinOp::Eq => "==",
      BinOp::Ne => "!=",
    }
  }
}

/// A unary operator (`-` negation, `not` logical negation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
  Neg,
  Not,
}

impl UnOp {
  pub fn name(self) -> &'static str {
    match self {
      UnOp::Neg => "-",
      UnOp::Not => "not",
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
  LiteralBool { line: Line, value: bool },
  LiteralInt { line: Line, value: i64 },
  LiteralFloat { line: Line, value: f64 },
  LiteralString { line: Line, value: String },
  Identifier { line: Line, name: String },
  Unary { line: Line, op: UnOp, operand: Box<Expr> },
  Binary { line: Line, op: BinOp, left: Box<Expr>, right: Box<Expr> },
  Call { line: Line, callee: String, args: Vec<Expr> },
}

impl Expr {
  pub fn line(&self) -> Line {
    match self {
      Expr::LiteralBool { line, .. }
      | Expr::LiteralInt { line, .. }
      | Expr::LiteralFloat { line, .. }
      | Expr::LiteralString { line, .. }
      | Expr::Identifier { line, .. }
      | Expr::Unary { line, .. }
      | Expr::Binary { line, .. }
      | Expr::Call { line, .. } => *line,
    }
  }
}

/// A formal parameter in a function declaration's parameter list.
#[derive(Clone, Debug, PartialEq)]
pub struct FormalParam {
  pub line: Line,
  pub name: String,
  pub ty: Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
  /// `let name : ty = expr ;`
  VariableDecl {
    line: Line,
    name: String,
    ty: Ty,
    value: Expr,
  },
  /// `name = expr ;`
  Assignment { line: Line, name: String, value: Expr },
  /// `print expr ;`
  Print { line: Line, value: Expr },
  /// `return expr ;` (the parser always requires the expression; a
  /// function with no meaningful value to return still has to name one).
  Return { line: Line, value: Expr },
  If {
    line: Line,
    cond: Expr,
    then_branch: Block,
    else_branch: Option<Block>,
  },
  For {
    line: Line,
    init: Option<Box<Stmt>>,
    cond: Expr,
    step: Option<Box<Stmt>>,
    body: Block,
  },
  While { line: Line, cond: Expr, body: Block },
  FunctionDecl {
    line: Line,
    name: String,
    params: Vec<FormalParam>,
    ret: Ty,
    body: Block,
  },
  Block(Block),
}

impl Stmt {
  pub fn line(&self) -> Line {
    match self {
      Stmt::VariableDecl { line, .. }
      | Stmt::Assignment { line, .. }
      | Stmt::Print { line, .. }
      | Stmt::Return { line, .. }
      | Stmt::If { line, .. }
      | Stmt::For { line, .. }
      | Stmt::While { line, .. }
      | Stmt::FunctionDecl { line, .. } => *line,
      Stmt::Block(block) => block.line,
    }
  }
}

/// A brace-delimited sequence of statements, its own scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
  pub line: Line,
  pub statements: Vec<Stmt>,
}

/// The root node: a single top-level block, per the grammar (a MiniLang
/// program is the body of an implicit outermost `{ ... }`).
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
  pub block: Block,
}

/// A uniform dispatch surface over the two node families. This is the
/// idiomatic replacement for the original's `accept(Visitor*)` virtual
/// call: a plain exhaustive `match` at each walker gets the same "every
/// variant handled, new variants are a compile error" guarantee without
/// needing a double-dispatch vtable. The semantic analyzer and
/// interpreter walk the tree with their own recursive methods instead of
/// this trait, since their per-node results (a type, a runtime value) and
/// scratch state don't fit one shared `Output`; the XML printer, which
/// only ever produces text, is this trait's one real implementor.
pub trait Visitor {
  type Output;

  fn visit_program(&mut self, program: &Program) -> Self::Output;
  fn visit_block(&mut self, block: &Block) -> Self::Output;
  fn visit_stmt(&mut self, stmt: &Stmt) -> Self::Output;
  fn visit_expr(&mut self, expr: &Expr) -> Self::Output;
}
