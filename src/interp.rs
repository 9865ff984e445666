//! Tree-walking execution.
//!
//! Runs only after [`crate::check::Checker`] has accepted the program, so
//! most of the failure modes here are unreachable in practice; they exist
//! because the interpreter does not re-derive the type system's proof.

use std::io::{self, Write};
use std::rc::Rc;

use diag::{Error, Result};
use span::Line;
use syntax::ast::{BinOp, Block, Expr, Program, Stmt, UnOp};

use crate::symbol::SymbolTable;
use crate::value::Value;

/// Walks the AST and executes it. `print` output goes through a boxed
/// writer rather than straight to `stdout`, the same seam the interpreter
/// the grammar is grounded on uses for its globals (`vm::global::Output`,
/// a boxed `dyn Write`): it lets a driver redirect output and lets tests
/// assert against a buffer instead of the process's real stdout.
pub struct Interpreter {
  table: SymbolTable,
  out: Box<dyn Write>,
  /// The value of the most recently executed `return`, live only while a
  /// function call's body is running. Stands in for the source's
  /// mutable `returnedType`/`returnedBool`/etc. scratch registers: one
  /// tagged value instead of four parallel ones.
  last_return: Option<Value>,
}

impl Interpreter {
  pub fn new() -> Self {
    Interpreter::with_output(Box::new(io::stdout()))
  }

  pub fn with_output(out: Box<dyn Write>) -> Self {
    Interpreter {
      table: SymbolTable::new(),
      out,
      last_return: None,
    }
  }

  pub fn run(&mut self, program: &Program) -> Result<()> {
    self.table.push();
    let result = self.exec_stmts(&program.block.statements);
    self.table.pop();
    result
  }

  fn scoped<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
    self.table.push();
    let result = body(self);
    self.table.pop();
    result
  }

  fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
    for stmt in stmts {
      self.exec_stmt(stmt)?;
    }
    Ok(())
  }

  fn exec_block(&mut self, block: &Block) -> Result<()> {
    self.scoped(|this| this.exec_stmts(&block.statements))
  }

  fn exec_stmt(&mut self, stmt: &Stmt) -> Result<()> {
    match stmt {
      Stmt::VariableDecl { name, ty, value, line } => {
        let v = self.eval(value)?.coerce(*ty);
        self.table.declare_variable(name, *ty, *line).expect("already accepted by the checker");
        self.table.assign(name, v);
        Ok(())
      }
      Stmt::Assignment { name, value, .. } => {
        let ty = self.table.get_type(name);
        let v = self.eval(value)?.coerce(ty);
        self.table.assign(name, v);
        Ok(())
      }
      Stmt::Print { value, line } => {
        let v = self.eval(value)?;
        writeln!(self.out, "{}", v.display()).map_err(|e| Error::runtime(*line, e.to_string()))
      }
      Stmt::Return { value, .. } => {
        let v = self.eval(value)?;
        self.last_return = Some(v);
        Ok(())
      }
      Stmt::If { cond, then_branch, else_branch, .. } => self.scoped(|this| {
        if this.eval(cond)?.as_bool() {
          this.exec_stmts(&then_branch.statements)
        } else if let Some(else_branch) = else_branch {
          this.exec_stmts(&else_branch.statements)
        } else {
          Ok(())
        }
      }),
      Stmt::While { cond, body, .. } => self.scoped(|this| {
        while this.eval(cond)?.as_bool() {
          this.exec_stmts(&body.statements)?;
        }
        Ok(())
      }),
      Stmt::For { init, cond, step, body, .. } => self.scoped(|this| {
        if let Some(init) = init {
          this.exec_stmt(init)?;
        }
        while this.eval(cond)?.as_bool() {
          this.exec_block(body)?;
          // Known deviation, preserved from the source: the step
          // assignment runs every iteration unconditionally there, which
          // null-derefs when the grammar's optional step was omitted. We
          // guard instead of enforcing presence at parse time, since the
          // grammar explicitly allows the omission.
          if let Some(step) = step {
            this.exec_stmt(step)?;
          }
        }
        Ok(())
      }),
      Stmt::FunctionDecl { name, line, .. } => {
        self.table.declare_function(name, Rc::new(stmt.clone()), *line).expect("already accepted by the checker");
        Ok(())
      }
      Stmt::Block(block) => self.exec_block(block),
    }
  }

  fn eval(&mut self, expr: &Expr) -> Result<Value> {
    match expr {
      Expr::LiteralBool { value, .. } => Ok(Value::Bool(*value)),
      Expr::LiteralInt { value, .. } => Ok(Value::Int(*value)),
      Expr::LiteralFloat { value, .. } => Ok(Value::Float(*value)),
      Expr::LiteralString { value, .. } => Ok(Value::String(value.clone())),
      Expr::Identifier { name, .. } => Ok(self.table.value_of(name).clone()),
      Expr::Unary { op, operand, .. } => {
        let v = self.eval(operand)?;
        Ok(match op {
          UnOp::Neg => Value::Float(-v.as_float()),
          UnOp::Not => Value::Bool(!v.as_bool()),
        })
      }
      Expr::Binary { op, left, right, .. } => self.eval_binary(*op, left, right),
      Expr::Call { callee, args, line } => self.eval_call(callee, args, *line),
    }
  }

  fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value> {
    match op {
      BinOp::And | BinOp::Or => {
        let l = self.eval(left)?.as_bool();
        // Known deviation, preserved from the source: the right operand
        // is coerced to `float` and only then read as a bool, instead of
        // coercing directly to `bool`. Happens to agree with the direct
        // coercion for every value the language can produce, since both
        // routes only ever distinguish zero from non-zero.
        let r = self.eval(right)?.as_float() != 0.0;
        Ok(Value::Bool(match op {
          BinOp::And => l && r,
          BinOp::Or => l || r,
          _ => unreachable!(),
        }))
      }
      _ => {
        let lv = self.eval(left)?;
        let rv = self.eval(right)?;
        // The checker only lets `+` and the relational operators through
        // on two strings (`op_return_type` restricts `-` to the
        // numeric/bool cluster precisely so this never has to reject a
        // type-checked program); the source's interpreter has no
        // dedicated handling for string operands at all, silently reading
        // both through its float register regardless. That is not a
        // "known deviation" worth preserving — it is a gap the original's
        // type table opens and its interpreter never closes — so string
        // operands get real string semantics here instead of being
        // forced through `as_float`.
        if let (Value::String(l), Value::String(r)) = (&lv, &rv) {
          return self.eval_string_binary(op, l, r);
        }

        // Both operands are read as floats; relational operators store
        // their 0.0/1.0 result as `float`, not `bool` — a known
        // deviation preserved from the source. It only becomes visible
        // if the result is printed or otherwise used without a
        // bool-coercing context.
        let l = lv.as_float();
        let r = rv.as_float();
        Ok(Value::Float(match op {
          BinOp::Add => l + r,
          BinOp::Sub => l - r,
          BinOp::Mul => l * r,
          BinOp::Div => l / r,
          BinOp::Gt => bool_as_float(l > r),
          BinOp::Ge => bool_as_float(l >= r),
          BinOp::Lt => bool_as_float(l < r),
          BinOp::Le => bool_as_float(l <= r),
          BinOp::Eq => bool_as_float(l == r),
          BinOp::Ne => bool_as_float(l != r),
          BinOp::And | BinOp::Or => unreachable!(),
        }))
      }
    }
  }

  fn eval_string_binary(&self, op: BinOp, l: &str, r: &str) -> Result<Value> {
    Ok(match op {
      BinOp::Add => Value::String(format!("{l}{r}")),
      BinOp::Lt => Value::Float(bool_as_float(l < r)),
      BinOp::Le => Value::Float(bool_as_float(l <= r)),
      BinOp::Gt => Value::Float(bool_as_float(l > r)),
      BinOp::Ge => Value::Float(bool_as_float(l >= r)),
      BinOp::Eq => Value::Float(bool_as_float(l == r)),
      BinOp::Ne => Value::Float(bool_as_float(l != r)),
      // `op_return_type` only accepts `+` and the relational operators on
      // two strings; every other operator is a semantic error before a
      // program ever reaches the interpreter.
      _ => unreachable!("checker rejects non-+/non-relational operators on string operands"),
    })
  }

  fn eval_call(&mut self, callee: &str, args: &[Expr], line: Line) -> Result<Value> {
    let mut values = Vec::with_capacity(args.len());
    let mut types = Vec::with_capacity(args.len());
    for arg in args {
      let v = self.eval(arg)?;
      types.push(v.ty());
      values.push(v);
    }

    let decl = self
      .table
      .get_function(callee, &types)
      .ok_or_else(|| Error::runtime(line, format!("Function {callee} is not defined.")))?;
    let Stmt::FunctionDecl { params, ret, body, .. } = decl.as_ref() else {
      unreachable!("only FunctionDecl nodes are ever stored as overloads");
    };

    self.scoped(|this| {
      for (param, value) in params.iter().zip(values) {
        this.table.declare_param(&param.name, param.ty, param.line).expect("already accepted by the checker");
        this.table.assign(&param.name, value);
      }
      let saved_return = this.last_return.take();
      this.exec_stmts(&body.statements)?;
      let result = this.last_return.take().expect("checker requires a function body to end in return");
      this.last_return = saved_return;
      Ok(result.coerce(*ret))
    })
  }
}

fn bool_as_float(b: bool) -> f64 {
  if b {
    1.0
  } else {
    0.0
  }
}

impl Default for Interpreter {
  fn default() -> Self {
    Interpreter::new()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use indoc::indoc;

  use super::*;
  use crate::check::Checker;

  /// A `Write` sink that can be read back after the interpreter that
  /// owns it finishes running, since `Interpreter` takes ownership of
  /// its writer.
  #[derive(Clone, Default)]
  struct SharedBuf(Rc<RefCell<Vec<u8>>>);

  impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.borrow_mut().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  fn run_and_capture(src: &str) -> String {
    let program = syntax::parse(src).expect("fixture should parse");
    Checker::new().check_program(&program).expect("fixture should check");

    let buf = SharedBuf::default();
    let mut interp = Interpreter::with_output(Box::new(buf.clone()));
    interp.run(&program).expect("fixture should run");
    String::from_utf8(buf.0.borrow().clone()).unwrap()
  }

  #[test]
  fn prints_sum_of_two_ints() {
    assert_eq!(run_and_capture("let x : int = 3; let y : int = 4; print x + y;"), "7\n");
  }

  #[test]
  fn prints_negated_bool() {
    assert_eq!(run_and_capture("let b : bool = true; print not b;"), "false\n");
  }

  #[test]
  fn prints_string_verbatim() {
    assert_eq!(run_and_capture(r#"let s : string = "hi"; print s;"#), "hi\n");
  }

  #[test]
  fn calls_a_function() {
    assert_eq!(run_and_capture("int add(a:int,b:int){return a+b;} print add(2,3);"), "5\n");
  }

  #[test]
  fn resolves_overloads_by_exact_signature() {
    let src = indoc! {"
      float add(a:float,b:float){
        return a+b;
      }
      int add(a:int,b:int){
        return a+b;
      }
      print add(1,2);
      print add(1.5,2.5);
    "};
    assert_eq!(run_and_capture(src), "3\n4\n");
  }

  #[test]
  fn while_loop_runs_to_completion() {
    assert_eq!(run_and_capture("let i : int = 0; while (i < 3) { print i; i = i + 1; }"), "0\n1\n2\n");
  }

  #[test]
  fn for_loop_with_every_clause_present() {
    assert_eq!(run_and_capture("for (let i : int = 0; i < 3; i = i + 1) { print i; }"), "0\n1\n2\n");
  }

  #[test]
  fn for_loop_tolerates_an_omitted_step() {
    // Preserves the source's behavior for the grammar-legal case where
    // the step assignment is left out entirely.
    let src = "let i : int = 0; for ( ; i < 2 ; ) { print i; i = i + 1; }";
    assert_eq!(run_and_capture(src), "0\n1\n");
  }

  #[test]
  fn relational_result_prints_as_a_number_not_a_bool() {
    // Known deviation preserved from the source: a relational result
    // stored without an intervening bool-coercing context prints as
    // `1`/`0`, not `true`/`false`.
    assert_eq!(run_and_capture("print 1 < 2;"), "1\n");
  }

  #[test]
  fn string_equality_compares_by_value() {
    assert_eq!(run_and_capture(r#"print "ab" == "ab";"#), "1\n");
    assert_eq!(run_and_capture(r#"print "ab" == "ac";"#), "0\n");
  }

  #[test]
  fn string_concatenation_via_plus() {
    assert_eq!(run_and_capture(r#"let s : string = "foo" + "bar"; print s;"#), "foobar\n");
  }

  #[test]
  fn shadowed_variable_does_not_leak_out_of_its_scope() {
    let src = "let x : int = 1; { let x : int = 2; } print x;";
    assert_eq!(run_and_capture(src), "1\n");
  }
}
