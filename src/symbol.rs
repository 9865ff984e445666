//! A stack of scopes mapping names to symbols.
//!
//! Variables and functions share a name space within a scope, matching a
//! single `HashMap` per scope rather than two parallel tables.

use std::collections::HashMap;
use std::rc::Rc;

use diag::{Error, Result};
use span::Line;
use syntax::ast::{Stmt, Ty};

use crate::value::Value;

/// One declared name: either a variable (empty `overloads`, optional
/// runtime `value`) or an overloaded function (non-empty `overloads`, no
/// `value` of its own).
///
/// Function declarations are shared via `Rc` rather than borrowed: the AST
/// has no cycles, so reference counting gives the same "outlives any
/// traversal" guarantee the original's raw non-owning pointer relied on,
/// without threading a lifetime parameter through every walker.
#[derive(Clone, Debug)]
pub struct Symbol {
  pub ty: Ty,
  pub line: Line,
  pub overloads: Vec<Rc<Stmt>>,
  pub value: Option<Value>,
}

type Scope = HashMap<String, Symbol>;

#[derive(Default)]
pub struct SymbolTable {
  stack: Vec<Scope>,
}

fn param_types(decl: &Stmt) -> Vec<Ty> {
  match decl {
    Stmt::FunctionDecl { params, .. } => params.iter().map(|p| p.ty).collect(),
    _ => unreachable!("only FunctionDecl nodes are stored as overloads"),
  }
}

fn return_type(decl: &Stmt) -> Ty {
  match decl {
    Stmt::FunctionDecl { ret, .. } => *ret,
    _ => unreachable!("only FunctionDecl nodes are stored as overloads"),
  }
}

impl SymbolTable {
  pub fn new() -> Self {
    SymbolTable::default()
  }

  pub fn push(&mut self) {
    self.stack.push(Scope::new());
  }

  pub fn pop(&mut self) {
    self.stack.pop();
  }

  /// Current scope-stack depth, for the scope-discipline invariant: every
  /// `push` must be matched by a `pop` on every exit path, including
  /// errors.
  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  fn top(&mut self) -> &mut Scope {
    self.stack.last_mut().expect("at least one scope is always active during a walk")
  }

  fn find(&self, name: &str) -> Option<&Symbol> {
    self.stack.iter().rev().find_map(|scope| scope.get(name))
  }

  fn find_mut(&mut self, name: &str) -> Option<&mut Symbol> {
    self.stack.iter_mut().rev().find_map(|scope| scope.get_mut(name))
  }

  pub fn is_declared(&self, name: &str) -> bool {
    self.find(name).is_some()
  }

  /// True if `name` is declared anywhere AND some overload's positional
  /// parameter types exactly match `types` (no coercion-aware matching).
  pub fn is_declared_with_signature(&self, name: &str, types: &[Ty]) -> bool {
    self.find(name).is_some_and(|sym| sym.overloads.iter().any(|decl| param_types(decl) == types))
  }

  pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
    self.stack.last().is_some_and(|scope| scope.contains_key(name))
  }

  pub fn get_type(&self, name: &str) -> Ty {
    self.find(name).expect("caller must check is_declared first").ty
  }

  pub fn get_function(&self, name: &str, types: &[Ty]) -> Option<Rc<Stmt>> {
    self.find(name)?.overloads.iter().find(|decl| param_types(decl) == types).cloned()
  }

  /// Declares a plain variable in the innermost scope. Fails if the name
  /// already exists in that same scope (shadowing an outer scope is
  /// fine).
  pub fn declare_variable(&mut self, name: &str, ty: Ty, line: Line) -> Result<()> {
    if self.is_declared_in_current_scope(name) {
      return Err(Error::semantic(line, format!("Variable {name} is already declared in the current scope.")));
    }
    self.top().insert(
      name.to_string(),
      Symbol { ty, line, overloads: Vec::new(), value: None },
    );
    Ok(())
  }

  /// Declares a formal parameter as a plain variable of its type.
  pub fn declare_param(&mut self, name: &str, ty: Ty, line: Line) -> Result<()> {
    self.declare_variable(name, ty, line)
  }

  /// Declares or extends an overloaded function. Functions are assumed
  /// declared only in the current (global) scope.
  pub fn declare_function(&mut self, name: &str, decl: Rc<Stmt>, line: Line) -> Result<()> {
    let types = param_types(&decl);
    let ret = return_type(&decl);

    if self.is_declared_with_signature(name, &types) {
      let sig = types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ");
      return Err(Error::semantic(line, format!("Function {name}({sig}) is already declared.")));
    }

    if self.is_declared(name) {
      let existing_ret = self.get_type(name);
      if existing_ret != ret {
        return Err(Error::semantic(
          line,
          format!("Function {name} has already been declared with a different return type."),
        ));
      }
      self.find_mut(name).expect("checked above").overloads.push(decl);
    } else {
      self.top().insert(
        name.to_string(),
        Symbol { ty: ret, line, overloads: vec![decl], value: None },
      );
    }
    Ok(())
  }

  /// Overwrites the runtime value of an already-declared symbol.
  pub fn assign(&mut self, name: &str, value: Value) {
    self.find_mut(name).expect("caller must check is_declared first").value = Some(value);
  }

  pub fn value_of(&self, name: &str) -> &Value {
    self
      .find(name)
      .and_then(|sym| sym.value.as_ref())
      .expect("caller must check is_declared and that the variable has been initialized")
  }
}

#[cfg(test)]
mod tests {
  use span::Line;

  use super::*;

  fn function_decl(name: &str, params: Vec<Ty>, ret: Ty) -> Rc<Stmt> {
    Rc::new(Stmt::FunctionDecl {
      line: Line::new(1),
      name: name.to_string(),
      params: params
        .into_iter()
        .enumerate()
        .map(|(i, ty)| syntax::ast::FormalParam { line: Line::new(1), name: format!("p{i}"), ty })
        .collect(),
      ret,
      body: syntax::ast::Block { line: Line::new(1), statements: Vec::new() },
    })
  }

  #[test]
  fn scope_discipline_push_pop_restores_depth() {
    let mut table = SymbolTable::new();
    table.push();
    let depth = table.depth();
    table.push();
    table.push();
    table.pop();
    table.pop();
    assert_eq!(table.depth(), depth);
  }

  #[test]
  fn shadowing_an_outer_scope_does_not_touch_it() {
    let mut table = SymbolTable::new();
    table.push();
    table.declare_variable("x", Ty::Int, Line::new(1)).unwrap();
    table.assign("x", Value::Int(1));

    table.push();
    table.declare_variable("x", Ty::Bool, Line::new(2)).unwrap();
    table.assign("x", Value::Bool(true));
    assert_eq!(table.get_type("x"), Ty::Bool);
    table.pop();

    // The outer `x` is unaffected by the inner scope's shadow.
    assert_eq!(table.get_type("x"), Ty::Int);
    assert_eq!(table.value_of("x"), &Value::Int(1));
  }

  #[test]
  fn redeclaring_in_the_same_scope_is_rejected() {
    let mut table = SymbolTable::new();
    table.push();
    table.declare_variable("x", Ty::Int, Line::new(1)).unwrap();
    assert!(table.declare_variable("x", Ty::Int, Line::new(2)).is_err());
  }

  #[test]
  fn overload_identity_get_function_returns_the_declared_node() {
    let mut table = SymbolTable::new();
    table.push();
    let decl = function_decl("f", vec![Ty::Int], Ty::Int);
    table.declare_function("f", decl.clone(), Line::new(1)).unwrap();

    let found = table.get_function("f", &[Ty::Int]).unwrap();
    assert!(Rc::ptr_eq(&found, &decl));
  }

  #[test]
  fn declaring_the_same_signature_twice_is_rejected() {
    let mut table = SymbolTable::new();
    table.push();
    table.declare_function("f", function_decl("f", vec![Ty::Int], Ty::Int), Line::new(1)).unwrap();
    let err = table.declare_function("f", function_decl("f", vec![Ty::Int], Ty::Int), Line::new(2));
    assert!(err.is_err());
  }

  #[test]
  fn overloading_with_a_different_param_vector_is_allowed() {
    let mut table = SymbolTable::new();
    table.push();
    table.declare_function("f", function_decl("f", vec![Ty::Int], Ty::Int), Line::new(1)).unwrap();
    table.declare_function("f", function_decl("f", vec![Ty::Float], Ty::Int), Line::new(2)).unwrap();
    assert!(table.get_function("f", &[Ty::Int]).is_some());
    assert!(table.get_function("f", &[Ty::Float]).is_some());
  }

  #[test]
  fn overloading_with_a_different_return_type_is_rejected() {
    let mut table = SymbolTable::new();
    table.push();
    table.declare_function("f", function_decl("f", vec![Ty::Int], Ty::Int), Line::new(1)).unwrap();
    let err = table.declare_function("f", function_decl("f", vec![Ty::Float], Ty::Bool), Line::new(2));
    assert!(err.is_err());
  }
}
