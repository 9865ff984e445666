//! Static checking and execution for MiniLang, built on top of the
//! `minilang_syntax` lexer/parser crate.
//!
//! `minilang` itself only re-exports the two tree walkers
//! ([`check::Checker`], [`interp::Interpreter`]) plus the runtime value
//! type and XML printer that both consume the parser's output
//! ([`syntax::parse`]); the binary in `src/main.rs` wires them into a
//! command-line driver.

pub mod check;
pub mod interp;
pub mod symbol;
pub mod value;
pub mod xml;

pub use check::Checker;
pub use interp::Interpreter;
pub use value::Value;

use diag::Result;
use syntax::ast::Program;

/// Checks then runs `program`, writing `print` output to `out`. The two
/// phases share nothing but the AST: each walker owns its own
/// [`symbol::SymbolTable`], built fresh, matching the source's two
/// independent top-level visitor instances.
pub fn check_and_run(program: &Program, out: impl std::io::Write + 'static) -> Result<()> {
  Checker::new().check_program(program)?;
  Interpreter::with_output(Box::new(out)).run(program)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_ill_typed_programs_before_running_anything() {
    let program = syntax::parse(r#"let x : int = "hi";"#).unwrap();
    let err = check_and_run(&program, Vec::new()).unwrap_err();
    assert!(err.to_string().contains("Cannot assign"));
  }

  #[test]
  fn well_typed_programs_run_to_completion() {
    let program = syntax::parse("let x : int = 1; print x;").unwrap();
    check_and_run(&program, std::io::sink()).unwrap();
  }
}
