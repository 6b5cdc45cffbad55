//! Surface (concrete) syntax: the untyped AST the parser produces, and
//! the statements a script or REPL line desugars to.
//!
//! This module, `lexer`, `parser`, and `translation` together turn
//! source text into core syntax. `Term` is deliberately thin: it
//! carries no resource-usage *checking* of its own, only enough
//! structure for `translation::ToCore` to desugar into
//! `core::syntax::{ITerm, CTerm}`.

pub mod lexer;
pub mod parser;
pub mod translation;

use crate::semiring::Q;

pub use parser::{parse_stmt, parse_stmts, parse_term, ParseError};
pub use translation::{to_core_chk, to_core_inf, to_core_stmt, CoreStmt, ToCore, TranslationError};

/// A surface-level binder: `q name : ty`, as introduced by `assume` or
/// a `Pi`/`MPairType`/λ parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub usage: Q,
    pub ty: Term,
}

/// The untyped surface syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(String),
    Ann(Box<Term>, Box<Term>),
    App(Box<Term>, Box<Term>),
    Lam(Vec<String>, Box<Term>),
    Universe,
    Pi(Q, Vec<String>, Box<Term>, Box<Term>),
    MPairType(Q, Vec<String>, Box<Term>, Box<Term>),
    MPair(Box<Term>, Box<Term>),
    MUnitType,
    MUnit,
    /// `let ⟨x, y⟩ = scrutinee return ret in body` — `ret` is written in
    /// a scope where the implicit name `it` stands for the scrutinee
    /// (see `translation` for how `it` is bound).
    MPairElim(Box<Term>, (String, String), Box<Term>, Box<Term>),
    APairType(Box<Term>, Box<Term>),
    APair(Box<Term>, Box<Term>),
    AUnitType,
    AUnit,
    /// `let <> = scrutinee return ret in body`.
    MUnitElim(Box<Term>, Box<Term>, Box<Term>),
    Fst(Box<Term>),
    Snd(Box<Term>),
}

/// A single top-level statement a script or REPL line desugars to.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assume(Vec<Binding>),
    Let(Q, String, Term),
    Eval(Q, Term),
    /// `:type <expr>` — infer and print only `<expr>`'s type, never its
    /// normal form.
    TypeQuery(Term),
    PutStrLn(String),
    Out(String),
}
