//! `ToCore`: lowering `concrete::Term`/`Stmt` into the de Bruijn-indexed
//! `ITerm`/`CTerm` the checker actually runs on, mirroring the
//! teacher's `concrete_to_core` pass — a name-resolution stack walked
//! while recursing, rather than a separate renaming phase.
//!
//! The split between `to_core_inf`/`to_core_chk` follows `ITerm`/`CTerm`'s
//! own inferable/checkable split: a `Var`, `App`, `Ann`, `Fst`, `Snd`, or
//! eliminator translates directly to an `ITerm`; everything else (a
//! `Lam`, a type former, a pair/unit introduction) only makes sense
//! against an expected type and so only has a `CTerm` translation,
//! reached from an inferable context by way of `Ann`.

use std::rc::Rc;

use crate::core::syntax::{CTerm, ITerm, Name};
use crate::semiring::Q;
use crate::syntax::{Stmt, Term};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TranslationError {
    #[error("`{0}` is not in an inferable position here; annotate it with `: type`")]
    NotInferable(&'static str),
}

pub type Result<T> = std::result::Result<T, TranslationError>;

/// A translated top-level form: `assume`/`let` extend the checker's
/// context as a side effect in `repl`, so translation only has to
/// produce the core term each carries.
pub enum CoreStmt {
    Assume(Vec<(String, Q, CTerm)>),
    Let(Q, String, ITerm),
    Eval(Q, ITerm),
    TypeQuery(ITerm),
    PutStrLn(String),
    Out(String),
}

/// Find `name`'s de Bruijn index by scanning the binder stack
/// innermost-first (the most recently pushed name is index `0`).
fn resolve(scope: &[String], name: &str) -> Option<usize> {
    scope.iter().rev().position(|bound| bound == name)
}

/// Lower a term known to be in inferable position.
pub fn to_core_inf(term: &Term, scope: &mut Vec<String>) -> Result<ITerm> {
    match term {
        Term::Var(name) => match resolve(scope, name) {
            Some(index) => Ok(ITerm::Bound(index)),
            None => Ok(ITerm::Free(Name::global(name.clone()))),
        },

        Term::Ann(expr, ty) => {
            let expr_chk = to_core_chk(expr, scope)?;
            let ty_chk = to_core_chk(ty, scope)?;
            Ok(ITerm::Ann(Rc::new(expr_chk), Rc::new(ty_chk)))
        },

        Term::App(f, arg) => {
            let f_inf = to_core_inf(f, scope)?;
            let arg_chk = to_core_chk(arg, scope)?;
            Ok(ITerm::App(Rc::new(f_inf), Rc::new(arg_chk)))
        },

        Term::Fst(pair) => Ok(ITerm::Fst(Rc::new(to_core_inf(pair, scope)?))),
        Term::Snd(pair) => Ok(ITerm::Snd(Rc::new(to_core_inf(pair, scope)?))),

        Term::MPairElim(scrutinee, (x, y), ret, body) => {
            let scrutinee_inf = to_core_inf(scrutinee, scope)?;

            scope.push("it".to_string());
            let ret_chk = to_core_chk(ret, scope)?;
            scope.pop();

            scope.push(x.clone());
            scope.push(y.clone());
            let body_chk = to_core_chk(body, scope)?;
            scope.pop();
            scope.pop();

            Ok(ITerm::MPairElim(Rc::new(scrutinee_inf), Rc::new(body_chk), Rc::new(ret_chk)))
        },

        Term::MUnitElim(scrutinee, ret, body) => {
            let scrutinee_inf = to_core_inf(scrutinee, scope)?;

            scope.push("it".to_string());
            let ret_chk = to_core_chk(ret, scope)?;
            scope.pop();

            let body_chk = to_core_chk(body, scope)?;

            Ok(ITerm::MUnitElim(Rc::new(scrutinee_inf), Rc::new(body_chk), Rc::new(ret_chk)))
        },

        Term::Lam(..)
        | Term::Universe
        | Term::Pi(..)
        | Term::MPairType(..)
        | Term::MPair(..)
        | Term::MUnitType
        | Term::MUnit
        | Term::APairType(..)
        | Term::APair(..)
        | Term::AUnitType
        | Term::AUnit => Err(TranslationError::NotInferable(term_label(term))),
    }
}

/// Lower a term in checkable position: an inferable form is embedded via
/// `CTerm::Inf`, everything else has a direct checkable translation.
pub fn to_core_chk(term: &Term, scope: &mut Vec<String>) -> Result<CTerm> {
    match term {
        Term::Lam(names, body) => build_lam(names, body, scope),

        Term::Universe => Ok(CTerm::Universe),

        Term::Pi(q, names, ann, body) => build_pi(*q, names, ann, body, scope),
        Term::MPairType(q, names, ann, body) => build_mpair_type(*q, names, ann, body, scope),
        Term::APairType(a, b) => {
            // Non-dependent surface sugar: the second component is
            // translated under one anonymous binder the body never
            // mentions, matching `core::syntax::CTerm::APairType`'s
            // binder-carrying second component.
            let a_chk = to_core_chk(a, scope)?;
            scope.push("_".to_string());
            let b_chk = to_core_chk(b, scope)?;
            scope.pop();
            Ok(CTerm::APairType(Rc::new(a_chk), Rc::new(b_chk)))
        },

        Term::MPair(a, b) => {
            let a_chk = to_core_chk(a, scope)?;
            let b_chk = to_core_chk(b, scope)?;
            Ok(CTerm::MPair(Rc::new(a_chk), Rc::new(b_chk)))
        },
        Term::APair(a, b) => {
            let a_chk = to_core_chk(a, scope)?;
            let b_chk = to_core_chk(b, scope)?;
            Ok(CTerm::APair(Rc::new(a_chk), Rc::new(b_chk)))
        },

        Term::MUnitType => Ok(CTerm::MUnitType),
        Term::MUnit => Ok(CTerm::MUnit),
        Term::AUnitType => Ok(CTerm::AUnitType),
        Term::AUnit => Ok(CTerm::AUnit),

        // Every inferable form embeds into checkable position as-is.
        Term::Var(..)
        | Term::Ann(..)
        | Term::App(..)
        | Term::Fst(..)
        | Term::Snd(..)
        | Term::MPairElim(..)
        | Term::MUnitElim(..) => Ok(CTerm::inf(to_core_inf(term, scope)?)),
    }
}

fn build_lam(names: &[String], body: &Term, scope: &mut Vec<String>) -> Result<CTerm> {
    match names.split_first() {
        None => to_core_chk(body, scope),
        Some((first, rest)) => {
            scope.push(first.clone());
            let inner = build_lam(rest, body, scope)?;
            scope.pop();
            Ok(CTerm::Lam(Rc::new(inner)))
        },
    }
}

fn build_pi(q: Q, names: &[String], ann: &Term, body: &Term, scope: &mut Vec<String>) -> Result<CTerm> {
    match names.split_first() {
        None => to_core_chk(body, scope),
        Some((first, rest)) => {
            // Re-translated at this nesting's own scope depth, so a
            // dependency of `ann` on an already-bound outer name picks
            // up the correct (shifted) index at every binder in the
            // group, rather than reusing one fixed translation.
            let ann_chk = to_core_chk(ann, scope)?;
            scope.push(first.clone());
            let inner = build_pi(q, rest, ann, body, scope)?;
            scope.pop();
            Ok(CTerm::Pi(q, Rc::new(ann_chk), Rc::new(inner)))
        },
    }
}

fn build_mpair_type(q: Q, names: &[String], ann: &Term, body: &Term, scope: &mut Vec<String>) -> Result<CTerm> {
    match names.split_first() {
        None => to_core_chk(body, scope),
        Some((first, rest)) => {
            let ann_chk = to_core_chk(ann, scope)?;
            scope.push(first.clone());
            let inner = build_mpair_type(q, rest, ann, body, scope)?;
            scope.pop();
            Ok(CTerm::MPairType(q, Rc::new(ann_chk), Rc::new(inner)))
        },
    }
}

fn term_label(term: &Term) -> &'static str {
    match term {
        Term::Lam(..) => "a λ-abstraction",
        Term::Universe => "𝘜",
        Term::Pi(..) => "a Π-type",
        Term::MPairType(..) => "a multiplicative pair type",
        Term::MPair(..) => "a multiplicative pair",
        Term::MUnitType => "I",
        Term::MUnit => "the multiplicative unit",
        Term::APairType(..) => "an additive pair type",
        Term::APair(..) => "an additive pair",
        Term::AUnitType => "⊤",
        Term::AUnit => "the additive unit",
        _ => "this term",
    }
}

/// Lower a whole top-level statement. `Assume`'s bindings translate
/// their types at the scope built up from the *earlier* bindings in the
/// same statement, matching `assume`'s left-to-right dependency order.
pub fn to_core_stmt(stmt: &Stmt) -> Result<CoreStmt> {
    match stmt {
        Stmt::Assume(bindings) => {
            let mut scope = Vec::new();
            let mut out = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let ty_chk = to_core_chk(&binding.ty, &mut scope)?;
                out.push((binding.name.clone(), binding.usage, ty_chk));
                scope.push(binding.name.clone());
            }
            Ok(CoreStmt::Assume(out))
        },
        Stmt::Let(q, name, term) => {
            let mut scope = Vec::new();
            Ok(CoreStmt::Let(*q, name.clone(), to_core_inf_or_ann(term, &mut scope)?))
        },
        Stmt::Eval(q, term) => {
            let mut scope = Vec::new();
            Ok(CoreStmt::Eval(*q, to_core_inf_or_ann(term, &mut scope)?))
        },
        Stmt::TypeQuery(term) => {
            let mut scope = Vec::new();
            Ok(CoreStmt::TypeQuery(to_core_inf_or_ann(term, &mut scope)?))
        },
        Stmt::PutStrLn(s) => Ok(CoreStmt::PutStrLn(s.clone())),
        Stmt::Out(s) => Ok(CoreStmt::Out(s.clone())),
    }
}

/// `Stmt::Let`/`Stmt::Eval` carry an `ITerm`, but the surface term they
/// wrap is often a bare checkable form (a lambda, a pair) that only
/// type-checks once annotated — `Ann` is itself inferable, so this just
/// dispatches to `to_core_inf` and lets its own `NotInferable` surface
/// for anything that truly needs an explicit `: type` the user omitted.
fn to_core_inf_or_ann(term: &Term, scope: &mut Vec<String>) -> Result<ITerm> {
    to_core_inf(term, scope)
}

/// Translate a standalone term directly, as the REPL's bare-expression
/// entry needs to before wrapping it in `Stmt::Eval`.
pub trait ToCore<T> {
    fn to_core(&self, scope: &mut Vec<String>) -> Result<T>;
}

impl ToCore<ITerm> for Term {
    fn to_core(&self, scope: &mut Vec<String>) -> Result<ITerm> {
        to_core_inf(self, scope)
    }
}

impl ToCore<CTerm> for Term {
    fn to_core(&self, scope: &mut Vec<String>) -> Result<CTerm> {
        to_core_chk(self, scope)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::syntax::Name;

    #[test]
    fn a_free_variable_not_in_scope_translates_to_a_global() {
        let mut scope = Vec::new();
        let term = to_core_inf(&Term::Var("a".to_string()), &mut scope).unwrap();
        assert_eq!(term, ITerm::Free(Name::global("a")));
    }

    #[test]
    fn a_lambda_bound_variable_translates_to_bound_zero() {
        let mut scope = Vec::new();
        let lam = Term::Lam(vec!["x".to_string()], Box::new(Term::Var("x".to_string())));
        let core = to_core_chk(&lam, &mut scope).unwrap();
        assert_eq!(core, CTerm::Lam(Rc::new(CTerm::inf(ITerm::Bound(0)))));
    }

    #[test]
    fn nested_lambda_binders_shadow_with_increasing_indices() {
        let mut scope = Vec::new();
        let lam = Term::Lam(
            vec!["x".to_string(), "y".to_string()],
            Box::new(Term::Var("x".to_string())),
        );
        let core = to_core_chk(&lam, &mut scope).unwrap();
        assert_eq!(core, CTerm::Lam(Rc::new(CTerm::Lam(Rc::new(CTerm::inf(ITerm::Bound(1)))))));
    }

    #[test]
    fn a_dependent_pi_binder_group_desugars_to_nested_pis() {
        let mut scope = Vec::new();
        let pi = Term::Pi(
            Q::Zero,
            vec!["x".to_string(), "y".to_string()],
            Box::new(Term::Universe),
            Box::new(Term::Var("x".to_string())),
        );
        let core = to_core_chk(&pi, &mut scope).unwrap();
        assert_eq!(
            core,
            CTerm::Pi(
                Q::Zero,
                Rc::new(CTerm::Universe),
                Rc::new(CTerm::Pi(
                    Q::Zero,
                    Rc::new(CTerm::Universe),
                    Rc::new(CTerm::inf(ITerm::Bound(1))),
                )),
            )
        );
    }

    #[test]
    fn application_translates_the_function_as_inferable_and_the_argument_as_checkable() {
        let mut scope = Vec::new();
        let app = Term::App(
            Box::new(Term::Var("f".to_string())),
            Box::new(Term::Var("x".to_string())),
        );
        let core = to_core_inf(&app, &mut scope).unwrap();
        assert_eq!(
            core,
            ITerm::App(
                Rc::new(ITerm::Free(Name::global("f"))),
                Rc::new(CTerm::inf(ITerm::Free(Name::global("x")))),
            )
        );
    }

    #[test]
    fn a_bare_lambda_is_not_inferable_without_an_annotation() {
        let mut scope = Vec::new();
        let lam = Term::Lam(vec!["x".to_string()], Box::new(Term::Var("x".to_string())));
        assert!(matches!(to_core_inf(&lam, &mut scope), Err(TranslationError::NotInferable(_))));
    }

    #[test]
    fn an_annotated_lambda_is_inferable() {
        let mut scope = Vec::new();
        let lam = Term::Lam(vec!["x".to_string()], Box::new(Term::Var("x".to_string())));
        let ty = Term::Pi(Q::One, vec!["_".to_string()], Box::new(Term::Universe), Box::new(Term::Universe));
        let ann = Term::Ann(Box::new(lam), Box::new(ty));
        assert!(to_core_inf(&ann, &mut scope).is_ok());
    }

    #[test]
    fn a_multiplicative_pair_elimination_binds_outer_to_one_and_inner_to_zero() {
        let mut scope = Vec::new();
        let term = Term::MPairElim(
            Box::new(Term::Var("p".to_string())),
            ("x".to_string(), "y".to_string()),
            Box::new(Term::Universe),
            Box::new(Term::App(
                Box::new(Term::Var("x".to_string())),
                Box::new(Term::Var("y".to_string())),
            )),
        );
        let core = to_core_inf(&term, &mut scope).unwrap();
        match core {
            ITerm::MPairElim(_, body, _) => match &*body {
                CTerm::Inf(app) => match &**app {
                    ITerm::App(f, arg) => {
                        assert_eq!(**f, ITerm::Bound(1));
                        assert_eq!(**arg, CTerm::inf(ITerm::Bound(0)));
                    },
                    other => panic!("expected App, got {:?}", other),
                },
                other => panic!("expected Inf, got {:?}", other),
            },
            other => panic!("expected MPairElim, got {:?}", other),
        }
    }
}
