//! Evaluation, quotation, and substitution — the NbE kernel.
//!
//! `eval_*` interprets terms into the semantic domain (`Value`); `quote`
//! is its inverse, turning a value back into β-normal syntax by probing
//! closures with fresh `Quote` markers. `subst_*` is a separate,
//! purely syntactic de Bruijn substitution used by the checker itself
//! to open binders and to instantiate eliminators' motives — it never
//! touches the semantic domain.
//!
//! The evaluator is total on well-typed input; `typing` guarantees it is
//! never asked to reduce anything else.

use std::rc::Rc;

use log::trace;

use crate::core::syntax::{CTerm, ITerm, Name, RcCTerm, RcITerm};
use crate::core::value::{vfree, Closure, Env, Neutral, RcValue, Value};

/// Evaluate an inferable term under an environment: `Γ ⊢ t ⇒ v`.
pub fn eval_inf(env: &Env, term: &ITerm) -> RcValue {
    trace!("eval_inf");
    match term {
        ITerm::Ann(expr, _ty) => eval_chk(env, expr),

        ITerm::Bound(index) => env
            .lookup_local(*index)
            .unwrap_or_else(|| panic!("internal error: unbound Bound({}) reached eval", index)),

        ITerm::Free(Name::Global(name)) => env
            .lookup_global(name)
            .unwrap_or_else(|| vfree(Name::Global(name.clone()))),
        ITerm::Free(name) => vfree(name.clone()),

        ITerm::App(fn_expr, arg) => {
            let fn_value = eval_inf(env, fn_expr);
            let arg_value = eval_chk(env, arg);
            apply(&fn_value, arg_value)
        },

        ITerm::MPairElim(scrutinee, body, ret) => {
            let scrutinee_value = eval_inf(env, scrutinee);
            match &*scrutinee_value {
                Value::VMPair(a, b) => {
                    Closure::new(env.clone(), body.clone()).apply2(a.clone(), b.clone())
                },
                Value::VNeutral(n) => Rc::new(Value::VNeutral(Neutral::NMPairElim(
                    Rc::new(n.clone()),
                    Closure::new(env.clone(), body.clone()),
                    Closure::new(env.clone(), ret.clone()),
                ))),
                _ => panic!("internal error: MPairElim scrutinee is not a multiplicative pair"),
            }
        },

        ITerm::MUnitElim(scrutinee, body, ret) => {
            let scrutinee_value = eval_inf(env, scrutinee);
            match &*scrutinee_value {
                Value::VMUnit => Closure::new(env.clone(), body.clone()).force(),
                Value::VNeutral(n) => Rc::new(Value::VNeutral(Neutral::NMUnitElim(
                    Rc::new(n.clone()),
                    Closure::new(env.clone(), body.clone()),
                    Closure::new(env.clone(), ret.clone()),
                ))),
                _ => panic!("internal error: MUnitElim scrutinee is not the multiplicative unit"),
            }
        },

        ITerm::Fst(pair) => match &*eval_inf(env, pair) {
            Value::VAPair(a, _) => a.clone(),
            Value::VNeutral(n) => Rc::new(Value::VNeutral(Neutral::NFst(Rc::new(n.clone())))),
            _ => panic!("internal error: Fst scrutinee is not an additive pair"),
        },

        ITerm::Snd(pair) => match &*eval_inf(env, pair) {
            Value::VAPair(_, b) => b.clone(),
            Value::VNeutral(n) => Rc::new(Value::VNeutral(Neutral::NSnd(Rc::new(n.clone())))),
            _ => panic!("internal error: Snd scrutinee is not an additive pair"),
        },
    }
}

/// Evaluate a checkable term under an environment: `Γ ⊢ t ⇒ v`.
pub fn eval_chk(env: &Env, term: &CTerm) -> RcValue {
    trace!("eval_chk");
    match term {
        CTerm::Inf(e) => eval_inf(env, e),
        CTerm::Lam(body) => Rc::new(Value::VLam(Closure::new(env.clone(), body.clone()))),
        CTerm::Universe => Rc::new(Value::VUniverse),
        CTerm::Pi(q, a, b) => Rc::new(Value::VPi(
            *q,
            eval_chk(env, a),
            Closure::new(env.clone(), b.clone()),
        )),
        CTerm::MPairType(q, a, b) => Rc::new(Value::VMPairType(
            *q,
            eval_chk(env, a),
            Closure::new(env.clone(), b.clone()),
        )),
        CTerm::MPair(a, b) => Rc::new(Value::VMPair(eval_chk(env, a), eval_chk(env, b))),
        CTerm::MUnitType => Rc::new(Value::VMUnitType),
        CTerm::MUnit => Rc::new(Value::VMUnit),
        CTerm::APairType(a, b) => {
            Rc::new(Value::VAPairType(eval_chk(env, a), Closure::new(env.clone(), b.clone())))
        },
        CTerm::APair(a, b) => Rc::new(Value::VAPair(eval_chk(env, a), eval_chk(env, b))),
        CTerm::AUnitType => Rc::new(Value::VAUnitType),
        CTerm::AUnit => Rc::new(Value::VAUnit),
    }
}

fn apply(fn_value: &RcValue, arg: RcValue) -> RcValue {
    match &**fn_value {
        Value::VLam(closure) => closure.apply(arg),
        Value::VNeutral(n) => Rc::new(Value::VNeutral(Neutral::NApp(Rc::new(n.clone()), arg))),
        _ => panic!("internal error: application of a non-function value"),
    }
}

/// `quote0(v) = quote(0, v)`.
pub fn quote0(value: &RcValue) -> CTerm {
    quote(0, value)
}

/// The inverse of evaluation: probe every closure with a fresh
/// `Quote(level)` marker and rebuild checkable syntax. `level` is the
/// number of binders already opened on the current path, i.e. the next
/// fresh de Bruijn level to mint.
pub fn quote(level: usize, value: &RcValue) -> CTerm {
    match &**value {
        Value::VLam(closure) => {
            let body = closure.apply(vfree(Name::Quote(level)));
            CTerm::Lam(Rc::new(quote(level + 1, &body)))
        },
        Value::VUniverse => CTerm::Universe,
        Value::VPi(q, a, b) => {
            let a_term = quote(level, a);
            let b_value = b.apply(vfree(Name::Quote(level)));
            let b_term = quote(level + 1, &b_value);
            CTerm::Pi(*q, Rc::new(a_term), Rc::new(b_term))
        },
        Value::VMPairType(q, a, b) => {
            let a_term = quote(level, a);
            let b_value = b.apply(vfree(Name::Quote(level)));
            let b_term = quote(level + 1, &b_value);
            CTerm::MPairType(*q, Rc::new(a_term), Rc::new(b_term))
        },
        Value::VMPair(a, b) => {
            CTerm::MPair(Rc::new(quote(level, a)), Rc::new(quote(level, b)))
        },
        Value::VMUnitType => CTerm::MUnitType,
        Value::VMUnit => CTerm::MUnit,
        Value::VAPairType(a, b) => {
            let a_term = quote(level, a);
            let b_value = b.apply(vfree(Name::Quote(level)));
            let b_term = quote(level + 1, &b_value);
            CTerm::APairType(Rc::new(a_term), Rc::new(b_term))
        },
        Value::VAPair(a, b) => {
            CTerm::APair(Rc::new(quote(level, a)), Rc::new(quote(level, b)))
        },
        Value::VAUnitType => CTerm::AUnitType,
        Value::VAUnit => CTerm::AUnit,
        Value::VNeutral(n) => CTerm::Inf(Rc::new(quote_neutral(level, n))),
    }
}

/// Quote the spine of a stuck computation back to an `ITerm`.
fn quote_neutral(level: usize, neutral: &Neutral) -> ITerm {
    match neutral {
        Neutral::NFree(Name::Quote(quote_level)) => {
            // A quote marker minted earlier on this same path: convert
            // the level back into a de Bruijn index relative to here.
            ITerm::Bound(level - quote_level - 1)
        },
        Neutral::NFree(name) => ITerm::Free(name.clone()),
        Neutral::NApp(fn_neutral, arg) => {
            ITerm::App(Rc::new(quote_neutral(level, fn_neutral)), Rc::new(quote(level, arg)))
        },
        Neutral::NFst(pair) => ITerm::Fst(Rc::new(quote_neutral(level, pair))),
        Neutral::NSnd(pair) => ITerm::Snd(Rc::new(quote_neutral(level, pair))),
        Neutral::NMPairElim(scrutinee, body, ret) => {
            let scrutinee_term = quote_neutral(level, scrutinee);
            let body_value = body.apply2(vfree(Name::Quote(level)), vfree(Name::Quote(level + 1)));
            let body_term = quote(level + 2, &body_value);
            let ret_value = ret.apply(vfree(Name::Quote(level)));
            let ret_term = quote(level + 1, &ret_value);
            ITerm::MPairElim(Rc::new(scrutinee_term), Rc::new(body_term), Rc::new(ret_term))
        },
        Neutral::NMUnitElim(scrutinee, body, ret) => {
            let scrutinee_term = quote_neutral(level, scrutinee);
            let body_term = quote(level, &body.force());
            let ret_value = ret.apply(vfree(Name::Quote(level)));
            let ret_term = quote(level + 1, &ret_value);
            ITerm::MUnitElim(Rc::new(scrutinee_term), Rc::new(body_term), Rc::new(ret_term))
        },
    }
}

/// Definitional equality: two values are equal exactly when their
/// `quote0` forms are syntactically (α-invariantly) equal.
pub fn values_equal(a: &RcValue, b: &RcValue) -> bool {
    quote0(a) == quote0(b)
}

/// Capture-avoiding substitution of `Bound(depth)` by `replacement` in
/// an inferable term, shifting `depth` up by one for every binder
/// descended into.
pub fn subst_inf(depth: usize, replacement: &RcITerm, term: &ITerm) -> ITerm {
    match term {
        ITerm::Ann(expr, ty) => ITerm::Ann(
            Rc::new(subst_chk(depth, replacement, expr)),
            Rc::new(subst_chk(depth, replacement, ty)),
        ),
        ITerm::Bound(index) => {
            if *index == depth {
                (**replacement).clone()
            } else {
                ITerm::Bound(*index)
            }
        },
        ITerm::Free(name) => ITerm::Free(name.clone()),
        ITerm::App(f, arg) => ITerm::App(
            Rc::new(subst_inf(depth, replacement, f)),
            Rc::new(subst_chk(depth, replacement, arg)),
        ),
        ITerm::MPairElim(scrutinee, body, ret) => ITerm::MPairElim(
            Rc::new(subst_inf(depth, replacement, scrutinee)),
            Rc::new(subst_chk(depth + 2, replacement, body)),
            Rc::new(subst_chk(depth + 1, replacement, ret)),
        ),
        ITerm::MUnitElim(scrutinee, body, ret) => ITerm::MUnitElim(
            Rc::new(subst_inf(depth, replacement, scrutinee)),
            Rc::new(subst_chk(depth, replacement, body)),
            Rc::new(subst_chk(depth + 1, replacement, ret)),
        ),
        ITerm::Fst(pair) => ITerm::Fst(Rc::new(subst_inf(depth, replacement, pair))),
        ITerm::Snd(pair) => ITerm::Snd(Rc::new(subst_inf(depth, replacement, pair))),
    }
}

/// As `subst_inf`, for checkable terms.
pub fn subst_chk(depth: usize, replacement: &RcITerm, term: &CTerm) -> CTerm {
    match term {
        CTerm::Inf(e) => CTerm::Inf(Rc::new(subst_inf(depth, replacement, e))),
        CTerm::Lam(body) => CTerm::Lam(Rc::new(subst_chk(depth + 1, replacement, body))),
        CTerm::Universe => CTerm::Universe,
        CTerm::Pi(q, a, b) => CTerm::Pi(
            *q,
            Rc::new(subst_chk(depth, replacement, a)),
            Rc::new(subst_chk(depth + 1, replacement, b)),
        ),
        CTerm::MPairType(q, a, b) => CTerm::MPairType(
            *q,
            Rc::new(subst_chk(depth, replacement, a)),
            Rc::new(subst_chk(depth + 1, replacement, b)),
        ),
        CTerm::MPair(a, b) => CTerm::MPair(
            Rc::new(subst_chk(depth, replacement, a)),
            Rc::new(subst_chk(depth, replacement, b)),
        ),
        CTerm::MUnitType => CTerm::MUnitType,
        CTerm::MUnit => CTerm::MUnit,
        CTerm::APairType(a, b) => CTerm::APairType(
            Rc::new(subst_chk(depth, replacement, a)),
            Rc::new(subst_chk(depth + 1, replacement, b)),
        ),
        CTerm::APair(a, b) => CTerm::APair(
            Rc::new(subst_chk(depth, replacement, a)),
            Rc::new(subst_chk(depth, replacement, b)),
        ),
        CTerm::AUnitType => CTerm::AUnitType,
        CTerm::AUnit => CTerm::AUnit,
    }
}

/// Open the outermost binder of a checkable term by substituting
/// `Bound(0)` with a fresh free variable, shifting nothing else.
pub fn open_chk(replacement_name: Name, term: &RcCTerm) -> CTerm {
    let replacement = Rc::new(ITerm::Free(replacement_name));
    subst_chk(0, &replacement, term)
}

/// Open the two outermost binders of a checkable term at once, as the
/// `⟨x, y⟩` motive of an `MPairElim` body needs: `outer_name` takes the
/// place of `Bound(1)` (the pair's first component) and `inner_name`
/// the place of `Bound(0)` (the second), mirroring `Closure::apply2`'s
/// binding order.
pub fn open2_chk(outer_name: Name, inner_name: Name, term: &RcCTerm) -> CTerm {
    let inner = Rc::new(ITerm::Free(inner_name));
    let once = Rc::new(subst_chk(0, &inner, term));
    let outer = Rc::new(ITerm::Free(outer_name));
    subst_chk(1, &outer, &once)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::semiring::Q;

    fn id_fn() -> CTerm {
        // \x. x
        CTerm::Lam(Rc::new(CTerm::inf(ITerm::Bound(0))))
    }

    #[test]
    fn evaluating_identity_yields_a_lambda_closure() {
        let env = Env::new();
        let value = eval_chk(&env, &id_fn());
        match &*value {
            Value::VLam(_) => {},
            _ => panic!("expected VLam"),
        }
    }

    #[test]
    fn quote_round_trips_the_identity_function() {
        let env = Env::new();
        let value = eval_chk(&env, &id_fn());
        assert_eq!(quote0(&value), id_fn());
    }

    #[test]
    fn quote_is_idempotent_on_already_normal_values() {
        let env = Env::new();
        let value = eval_chk(&env, &id_fn());
        let quoted_once = quote0(&value);
        let re_evaluated = eval_chk(&env, &quoted_once);
        assert_eq!(quote0(&re_evaluated), quoted_once);
    }

    #[test]
    fn beta_reduction_through_application() {
        // (\x. x) Type  ⇒  Type
        let env = Env::new();
        let fn_value = eval_chk(&env, &id_fn());
        let result = apply(&fn_value, Rc::new(Value::VUniverse));
        assert_eq!(quote0(&result), CTerm::Universe);
    }

    #[test]
    fn stuck_application_quotes_back_to_a_neutral_app() {
        let env = Env::new();
        let f = vfree(Name::global("f"));
        let arg = Rc::new(Value::VUniverse);
        let result = apply(&f, arg);
        assert_eq!(
            quote0(&result),
            CTerm::inf(ITerm::App(
                Rc::new(ITerm::Free(Name::global("f"))),
                Rc::new(CTerm::Universe),
            )),
        );
    }

    #[test]
    fn open2_chk_binds_outer_to_index_one_and_inner_to_index_zero() {
        // Bound(1) is the outer slot (x), Bound(0) the inner slot (y).
        let term = Rc::new(CTerm::MPair(
            Rc::new(CTerm::inf(ITerm::Bound(1))),
            Rc::new(CTerm::inf(ITerm::Bound(0))),
        ));
        let opened = open2_chk(Name::global("x"), Name::global("y"), &term);
        assert_eq!(
            opened,
            CTerm::MPair(
                Rc::new(CTerm::inf(ITerm::Free(Name::global("x")))),
                Rc::new(CTerm::inf(ITerm::Free(Name::global("y")))),
            )
        );
    }

    #[test]
    fn subst_replaces_matching_bound_index_only() {
        let replacement = Rc::new(ITerm::Free(Name::global("x")));
        let term = CTerm::Pi(Q::one(), Rc::new(CTerm::Universe), Rc::new(CTerm::inf(ITerm::Bound(1))));
        let result = subst_chk(0, &replacement, &term);
        match result {
            CTerm::Pi(_, _, body) => match &*body {
                CTerm::Inf(e) => assert_eq!(**e, ITerm::Free(Name::global("x"))),
                _ => panic!("expected Inf"),
            },
            _ => panic!("expected Pi"),
        }
    }
}
