//! The bidirectional, usage-counting judgment: the heart of the
//! checker.
//!
//! Two mutually recursive faces — `i_type` (inference, `Γ ⊢ e ⇒ (Usage,
//! τ)`) and `c_type` (checking, `Γ ⊢ e ⇐ τ → Usage`) — are wrapped by
//! the single public entry point [`i_type0`], which layers the outer
//! usage-scaling and final multiplicity check on top of them.
//!
//! Binder discipline follows one consistent combinator style,
//! `with_local`/`with_local2` (see the open-question note in
//! `DESIGN.md`): opening, checking the body, and discharging are always
//! one call.

pub mod errors;

use std::rc::Rc;

use log::{debug, trace};

pub use errors::{Error, InternalError, Offender, Result, TypeError};

use crate::context::{Context, Usage};
use crate::core::eval::{eval_chk, eval_inf, open2_chk, open_chk, values_equal};
use crate::core::syntax::{CTerm, ITerm, Name};
use crate::core::value::{vfree, Closure, RcValue, Value};
use crate::semiring::{Q, R};

fn universe() -> RcValue {
    Rc::new(Value::VUniverse)
}

/// Verify that type-checking a *type* produced no runtime usage; a
/// non-zero entry here is an internal bug, not a user error.
fn assert_erased(usage: &Usage) -> Result<()> {
    for (name, q) in usage.iter() {
        if *q != Q::Zero {
            return Err(InternalError::NonZeroErasedUsage { name: name.clone() }.into());
        }
    }
    Ok(())
}

/// Check that `term` is a well-formed type (`Γ ⊢ term ⇐ 𝘜`), running at
/// relevance `Erased` against the erased shadow of `ctx`, and return its
/// normal form.
fn check_is_type(ctx: &Context, term: &crate::core::syntax::RcCTerm) -> Result<RcValue> {
    let erased_ctx = ctx.forget();
    let usage = c_type(&erased_ctx, R::Erased, term, &universe())?;
    assert_erased(&usage)?;
    Ok(eval_chk(&ctx.names, term))
}

/// Discharge a single local: verify its accumulated usage fits its
/// declared allowance and remove it from the outgoing usage map.
fn discharge(label: &'static str, name: &Name, declared: Q, ty: &RcValue, usage: Usage) -> Result<Usage> {
    let (used, rest) = usage.discharge(name);
    if !used.fits_in(declared) {
        return Err(TypeError::Multiplicity {
            label: Some(label.to_string()),
            offenders: vec![Offender { name: name.clone(), ty: ty.clone(), used, available: declared }],
        }
        .into());
    }
    debug!("discharged {} ({}) in {}", name, used, label);
    Ok(rest)
}

/// Discharge two locals at once, collecting every offender into a
/// single `Multiplicity` error when more than one fails (the shape
/// `MPairElim`'s `⟨x, y⟩` binder needs).
fn discharge2(
    label: &'static str,
    outer: (&Name, Q, &RcValue),
    inner: (&Name, Q, &RcValue),
    usage: Usage,
) -> Result<Usage> {
    let (used_inner, rest) = usage.discharge(inner.0);
    let (used_outer, rest) = rest.discharge(outer.0);

    let mut offenders = Vec::new();
    if !used_outer.fits_in(outer.1) {
        offenders.push(Offender { name: outer.0.clone(), ty: outer.2.clone(), used: used_outer, available: outer.1 });
    }
    if !used_inner.fits_in(inner.1) {
        offenders.push(Offender { name: inner.0.clone(), ty: inner.2.clone(), used: used_inner, available: inner.1 });
    }
    if !offenders.is_empty() {
        return Err(TypeError::Multiplicity { label: Some(label.to_string()), offenders }.into());
    }
    Ok(rest)
}

/// Type inference: `Γ ⊢ e ⇒ (Usage, τ)`.
fn i_type(ctx: &Context, r: R, term: &ITerm) -> Result<(Usage, RcValue)> {
    trace!("i_type at {}", r);
    match term {
        ITerm::Ann(expr, ty) => {
            let ty_value = check_is_type(ctx, ty)?;
            let usage = c_type(ctx, r, expr, &ty_value)?;
            Ok((usage, ty_value))
        },

        ITerm::Bound(index) => Err(InternalError::UnsubstitutedBound(*index).into()),

        ITerm::Free(name) => {
            let binding = ctx.lookup(name).ok_or_else(|| TypeError::UnknownVar { name: name.clone() })?;
            Ok((Usage::single(name.clone(), r.extend()), binding.ty.clone()))
        },

        ITerm::App(fn_expr, arg) => {
            let (fn_usage, fn_ty) = i_type(ctx, r, fn_expr)?;
            match &*fn_ty {
                Value::VPi(p, a, b) => {
                    let arg_value = eval_chk(&ctx.names, arg);
                    let s = *p * r.extend();
                    let usage = if s == Q::Zero {
                        // Discard the argument's usage: it is consumed
                        // nowhere at runtime, only at the type level.
                        c_type(ctx, R::Erased, arg, a)?;
                        fn_usage
                    } else {
                        let arg_usage = c_type(ctx, R::Present, arg, a)?;
                        fn_usage.combine(&arg_usage.scale(s))
                    };
                    Ok((usage, b.apply(arg_value)))
                },
                _ => Err(TypeError::ExpectedPi { found: fn_ty.clone() }.into()),
            }
        },

        ITerm::MPairElim(scrutinee, body, ret) => {
            let (scrutinee_usage, scrutinee_ty) = i_type(ctx, r, scrutinee)?;
            match &*scrutinee_ty {
                Value::VMPairType(p, a, b) => {
                    // The return motive is checked under a fresh, erased
                    // `z : A ⊗ B`.
                    let (z_name, ctx_z) = ctx.extend_local(Q::Zero, scrutinee_ty.clone());
                    let ret_opened = Rc::new(open_chk(z_name, ret));
                    check_is_type(&ctx_z, &ret_opened)?;

                    // The body is checked under fresh `x : A` and
                    // `y : B(x)`, with usages scaled by the scrutinee's
                    // own relevance.
                    let s = *p * r.extend();
                    let (x_name, ctx_x) = ctx.extend_local(s, a.clone());
                    let b_value = b.apply(vfree(x_name.clone()));
                    let (y_name, ctx_xy) = ctx_x.extend_local(r.extend(), b_value);

                    let body_opened = Rc::new(open2_chk(x_name.clone(), y_name.clone(), body));
                    let pair_value =
                        Rc::new(Value::VMPair(vfree(x_name.clone()), vfree(y_name.clone())));
                    let expected_body_ty = Closure::new(ctx.names.clone(), ret.clone()).apply(pair_value);

                    let body_usage = c_type(&ctx_xy, r, &body_opened, &expected_body_ty)?;
                    let combined = scrutinee_usage.combine(&body_usage);
                    let result_usage = discharge2(
                        "the elimination of a multiplicative pair",
                        (&x_name, s, a),
                        (&y_name, r.extend(), &expected_body_ty),
                        combined,
                    )?;

                    let scrutinee_value = eval_inf(&ctx.names, scrutinee);
                    let result_ty = Closure::new(ctx.names.clone(), ret.clone()).apply(scrutinee_value);
                    Ok((result_usage, result_ty))
                },
                _ => Err(TypeError::ExpectedMPairType { found: scrutinee_ty.clone() }.into()),
            }
        },

        ITerm::MUnitElim(scrutinee, body, ret) => {
            let (scrutinee_usage, scrutinee_ty) = i_type(ctx, r, scrutinee)?;
            match &*scrutinee_ty {
                Value::VMUnitType => {
                    let (z_name, ctx_z) = ctx.extend_local(Q::Zero, scrutinee_ty.clone());
                    let ret_opened = Rc::new(open_chk(z_name, ret));
                    check_is_type(&ctx_z, &ret_opened)?;

                    let unit_value = Rc::new(Value::VMUnit);
                    let expected_body_ty = Closure::new(ctx.names.clone(), ret.clone()).apply(unit_value);
                    let body_usage = c_type(ctx, r, body, &expected_body_ty)?;

                    let scrutinee_value = eval_inf(&ctx.names, scrutinee);
                    let result_ty = Closure::new(ctx.names.clone(), ret.clone()).apply(scrutinee_value);
                    Ok((scrutinee_usage.combine(&body_usage), result_ty))
                },
                _ => Err(TypeError::ExpectedMUnitType { found: scrutinee_ty.clone() }.into()),
            }
        },

        ITerm::Fst(pair) => {
            let (usage, pair_ty) = i_type(ctx, r, pair)?;
            match &*pair_ty {
                Value::VAPairType(a, _) => Ok((usage, a.clone())),
                _ => Err(TypeError::ExpectedAPairType { found: pair_ty.clone() }.into()),
            }
        },

        ITerm::Snd(pair) => {
            let (usage, pair_ty) = i_type(ctx, r, pair)?;
            match &*pair_ty {
                Value::VAPairType(_, b) => {
                    let fst_value = eval_inf(&ctx.names, &ITerm::Fst(pair.clone()));
                    Ok((usage, b.apply(fst_value)))
                },
                _ => Err(TypeError::ExpectedAPairType { found: pair_ty.clone() }.into()),
            }
        },
    }
}

/// Type checking: `Γ ⊢ e ⇐ τ → Usage`.
fn c_type(ctx: &Context, r: R, term: &CTerm, expected: &RcValue) -> Result<Usage> {
    trace!("c_type at {}", r);
    match (term, &**expected) {
        (CTerm::Lam(body), Value::VPi(p, a, b)) => {
            let x_usage = *p * r.extend();
            let (x_name, ctx_x) = ctx.extend_local(x_usage, a.clone());
            let b_value = b.apply(vfree(x_name.clone()));
            let body_opened = Rc::new(open_chk(x_name.clone(), body));
            let body_usage = c_type(&ctx_x, r, &body_opened, &b_value)?;
            discharge("a λ-abstraction", &x_name, x_usage, a, body_usage)
        },

        (CTerm::MPair(e1, e2), Value::VMPairType(p, a, b)) => {
            let s = *p * r.extend();
            if s == Q::Zero {
                c_type(ctx, R::Erased, e1, a)?;
                let e1_value = eval_chk(&ctx.names, e1);
                let b_value = b.apply(e1_value);
                c_type(ctx, r, e2, &b_value)
            } else {
                let qs1 = c_type(ctx, R::Present, e1, a)?;
                let e1_value = eval_chk(&ctx.names, e1);
                let b_value = b.apply(e1_value);
                let qs2 = c_type(ctx, r, e2, &b_value)?;
                Ok(qs2.combine(&qs1.scale(s)))
            }
        },

        (CTerm::APair(e1, e2), Value::VAPairType(a, b)) => {
            let qs1 = c_type(ctx, r, e1, a)?;
            let e1_value = eval_chk(&ctx.names, e1);
            let b_value = b.apply(e1_value);
            let qs2 = c_type(ctx, r, e2, &b_value)?;
            Ok(qs1.lub(&qs2))
        },

        (CTerm::Pi(q, a, b), Value::VUniverse) => {
            require_erased(r, term)?;
            let a_value = check_is_type(ctx, a)?;
            let (fresh, ctx_fresh) = ctx.extend_local(Q::Zero, a_value);
            let b_opened = Rc::new(open_chk(fresh, b));
            check_is_type(&ctx_fresh, &b_opened)?;
            let _ = q;
            Ok(Usage::empty())
        },

        (CTerm::MPairType(q, a, b), Value::VUniverse) => {
            require_erased(r, term)?;
            let a_value = check_is_type(ctx, a)?;
            let (fresh, ctx_fresh) = ctx.extend_local(Q::Zero, a_value);
            let b_opened = Rc::new(open_chk(fresh, b));
            check_is_type(&ctx_fresh, &b_opened)?;
            let _ = q;
            Ok(Usage::empty())
        },

        (CTerm::APairType(a, b), Value::VUniverse) => {
            require_erased(r, term)?;
            let a_value = check_is_type(ctx, a)?;
            let (fresh, ctx_fresh) = ctx.extend_local(Q::Zero, a_value);
            let b_opened = Rc::new(open_chk(fresh, b));
            check_is_type(&ctx_fresh, &b_opened)?;
            Ok(Usage::empty())
        },

        (CTerm::Universe, Value::VUniverse)
        | (CTerm::MUnitType, Value::VUniverse)
        | (CTerm::AUnitType, Value::VUniverse) => {
            require_erased(r, term)?;
            Ok(Usage::empty())
        },

        (CTerm::MUnit, Value::VMUnitType) => Ok(Usage::empty()),
        (CTerm::AUnit, Value::VAUnitType) => Ok(Usage::empty()),

        (CTerm::Inf(e), _) => {
            let (usage, found) = i_type(ctx, r, e)?;
            if values_equal_ty(&found, expected) {
                Ok(usage)
            } else {
                Err(TypeError::Inference {
                    expected: expected.clone(),
                    found,
                    term: Rc::new(term.clone()),
                }
                .into())
            }
        },

        _ => Err(TypeError::Check { expected: expected.clone(), term: Rc::new(term.clone()) }.into()),
    }
}

/// A dependent type former (`Pi`/`MPairType`/`APairType`) or an atomic
/// type may only be checked at relevance `Erased`; at any other
/// relevance it would consume a runtime usage for a term that is
/// entirely type-level, which `ErasureError` reports.
fn require_erased(r: R, term: &CTerm) -> Result<()> {
    if r == R::Erased {
        Ok(())
    } else {
        Err(TypeError::Erasure { term: Rc::new(term.clone()), usage: r.extend() }.into())
    }
}

fn values_equal_ty(a: &RcValue, b: &RcValue) -> bool {
    values_equal(a, b)
}

/// Verify every entry of `usage` fits the allowance declared for that
/// name in `types`, collecting every violation into one error.
fn check_multiplicity(types: &crate::context::TypeEnv, usage: &Usage) -> Result<()> {
    let mut offenders = Vec::new();
    for (name, q) in usage.iter() {
        if let Some(binding) = types.find(name) {
            if !q.fits_in(binding.usage) {
                offenders.push(Offender {
                    name: name.clone(),
                    ty: binding.ty.clone(),
                    used: *q,
                    available: binding.usage,
                });
            }
        }
    }
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(TypeError::Multiplicity { label: None, offenders }.into())
    }
}

/// The only entry point into type checking: infer (or check, via an
/// `Ann`) `e`'s type at usage `r`, scale the resulting usage by `r`, and
/// verify the scaled usage fits the declared allowance of every free
/// variable it mentions.
pub fn i_type0(ctx: &Context, r: Q, term: &ITerm) -> Result<RcValue> {
    let (usage, ty) = i_type(ctx, r.relevance(), term)?;
    let scaled = usage.scale(r);
    check_multiplicity(&ctx.types, &scaled)?;
    Ok(ty)
}

#[cfg(test)]
mod tests;
