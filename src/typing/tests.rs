//! Integration tests for the bidirectional, usage-counting judgment,
//! exercising a handful of representative scenarios directly against
//! core syntax (no parser involved — `syntax::parser` has its own
//! round-trip tests for the surface-syntax side of the same scenarios).

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::context::Binding;
use crate::core::eval::quote0;
use crate::core::value::Value;

fn universe_val() -> RcValue {
    Rc::new(Value::VUniverse)
}

fn free(name: &str) -> CTerm {
    CTerm::inf(ITerm::Free(Name::global(name)))
}

/// `Γ₀ = assume (0 a : U) (1 x : a)`, built directly as a `Context`
/// rather than via `assume`'s (out-of-scope) shell machinery.
fn gamma0() -> Context {
    Context::new()
        .extend(Binding::new(Name::global("a"), Q::Zero, universe_val()))
        .extend(Binding::new(Name::global("x"), Q::One, vfree(Name::global("a"))))
}

/// `(0 x : U) -> (1 y : x) -> x`, i.e. `id_type` specialised to the
/// bound variable named `x` in the Pi itself (shadowing `Γ₀`'s global
/// `x` inside the type's own scope, as the surface grammar allows).
fn id_type() -> CTerm {
    CTerm::Pi(
        Q::zero(),
        Rc::new(CTerm::Universe),
        Rc::new(CTerm::Pi(
            Q::one(),
            Rc::new(CTerm::inf(ITerm::Bound(0))),
            Rc::new(CTerm::inf(ITerm::Bound(1))),
        )),
    )
}

fn id_fn() -> CTerm {
    // \x. \y. y
    CTerm::Lam(Rc::new(CTerm::Lam(Rc::new(CTerm::inf(ITerm::Bound(0))))))
}

#[test]
fn scenario_1_applying_the_annotated_identity_succeeds() {
    // (\x. \y. y : (0 x:U) -> (1 y:x) -> x) a x
    let ctx = gamma0();
    let annotated = ITerm::ann(id_fn(), id_type());
    let applied_to_a = ITerm::app(annotated, free("a"));
    let term = ITerm::app(applied_to_a, free("x"));

    let ty = i_type0(&ctx, Q::One, &term).expect("application should type-check");
    assert_eq!(quote0(&ty), quote0(&vfree(Name::global("a"))));
}

#[test]
fn scenario_3_unknown_free_variable_is_reported() {
    // assume (0 a : U) (1 x : b) — "b" was never introduced.
    let ctx = Context::new().extend(Binding::new(Name::global("a"), Q::Zero, universe_val()));
    let term = ITerm::Free(Name::global("b"));

    match i_type0(&ctx, Q::One, &term) {
        Err(Error::Type(TypeError::UnknownVar { name })) => {
            assert_eq!(name, Name::global("b"));
        },
        other => panic!("expected UnknownVar, got {:?}", other),
    }
}

#[test]
fn scenario_4_discarding_two_linear_variables_reports_both_offenders() {
    // assume (0 a:U)(0 b:U)(1 x:a)(1 y:b); let 0 add = <x, y> : (x:a)&b
    let ctx = Context::new()
        .extend(Binding::new(Name::global("a"), Q::Zero, universe_val()))
        .extend(Binding::new(Name::global("b"), Q::Zero, universe_val()))
        .extend(Binding::new(Name::global("x"), Q::One, vfree(Name::global("a"))))
        .extend(Binding::new(Name::global("y"), Q::One, vfree(Name::global("b"))));

    let pair_ty = CTerm::APairType(Rc::new(free("a")), Rc::new(free("b")));
    let term = ITerm::ann(CTerm::APair(Rc::new(free("x")), Rc::new(free("y"))), pair_ty);

    match i_type0(&ctx, Q::Zero, &term) {
        Err(Error::Type(TypeError::Multiplicity { label: None, offenders })) => {
            let mut names: Vec<String> = offenders.iter().map(|o| o.name.to_string()).collect();
            names.sort();
            assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
            for offender in &offenders {
                assert_eq!(offender.used, Q::Zero);
                assert_eq!(offender.available, Q::One);
            }
        },
        other => panic!("expected a top-level Multiplicity error, got {:?}", other),
    }
}

#[test]
fn scenario_5_pairing_a_linear_variable_with_itself_exceeds_its_allowance() {
    // A `⊗`-pair both of whose slots are the same linear variable
    // doubles its usage to `Many`, which does not fit a `One` allowance
    // — the same shape as pairing `id` with itself, specialised away
    // from needing a second `let`-bound type name.
    let ctx = Context::new()
        .extend(Binding::new(Name::global("a"), Q::Zero, universe_val()))
        .extend(Binding::new(Name::global("x"), Q::One, vfree(Name::global("a"))));

    let pair_ty = CTerm::MPairType(Q::many(), Rc::new(free("a")), Rc::new(free("a")));
    let term = ITerm::ann(CTerm::MPair(Rc::new(free("x")), Rc::new(free("x"))), pair_ty);

    match i_type0(&ctx, Q::One, &term) {
        Err(Error::Type(TypeError::Multiplicity { offenders, .. })) => {
            assert_eq!(offenders.len(), 1);
            assert_eq!(offenders[0].name, Name::global("x"));
            assert_eq!(offenders[0].used, Q::Many);
            assert_eq!(offenders[0].available, Q::One);
        },
        other => panic!("expected a Multiplicity error reporting `x` as Many, got {:?}", other),
    }
}

#[test]
fn scenario_6_querying_the_identity_types_applies_the_type_argument() {
    // :type id A, where id : ∀(0 x:U)(1 y:x).x — infer (not apply) the
    // Pi's codomain at the given type argument, i.e. `App` against a
    // free `A` rather than a concrete value.
    let ctx = Context::new()
        .extend(Binding::new(Name::global("id"), Q::One, eval_chk(&Context::new().names, &id_type())))
        .extend(Binding::new(Name::global("A"), Q::Zero, universe_val()));

    let term = ITerm::app(ITerm::Free(Name::global("id")), free("A"));
    let ty = i_type0(&ctx, Q::One, &term).expect("partial application should type-check");

    // Expected: (1 x:A) -> A, i.e. the outer (0 x:U) binder substituted
    // away by A, leaving a non-dependent Pi whose codomain is simply A
    // (it never mentions the inner binder, so it quotes back to `A`
    // itself rather than a `Bound` reference to it).
    let expected = CTerm::Pi(Q::one(), Rc::new(free("A")), Rc::new(free("A")));
    assert_eq!(quote0(&ty), expected);
}

#[test]
fn checking_a_type_yields_no_runtime_usage() {
    // Type-checking a *type* (here, `id_type` itself against `𝘜`) must
    // never consume runtime resources.
    let ctx = gamma0();
    let usage = c_type(&ctx.forget(), R::Erased, &id_type(), &universe_val())
        .expect("id_type should check against the universe");
    assert!(usage.is_all_zero());
}

#[test]
fn erased_position_rejects_a_type_former_at_runtime_relevance() {
    let ctx = gamma0();
    let err = c_type(&ctx, R::Present, &CTerm::Universe, &universe_val())
        .expect_err("a bare type former must not check at a present relevance");
    match err {
        Error::Type(TypeError::Erasure { usage, .. }) => assert_eq!(usage, Q::One),
        other => panic!("expected an Erasure error, got {:?}", other),
    }
}

#[test]
fn free_variable_usage_scales_with_relevance() {
    let ctx = gamma0();
    let (erased_usage, _) = i_type(&ctx, R::Erased, &ITerm::Free(Name::global("x"))).unwrap();
    let (present_usage, _) = i_type(&ctx, R::Present, &ITerm::Free(Name::global("x"))).unwrap();
    assert_eq!(erased_usage.get(&Name::global("x")), Q::Zero);
    assert_eq!(present_usage.get(&Name::global("x")), Q::One);
}

#[test]
fn contextual_weakening_preserves_the_result() {
    // Extending Γ with a binding the term never mentions must not
    // change the outcome.
    let narrow = gamma0();
    let wide = narrow.extend(Binding::new(Name::global("unused"), Q::Zero, universe_val()));

    let ty_narrow = i_type0(&narrow, Q::One, &ITerm::Free(Name::global("x"))).unwrap();
    let ty_wide = i_type0(&wide, Q::One, &ITerm::Free(Name::global("x"))).unwrap();
    assert_eq!(quote0(&ty_narrow), quote0(&ty_wide));
}

#[test]
fn additive_pair_usage_is_the_lub_of_its_two_branches() {
    // Using only one side of an `&`-pair should report that side's
    // usage, not the sum — `lub`, not `combine`.
    let ctx = gamma0();
    let pair_ty = CTerm::APairType(Rc::new(free("a")), Rc::new(free("a")));
    // Both branches consume `x` once; the combined usage is still `One`,
    // not `Many` as a multiplicative pair would report.
    let term = ITerm::ann(CTerm::APair(Rc::new(free("x")), Rc::new(free("x"))), pair_ty);
    // If `&`-usage were summed instead of joined, `x` would come out as
    // `Many` against its `One` allowance and this would fail to check.
    let ty = i_type0(&ctx, Q::One, &term).expect("an additive pair of `x` with itself type-checks");
    assert_eq!(quote0(&ty), CTerm::APairType(Rc::new(free("a")), Rc::new(free("a"))));
}

#[test]
fn application_to_a_non_function_is_reported() {
    let ctx = gamma0();
    let term = ITerm::app(ITerm::Free(Name::global("a")), CTerm::Universe);
    let err = i_type0(&ctx, Q::One, &term).expect_err("`a` is a type, not a function");
    assert!(matches!(err, Error::Type(TypeError::ExpectedPi { .. })));
}
