//! The error taxonomy: user-facing `TypeError`s that propagate out of
//! `i_type0` unchanged, and `InternalError`s for invariant violations
//! that should never arise from well-formed input and are bugs if they
//! do.

use crate::core::syntax::{Name, RcCTerm};
use crate::core::value::RcValue;
use crate::semiring::Q;

/// One multiplicity violation: `name` was declared with usage
/// `available` but the judgment accumulated `used`.
#[derive(Debug, Clone)]
pub struct Offender {
    pub name: Name,
    pub ty: RcValue,
    pub used: Q,
    pub available: Q,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    /// A variable's accumulated usage does not fit its declared
    /// allowance. `label` identifies the binder being discharged, when
    /// one is available (absent for the top-level `iType0` check).
    #[error("multiplicity error: one or more variables were used more than their declared allowance permits")]
    Multiplicity {
        label: Option<String>,
        offenders: Vec<Offender>,
    },

    /// A term that must appear only in an erased position was used with
    /// non-zero relevance.
    #[error("erasure error: a type-level term was used at usage {usage}")]
    Erasure { term: RcCTerm, usage: Q },

    /// The inferred type does not α-β-η-equal the expected type.
    #[error("type mismatch")]
    Inference { expected: RcValue, found: RcValue, term: RcCTerm },

    /// No checking rule applies to this checkable term against this
    /// expected type.
    #[error("no checking rule applies to this term")]
    Check { expected: RcValue, term: RcCTerm },

    /// A free variable was not found in the context.
    #[error("unknown variable `{name}`")]
    UnknownVar { name: Name },

    /// A function was applied, but the callee's type was not a `Pi`.
    #[error("expected a function type")]
    ExpectedPi { found: RcValue },

    /// `Fst`/`Snd` was applied to something that was not an additive
    /// pair.
    #[error("expected an additive pair type")]
    ExpectedAPairType { found: RcValue },

    /// `MPairElim`'s scrutinee did not have a multiplicative pair type.
    #[error("expected a multiplicative pair type")]
    ExpectedMPairType { found: RcValue },

    /// `MUnitElim`'s scrutinee did not have the multiplicative unit
    /// type.
    #[error("expected the multiplicative unit type")]
    ExpectedMUnitType { found: RcValue },

}

/// Invariant violations: bugs in the checker, not in the user's program.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InternalError {
    #[error("internal error: Bound({0}) reached the type checker; binders must be opened before typing descends into them")]
    UnsubstitutedBound(usize),

    #[error("internal error: an erased judgment returned a non-zero usage for `{name}`")]
    NonZeroErasedUsage { name: Name },
}

/// The union of every error `iType0` (and its collaborators) can
/// return.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type Result<T> = std::result::Result<T, Error>;
