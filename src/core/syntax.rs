//! The term language: two mutually recursive sorts, de Bruijn indexed.
//!
//! `ITerm` is *inferable*: its type can be synthesized without help.
//! `CTerm` is *checkable*: it needs an expected type pushed in to make
//! sense of it (a bare lambda has no type of its own, for instance).
//! This is the bidirectional split that `typing` is built around.

use std::fmt;
use std::rc::Rc;

use crate::semiring::Q;

/// The name of a variable.
///
/// `Global` names are free and user-introduced (by `assume`/`let` at the
/// shell); they live in the `NameEnv` until the process ends. `Local`
/// names are fresh de Bruijn *levels*, minted while the checker descends
/// into a binder, and live only for the depth of one recursive call.
/// `Quote` names are transient markers that only ever appear inside
/// `quote` while it is converting a value's host closures back into
/// syntax; they never escape into a context or a usage map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    Global(String),
    Local(usize),
    Quote(usize),
}

impl Name {
    pub fn global(name: impl Into<String>) -> Name {
        Name::Global(name.into())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Global(n) => write!(f, "{}", n),
            Name::Local(k) => write!(f, "%{}", k),
            Name::Quote(k) => write!(f, "`{}", k),
        }
    }
}

pub type RcITerm = Rc<ITerm>;
pub type RcCTerm = Rc<CTerm>;

/// Inferable terms: `Γ ⊢ e ⇒ (Usage, τ)`.
#[derive(Debug, Clone, PartialEq)]
pub enum ITerm {
    /// A checkable term annotated with its type: `(e : τ)`.
    Ann(RcCTerm, RcCTerm),
    /// A variable bound by an enclosing binder, counted from the
    /// innermost binder outward.
    Bound(usize),
    /// A free variable — a global, a checker-minted local, or (only
    /// transiently, inside `quote`) a quote marker.
    Free(Name),
    /// Function application `e c`.
    App(Rc<ITerm>, RcCTerm),
    /// Elimination of a multiplicative (`⊗`) pair: `let ⟨x,y⟩ = e in c`,
    /// with `c_type` the motive the result is checked against.
    MPairElim(Rc<ITerm>, RcCTerm, RcCTerm),
    /// Elimination of the multiplicative unit `I`.
    MUnitElim(Rc<ITerm>, RcCTerm, RcCTerm),
    /// First projection of an additive (`&`) pair.
    Fst(Rc<ITerm>),
    /// Second projection of an additive (`&`) pair.
    Snd(Rc<ITerm>),
}

/// Checkable terms: `Γ ⊢ e ⇐ τ → Usage`.
#[derive(Debug, Clone, PartialEq)]
pub enum CTerm {
    /// Embed an inferable term into checkable position.
    Inf(Rc<ITerm>),
    /// λ-abstraction; the bound parameter carries no type annotation —
    /// it is recovered from the `Pi` being checked against.
    Lam(RcCTerm),
    /// The type of types, `𝘜`.
    Universe,
    /// Dependent function type `(q x : a) → b`.
    Pi(Q, RcCTerm, RcCTerm),
    /// Multiplicative (tensor) pair type `(q x : a) ⊗ b`.
    MPairType(Q, RcCTerm, RcCTerm),
    /// A multiplicative pair introduction `⟨e₁, e₂⟩`.
    MPair(RcCTerm, RcCTerm),
    /// The multiplicative unit type `I`.
    MUnitType,
    /// The multiplicative unit value.
    MUnit,
    /// Additive pair type `a & b`.
    APairType(RcCTerm, RcCTerm),
    /// An additive pair introduction, offering both projections.
    APair(RcCTerm, RcCTerm),
    /// The additive unit type `⊤`.
    AUnitType,
    /// The additive unit value.
    AUnit,
}

impl ITerm {
    pub fn ann(expr: CTerm, ty: CTerm) -> ITerm {
        ITerm::Ann(Rc::new(expr), Rc::new(ty))
    }

    pub fn app(f: ITerm, arg: CTerm) -> ITerm {
        ITerm::App(Rc::new(f), Rc::new(arg))
    }
}

impl CTerm {
    pub fn inf(e: ITerm) -> CTerm {
        CTerm::Inf(Rc::new(e))
    }
}

impl From<ITerm> for CTerm {
    fn from(e: ITerm) -> CTerm {
        CTerm::inf(e)
    }
}
