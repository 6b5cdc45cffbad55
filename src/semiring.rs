//! The resource semiring `{0, 1, ω}` and the relevance projection.
//!
//! Usage is tracked with `Q`; typing *mode* is tracked separately with
//! `R`. The two are related only by `extend` and `relevance` below: a
//! relevance tells the checker whether it is looking at a runtime or
//! type-level position, a usage tells it how many times a variable is
//! actually consumed there.

use std::fmt;
use std::ops::{Add, Mul};

/// An element of the three-point usage semiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Q {
    Zero,
    One,
    Many,
}

impl Q {
    pub const fn zero() -> Q {
        Q::Zero
    }

    pub const fn one() -> Q {
        Q::One
    }

    pub const fn many() -> Q {
        Q::Many
    }

    /// Least upper bound: `x ⊔ x = x`, otherwise `Many`.
    pub fn lub(self, other: Q) -> Q {
        if self == other {
            self
        } else {
            Q::Many
        }
    }

    /// `q ≤ r`, read as "a usage of `q` fits in an allowance of `r`".
    ///
    /// This is *not* a total order: `Zero ≤ Zero`, `One ≤ One`, and
    /// `x ≤ Many` for every `x`; `Zero` and `One` are otherwise
    /// incomparable (neither fits in the other).
    pub fn fits_in(self, available: Q) -> bool {
        match available {
            Q::Many => true,
            Q::Zero => self == Q::Zero,
            Q::One => self == Q::One,
        }
    }

    /// The relevance a usage of this magnitude is drawn from.
    ///
    /// `relevance(Zero) = Erased`, `relevance(_) = Present`.
    pub fn relevance(self) -> R {
        match self {
            Q::Zero => R::Erased,
            Q::One | Q::Many => R::Present,
        }
    }
}

impl Add for Q {
    type Output = Q;

    /// `Zero ⊕ q = q`; `One ⊕ One = Many`; anything `⊕ Many = Many`.
    fn add(self, other: Q) -> Q {
        match (self, other) {
            (Q::Zero, q) | (q, Q::Zero) => q,
            (Q::Many, _) | (_, Q::Many) => Q::Many,
            (Q::One, Q::One) => Q::Many,
        }
    }
}

impl Mul for Q {
    type Output = Q;

    /// `Zero ⊗ _ = _ ⊗ Zero = Zero`; `One` is the unit; `Many ⊗ x = Many`
    /// whenever `x ≠ Zero`.
    fn mul(self, other: Q) -> Q {
        match (self, other) {
            (Q::Zero, _) | (_, Q::Zero) => Q::Zero,
            (Q::One, q) | (q, Q::One) => q,
            (Q::Many, Q::Many) => Q::Many,
        }
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Q::Zero => write!(f, "0"),
            Q::One => write!(f, "1"),
            Q::Many => write!(f, "ω"),
        }
    }
}

/// The typing mode a subterm is checked or inferred under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum R {
    /// A type-level position: no runtime usage may be recorded here.
    Erased,
    /// A runtime position: usage is counted as normal.
    Present,
}

impl R {
    /// `extend(Erased) = Zero`, `extend(Present) = One` — the usage a
    /// single occurrence of a variable contributes at this relevance.
    pub fn extend(self) -> Q {
        match self {
            R::Erased => Q::Zero,
            R::Present => Q::One,
        }
    }
}

impl fmt::Display for R {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            R::Erased => write!(f, "erased"),
            R::Present => write!(f, "present"),
        }
    }
}
