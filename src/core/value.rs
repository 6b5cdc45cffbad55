//! Weak-head normal forms.
//!
//! Functions and dependent codomains are represented as *closures*: a
//! captured environment paired with the still-unevaluated body. This is
//! the systems-language stand-in for the host-function closures a
//! lazier language would reach for — `Closure::apply`/`apply2` plays
//! the role of calling a `Value -> Value` function.

use std::fmt;
use std::rc::Rc;

use im::{HashMap, Vector};

use crate::core::syntax::{CTerm, Name, RcCTerm};
use crate::semiring::Q;

pub type RcValue = Rc<Value>;

/// The bindings visible while evaluating a term: global definitions by
/// name, and a stack of local values resolved by `Bound` index (index 0
/// is the innermost, most-recently-pushed binder).
#[derive(Clone, Default)]
pub struct Env {
    pub globals: HashMap<String, RcValue>,
    pub locals: Vector<RcValue>,
}

impl Env {
    pub fn new() -> Env {
        Env::default()
    }

    /// Push a freshly-bound value, shifting every existing local down by
    /// one and making `arg` resolve to `Bound(0)`.
    pub fn push(&self, arg: RcValue) -> Env {
        let mut locals = self.locals.clone();
        locals.push_front(arg);
        Env {
            globals: self.globals.clone(),
            locals,
        }
    }

    pub fn push2(&self, a: RcValue, b: RcValue) -> Env {
        self.push(a).push(b)
    }

    pub fn lookup_local(&self, index: usize) -> Option<RcValue> {
        self.locals.get(index).cloned()
    }

    pub fn lookup_global(&self, name: &str) -> Option<RcValue> {
        self.globals.get(name).cloned()
    }

    pub fn define_global(&self, name: String, value: RcValue) -> Env {
        Env {
            globals: self.globals.update(name, value),
            locals: self.locals.clone(),
        }
    }
}

/// A captured environment paired with an unevaluated body, standing in
/// for the codomain of a `Pi`/`MPairType`/`APairType`, the body of a
/// `Lam`, or the motive/body terms of the two eliminators.
#[derive(Clone)]
pub struct Closure {
    pub env: Env,
    pub body: RcCTerm,
}

impl Closure {
    pub fn new(env: Env, body: RcCTerm) -> Closure {
        Closure { env, body }
    }

    /// Instantiate the single bound variable the closure expects.
    pub fn apply(&self, arg: RcValue) -> RcValue {
        super::eval::eval_chk(&self.env.push(arg), &self.body)
    }

    /// Instantiate two bound variables at once (the `⟨x, y⟩` binder of
    /// an `MPairElim` body): `a` is bound outermost, `b` innermost, so
    /// `Bound(0)` resolves to `b` and `Bound(1)` to `a`.
    pub fn apply2(&self, a: RcValue, b: RcValue) -> RcValue {
        super::eval::eval_chk(&self.env.push2(a, b), &self.body)
    }

    /// Evaluate a captured body that binds nothing of its own (the
    /// `MUnitElim` body, which has no scrutinee components to bind).
    pub fn force(&self) -> RcValue {
        super::eval::eval_chk(&self.env, &self.body)
    }
}

/// Values: weak-head normal forms. Every constructor here mirrors a
/// checkable-term former in `syntax::CTerm`, plus `VNeutral` for stuck
/// computations.
#[derive(Clone)]
pub enum Value {
    VLam(Closure),
    VUniverse,
    VPi(Q, RcValue, Closure),
    VMPairType(Q, RcValue, Closure),
    VMPair(RcValue, RcValue),
    VMUnitType,
    VMUnit,
    VAPairType(RcValue, Closure),
    VAPair(RcValue, RcValue),
    VAUnitType,
    VAUnit,
    VNeutral(Neutral),
}

/// Stuck computations: the spine of eliminators applied to a free
/// variable that nothing can reduce further.
#[derive(Clone)]
pub enum Neutral {
    NFree(Name),
    NApp(Rc<Neutral>, RcValue),
    NFst(Rc<Neutral>),
    NSnd(Rc<Neutral>),
    NMPairElim(Rc<Neutral>, Closure, Closure),
    NMUnitElim(Rc<Neutral>, Closure, Closure),
}

/// `vfree(n) = VNeutral(NFree(n))`.
pub fn vfree(name: Name) -> RcValue {
    Rc::new(Value::VNeutral(Neutral::NFree(name)))
}

impl From<Neutral> for Value {
    fn from(n: Neutral) -> Value {
        Value::VNeutral(n)
    }
}

impl fmt::Debug for Value {
    // Values carry closures with no structural `Debug` of their own;
    // for diagnostics, name the head constructor and quote for detail.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Value::VLam(_) => "VLam",
            Value::VUniverse => "VUniverse",
            Value::VPi(..) => "VPi",
            Value::VMPairType(..) => "VMPairType",
            Value::VMPair(..) => "VMPair",
            Value::VMUnitType => "VMUnitType",
            Value::VMUnit => "VMUnit",
            Value::VAPairType(..) => "VAPairType",
            Value::VAPair(..) => "VAPair",
            Value::VAUnitType => "VAUnitType",
            Value::VAUnit => "VAUnit",
            Value::VNeutral(_) => "VNeutral",
        };
        write!(f, "{}", tag)
    }
}
