//! The pair `(NameEnv, TypeEnv)` threaded through the checker, and the
//! `Usage` maps that ride alongside it.
//!
//! `TypeEnv` is ordered innermost-first (a cons-list, realised here as
//! an `im::Vector` used as a stack) so that `find` returns the
//! correctly-shadowing binding. `Usage` is an unordered map: iteration
//! order never affects correctness, only lookup by key does.

use std::fmt;

use im::{HashMap, Vector};

use crate::core::syntax::Name;
use crate::core::value::RcValue;
use crate::semiring::Q;

/// One binder's worth of typing information: a name, its declared
/// usage allowance, and its type (always a fully-evaluated `Value`,
/// never a raw `CTerm`).
#[derive(Clone)]
pub struct Binding {
    pub name: Name,
    pub usage: Q,
    pub ty: RcValue,
}

impl Binding {
    pub fn new(name: Name, usage: Q, ty: RcValue) -> Binding {
        Binding { name, usage, ty }
    }
}

/// A usage map: `Name -> Q`, absent entries treated as `Zero`.
#[derive(Clone, Default)]
pub struct Usage {
    entries: HashMap<Name, Q>,
}

impl Usage {
    pub fn empty() -> Usage {
        Usage::default()
    }

    pub fn single(name: Name, q: Q) -> Usage {
        let mut entries = HashMap::new();
        entries.insert(name, q);
        Usage { entries }
    }

    pub fn get(&self, name: &Name) -> Q {
        self.entries.get(name).copied().unwrap_or(Q::Zero)
    }

    /// Pointwise `⊕` over the union of both maps' keys.
    pub fn combine(&self, other: &Usage) -> Usage {
        let mut entries = self.entries.clone();
        for (name, q) in other.entries.iter() {
            let combined = entries.get(name).copied().unwrap_or(Q::Zero) + *q;
            entries.insert(name.clone(), combined);
        }
        Usage { entries }
    }

    /// Pointwise `⊔` over the union of both maps' keys (used to combine
    /// the two branches of an additive pair). A key present on only one
    /// side is combined against `Zero`, so it survives as-is only when
    /// its own value is already `Zero`.
    pub fn lub(&self, other: &Usage) -> Usage {
        let mut entries = HashMap::new();
        for name in self.entries.keys().chain(other.entries.keys()) {
            if entries.contains_key(name) {
                continue;
            }
            let combined = self.get(name).lub(other.get(name));
            entries.insert(name.clone(), combined);
        }
        Usage { entries }
    }

    /// Scale every entry by `q`, mapping it through `q ⊗ ·`.
    pub fn scale(&self, q: Q) -> Usage {
        let entries = self.entries.iter().map(|(n, &v)| (n.clone(), q * v)).collect();
        Usage { entries }
    }

    /// Remove `name`'s entry, returning its accumulated usage alongside
    /// the usage map with that entry discharged.
    pub fn discharge(&self, name: &Name) -> (Q, Usage) {
        let used = self.get(name);
        let entries = self.entries.without(name);
        (used, Usage { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Q)> {
        self.entries.iter()
    }

    pub fn is_all_zero(&self) -> bool {
        self.entries.iter().all(|(_, q)| *q == Q::Zero)
    }
}

impl fmt::Debug for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(n, q)| (n, q))).finish()
    }
}

/// The typing environment: an innermost-first list of `Binding`s.
#[derive(Clone, Default)]
pub struct TypeEnv {
    bindings: Vector<Binding>,
}

impl TypeEnv {
    pub fn new() -> TypeEnv {
        TypeEnv::default()
    }

    pub fn extend(&self, binding: Binding) -> TypeEnv {
        let mut bindings = self.bindings.clone();
        bindings.push_front(binding);
        TypeEnv { bindings }
    }

    /// Innermost binding first, so shadowing is resolved correctly.
    pub fn find(&self, name: &Name) -> Option<&Binding> {
        self.bindings.iter().find(|b| &b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The erased shadow: every binding's declared usage rewritten to
    /// `Zero`. Used when type-checking a *type*, where no runtime
    /// resource may be consumed.
    pub fn forget(&self) -> TypeEnv {
        let bindings = self
            .bindings
            .iter()
            .map(|b| Binding::new(b.name.clone(), Q::Zero, b.ty.clone()))
            .collect();
        TypeEnv { bindings }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

/// `⟨name-environment, typing-environment⟩`, threaded as an immutable
/// reader through the whole judgment.
#[derive(Clone, Default)]
pub struct Context {
    pub names: crate::core::value::Env,
    pub types: TypeEnv,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    pub fn lookup(&self, name: &Name) -> Option<&Binding> {
        self.types.find(name)
    }

    pub fn extend(&self, binding: Binding) -> Context {
        Context {
            names: self.names.clone(),
            types: self.types.extend(binding),
        }
    }

    /// Introduce a fresh local binder, minted at the current context
    /// depth so that its index is guaranteed fresh.
    pub fn extend_local(&self, usage: Q, ty: RcValue) -> (Name, Context) {
        let name = Name::Local(self.types.len());
        (name.clone(), self.extend(Binding::new(name, usage, ty)))
    }

    pub fn define_global(&self, name: String, usage: Q, value: RcValue, ty: RcValue) -> Context {
        Context {
            names: self.names.define_global(name.clone(), value),
            types: self.types.extend(Binding::new(Name::Global(name), usage, ty)),
        }
    }

    /// The erased subcontext used while checking types: a fresh
    /// `Context` whose typing environment has had every usage zeroed.
    pub fn forget(&self) -> Context {
        Context {
            names: self.names.clone(),
            types: self.types.forget(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use crate::core::value::Value;

    fn ty() -> RcValue {
        Rc::new(Value::VUniverse)
    }

    #[test]
    fn find_resolves_innermost_shadowing_binding() {
        let ctx = Context::new();
        let ctx = ctx.extend(Binding::new(Name::global("x"), Q::One, ty()));
        let ctx = ctx.extend(Binding::new(Name::global("x"), Q::Many, ty()));

        assert_eq!(ctx.lookup(&Name::global("x")).unwrap().usage, Q::Many);
    }

    #[test]
    fn forget_zeroes_every_usage() {
        let ctx = Context::new();
        let ctx = ctx.extend(Binding::new(Name::global("x"), Q::One, ty()));
        let forgotten = ctx.forget();

        assert_eq!(forgotten.lookup(&Name::global("x")).unwrap().usage, Q::Zero);
    }

    #[test]
    fn usage_combine_adds_pointwise() {
        let a = Usage::single(Name::global("x"), Q::One);
        let b = Usage::single(Name::global("x"), Q::One);
        assert_eq!(a.combine(&b).get(&Name::global("x")), Q::Many);
    }

    #[test]
    fn usage_discharge_removes_the_entry() {
        let usage = Usage::single(Name::global("x"), Q::One);
        let (used, rest) = usage.discharge(&Name::global("x"));
        assert_eq!(used, Q::One);
        assert_eq!(rest.get(&Name::global("x")), Q::Zero);
    }

    #[test]
    fn usage_lub_of_equal_values_is_that_value() {
        let a = Usage::single(Name::global("x"), Q::One);
        let b = Usage::single(Name::global("x"), Q::One);
        assert_eq!(a.lub(&b).get(&Name::global("x")), Q::One);
    }

    #[test]
    fn usage_lub_treats_a_key_missing_from_one_side_as_zero() {
        // x is used in `a` but not `b`: missing is treated as Zero, and
        // since One != Zero the safe over-approximation is Many.
        let a = Usage::single(Name::global("x"), Q::One);
        let b = Usage::empty();
        assert_eq!(a.lub(&b).get(&Name::global("x")), Q::Many);
    }
}
