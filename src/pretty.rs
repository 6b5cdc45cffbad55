//! Rendering `Value`/`CTerm`/`Name`/`TypeError` to a `pretty::RcDoc`.
//!
//! Printing a `Value` always `quote0`s it back to a `CTerm` first —
//! there is exactly one pretty-printer, for syntax, and values reuse it
//! rather than duplicating layout logic. The de Bruijn indices `quote`
//! leaves behind are resolved against a name stack synthesized on the
//! way down through binders (`a`, `b`, …, `z`, `a1`, `b1`, …), purely
//! for display: nothing printed here is parsed back in by the checker.

use pretty::RcDoc;

use crate::core::eval::quote0;
use crate::core::syntax::{CTerm, ITerm, Name};
use crate::core::value::RcValue;
use crate::typing::TypeError;

type Doc = RcDoc<'static, ()>;

/// Render a `Doc` to a plain string at the given line width.
pub fn render(doc: &Doc, width: usize) -> String {
    let mut buf = Vec::new();
    doc.render(width, &mut buf).expect("rendering to an in-memory buffer never fails");
    String::from_utf8(buf).expect("pretty-printer only ever emits UTF-8 text")
}

pub fn pretty_name(name: &Name) -> Doc {
    match name {
        Name::Global(n) => RcDoc::text(n.clone()),
        Name::Local(k) => RcDoc::text(format!("%{}", k)),
        Name::Quote(k) => RcDoc::text(format!("`{}", k)),
    }
}

pub fn pretty_value(value: &RcValue) -> Doc {
    pretty_term(&quote0(value))
}

pub fn pretty_term(term: &CTerm) -> Doc {
    let mut names = Vec::new();
    pretty_chk(term, &mut names)
}

/// The `a`, `b`, …, `z`, `a1`, `b1`, … sequence `quote`d de Bruijn
/// binders are displayed under, indexed by binder depth.
fn fresh_name(depth: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    let letter = LETTERS[depth % LETTERS.len()] as char;
    let cycle = depth / LETTERS.len();
    if cycle == 0 {
        letter.to_string()
    } else {
        format!("{}{}", letter, cycle)
    }
}

fn is_atomic_chk(term: &CTerm) -> bool {
    matches!(
        term,
        CTerm::Universe
            | CTerm::MUnitType
            | CTerm::MUnit
            | CTerm::AUnitType
            | CTerm::AUnit
            | CTerm::MPair(..)
            | CTerm::APair(..)
            | CTerm::Inf(_)
    )
}

fn paren_if(needs: bool, doc: Doc) -> Doc {
    if needs {
        RcDoc::text("(").append(doc).append(RcDoc::text(")"))
    } else {
        doc
    }
}

fn pretty_chk(term: &CTerm, names: &mut Vec<String>) -> Doc {
    match term {
        CTerm::Inf(e) => pretty_inf(e, names),

        CTerm::Lam(body) => {
            let fresh = fresh_name(names.len());
            names.push(fresh.clone());
            let body_doc = pretty_chk(body, names);
            names.pop();
            RcDoc::text("\\")
                .append(RcDoc::text(fresh))
                .append(RcDoc::text("."))
                .append(RcDoc::space())
                .append(body_doc)
                .group()
        },

        CTerm::Universe => RcDoc::text("U"),

        CTerm::Pi(q, a, b) => {
            let a_doc = pretty_chk(a, names);
            let fresh = fresh_name(names.len());
            names.push(fresh.clone());
            let b_doc = pretty_chk(b, names);
            names.pop();
            RcDoc::text("(")
                .append(RcDoc::text(q.to_string()))
                .append(RcDoc::space())
                .append(RcDoc::text(fresh))
                .append(RcDoc::text(" : "))
                .append(a_doc)
                .append(RcDoc::text(")"))
                .append(RcDoc::text(" -> "))
                .append(b_doc)
                .group()
        },

        CTerm::MPairType(q, a, b) => {
            let a_doc = pretty_chk(a, names);
            let fresh = fresh_name(names.len());
            names.push(fresh.clone());
            let b_doc = pretty_chk(b, names);
            names.pop();
            RcDoc::text("(")
                .append(RcDoc::text(q.to_string()))
                .append(RcDoc::space())
                .append(RcDoc::text(fresh))
                .append(RcDoc::text(" : "))
                .append(a_doc)
                .append(RcDoc::text(")"))
                .append(RcDoc::text(" * "))
                .append(b_doc)
                .group()
        },

        CTerm::MPair(a, b) => RcDoc::text("<")
            .append(pretty_chk(a, names))
            .append(RcDoc::text(", "))
            .append(pretty_chk(b, names))
            .append(RcDoc::text(">"))
            .group(),

        CTerm::MUnitType => RcDoc::text("I"),
        CTerm::MUnit => RcDoc::text("<>"),

        CTerm::APairType(a, b) => {
            let a_doc = pretty_chk(a, names);
            let fresh = fresh_name(names.len());
            names.push(fresh);
            let b_doc = pretty_chk(b, names);
            names.pop();
            a_doc.append(RcDoc::text(" & ")).append(b_doc).group()
        },

        CTerm::APair(a, b) => RcDoc::text("(")
            .append(pretty_chk(a, names))
            .append(RcDoc::text(", "))
            .append(pretty_chk(b, names))
            .append(RcDoc::text(")"))
            .group(),

        CTerm::AUnitType => RcDoc::text("T"),
        CTerm::AUnit => RcDoc::text("unit"),
    }
}

fn pretty_inf(term: &ITerm, names: &mut Vec<String>) -> Doc {
    match term {
        ITerm::Ann(e, ty) => {
            pretty_chk(e, names).append(RcDoc::text(" : ")).append(pretty_chk(ty, names))
        },

        ITerm::Bound(index) => match names.len().checked_sub(1 + index).and_then(|i| names.get(i)) {
            Some(name) => RcDoc::text(name.clone()),
            // Only reachable for a term printed out of the binder scope
            // it was quoted in — display the raw index rather than panic.
            None => RcDoc::text(format!("#{}", index)),
        },

        ITerm::Free(name) => pretty_name(name),

        ITerm::App(f, arg) => {
            let f_doc = pretty_inf(f, names);
            let arg_doc = paren_if(!is_atomic_chk(arg), pretty_chk(arg, names));
            f_doc.append(RcDoc::space()).append(arg_doc).group()
        },

        ITerm::MPairElim(scrutinee, body, ret) => {
            let scrutinee_doc = pretty_inf(scrutinee, names);
            names.push("it".to_string());
            let ret_doc = pretty_chk(ret, names);
            names.pop();
            let x = fresh_name(names.len());
            let y = fresh_name(names.len() + 1);
            names.push(x.clone());
            names.push(y.clone());
            let body_doc = pretty_chk(body, names);
            names.pop();
            names.pop();
            RcDoc::text("let <")
                .append(RcDoc::text(x))
                .append(RcDoc::text(", "))
                .append(RcDoc::text(y))
                .append(RcDoc::text("> = "))
                .append(scrutinee_doc)
                .append(RcDoc::text(" return "))
                .append(ret_doc)
                .append(RcDoc::text(" in "))
                .append(body_doc)
                .group()
        },

        ITerm::MUnitElim(scrutinee, body, ret) => {
            let scrutinee_doc = pretty_inf(scrutinee, names);
            names.push("it".to_string());
            let ret_doc = pretty_chk(ret, names);
            names.pop();
            let body_doc = pretty_chk(body, names);
            RcDoc::text("let <> = ")
                .append(scrutinee_doc)
                .append(RcDoc::text(" return "))
                .append(ret_doc)
                .append(RcDoc::text(" in "))
                .append(body_doc)
                .group()
        },

        ITerm::Fst(pair) => RcDoc::text("fst ").append(pretty_inf(pair, names)),
        ITerm::Snd(pair) => RcDoc::text("snd ").append(pretty_inf(pair, names)),
    }
}

pub fn pretty_error(error: &TypeError) -> Doc {
    match error {
        TypeError::Multiplicity { label, offenders } => {
            let mut doc = RcDoc::text("multiplicity error");
            if let Some(label) = label {
                doc = doc.append(RcDoc::text(format!(" discharging {}", label)));
            }
            doc = doc.append(RcDoc::text(":")).append(RcDoc::hardline());
            for offender in offenders {
                doc = doc.append(RcDoc::text(format!(
                    "  {} used {} but only {} was available",
                    offender.name, offender.used, offender.available,
                )));
                doc = doc.append(RcDoc::hardline());
            }
            doc
        },
        TypeError::Erasure { term, usage } => RcDoc::text(format!(
            "erasure error: `{}` was used at usage {} in an erased position",
            render(&pretty_term(term), 80),
            usage,
        )),
        TypeError::Inference { expected, found, term } => RcDoc::text("type mismatch in ")
            .append(pretty_term(term))
            .append(RcDoc::hardline())
            .append(RcDoc::text(format!("  expected: {}", render(&pretty_value(expected), 80))))
            .append(RcDoc::hardline())
            .append(RcDoc::text(format!("  found:    {}", render(&pretty_value(found), 80)))),
        TypeError::Check { expected, term } => RcDoc::text("no checking rule applies to ")
            .append(pretty_term(term))
            .append(RcDoc::text(format!(" against {}", render(&pretty_value(expected), 80)))),
        TypeError::UnknownVar { name } => {
            RcDoc::text("unknown variable `").append(pretty_name(name)).append(RcDoc::text("`"))
        },
        TypeError::ExpectedPi { found } => RcDoc::text(format!(
            "expected a function type, found {}",
            render(&pretty_value(found), 80)
        )),
        TypeError::ExpectedAPairType { found } => RcDoc::text(format!(
            "expected an additive pair type, found {}",
            render(&pretty_value(found), 80)
        )),
        TypeError::ExpectedMPairType { found } => RcDoc::text(format!(
            "expected a multiplicative pair type, found {}",
            render(&pretty_value(found), 80)
        )),
        TypeError::ExpectedMUnitType { found } => RcDoc::text(format!(
            "expected the multiplicative unit type, found {}",
            render(&pretty_value(found), 80)
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::semiring::Q;

    #[test]
    fn renders_the_identity_function_with_synthesized_names() {
        let id = CTerm::Lam(Rc::new(CTerm::inf(ITerm::Bound(0))));
        assert_eq!(render(&pretty_term(&id), 80), "\\a. a");
    }

    #[test]
    fn renders_a_dependent_function_type() {
        let ty = CTerm::Pi(
            Q::Zero,
            Rc::new(CTerm::Universe),
            Rc::new(CTerm::Pi(Q::One, Rc::new(CTerm::inf(ITerm::Bound(0))), Rc::new(CTerm::inf(ITerm::Bound(1))))),
        );
        assert_eq!(render(&pretty_term(&ty), 80), "(0 a : U) -> (1 b : a) -> a");
    }

    #[test]
    fn renders_application_with_a_free_function() {
        let term = CTerm::inf(ITerm::App(
            Rc::new(ITerm::Free(Name::global("f"))),
            Rc::new(CTerm::inf(ITerm::Free(Name::global("x")))),
        ));
        assert_eq!(render(&pretty_term(&term), 80), "f x");
    }

    #[test]
    fn renders_an_unknown_variable_error() {
        let err = TypeError::UnknownVar { name: Name::global("b") };
        assert_eq!(render(&pretty_error(&err), 80), "unknown variable `b`");
    }
}
