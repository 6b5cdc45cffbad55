//! Source-anchored terminal diagnostics for script/file runs.
//!
//! The interactive shell (`repl::render_repl_error`) renders errors
//! plainly, since a REPL line has no persistent source file worth
//! anchoring a span to. `:load`ing a file or running `janus FILE`
//! non-interactively is different — there the source text sticks
//! around for the duration of the run, so a `codespan-reporting`
//! `Diagnostic` pointing at the offending byte range is worth the
//! extra ceremony.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use termcolor::{ColorChoice, StandardStream};

use crate::pretty::{pretty_error, render};
use crate::repl::ReplError;
use crate::syntax::ParseError;
use crate::typing::Error as TypeCheckError;

const RENDER_WIDTH: usize = 100;

fn diagnostic(err: &ReplError) -> Diagnostic<usize> {
    match err {
        ReplError::Parse(ParseError::Lex { offset }) => Diagnostic::error()
            .with_message("could not tokenize input")
            .with_labels(vec![Label::primary(0, *offset..*offset).with_message("invalid token starts here")]),
        ReplError::Parse(parse_err) => Diagnostic::error().with_message(parse_err.to_string()),
        ReplError::TypeCheck(TypeCheckError::Type(type_error)) => {
            Diagnostic::error().with_message(render(&pretty_error(type_error), RENDER_WIDTH))
        },
        ReplError::TypeCheck(TypeCheckError::Internal(internal)) => {
            Diagnostic::bug().with_message(internal.to_string())
        },
        other => Diagnostic::error().with_message(other.to_string()),
    }
}

/// Render `err` as a diagnostic against `source` (named `path`) and print
/// it to stderr, in color where the terminal supports it. The `Label`
/// only carries real span information for a `Lex` error, which is the
/// only `ParseError` variant that records a byte offset today; every
/// other error still gets its message, just without a source pointer.
pub fn report(path: &str, source: &str, err: &ReplError) {
    let mut files = SimpleFiles::new();
    files.add(path.to_string(), source.to_string());

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic(err));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_carry_a_primary_label() {
        let err = ReplError::Parse(ParseError::Lex { offset: 3 });
        let diag = diagnostic(&err);
        assert_eq!(diag.labels.len(), 1);
    }

    #[test]
    fn other_errors_still_produce_a_diagnostic_without_panicking() {
        let err = ReplError::Parse(ParseError::TrailingInput);
        let diag = diagnostic(&err);
        assert!(diag.labels.is_empty());
    }
}
