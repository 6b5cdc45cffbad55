//! The interactive shell: `IState`, command dispatch, and the REPL
//! loop itself. Everything below `IState` stays a pure function of an
//! immutable `Context` — this module is where the one piece of mutable
//! state in the whole crate lives.

use std::fs;
use std::path::PathBuf;

use log::info;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::context::{Binding, Context};
use crate::core::eval::{eval_chk, eval_inf, quote0};
use crate::core::syntax::{CTerm, ITerm, Name};
use crate::core::value::RcValue;
use crate::pretty::{pretty_error, pretty_name, pretty_value, render};
use crate::semiring::Q;
use crate::syntax::translation::{to_core_stmt, CoreStmt, TranslationError};
use crate::syntax::{parse_stmt, ParseError, Stmt};
use crate::typing::{i_type0, Error as TypeCheckError};

const PRINT_WIDTH: usize = 100;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Translation(#[from] TranslationError),
    #[error("{0}")]
    TypeCheck(#[from] TypeCheckError),
    #[error("could not read `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("unknown command `{0}` — try `:help`")]
    UnknownCommand(String),
}

/// The shell's one piece of mutable state: an output file (set by a
/// future `:load` extension point) and the growing typing context.
pub struct IState {
    pub out_file: Option<PathBuf>,
    pub context: Context,
}

impl IState {
    pub fn new() -> IState {
        IState { out_file: None, context: Context::new() }
    }
}

impl Default for IState {
    fn default() -> IState {
        IState::new()
    }
}

/// The result of running one line: text to print, or a request to quit.
pub enum Outcome {
    Printed(String),
    Quit,
}

/// Check that `ty` is a well-formed type by re-using the public
/// `i_type0` entry point: `(ty : U)` checked at usage `0` both verifies
/// `ty` is a type and never touches runtime usage.
fn check_is_well_formed_type(ctx: &Context, ty: &CTerm) -> Result<RcValue, ReplError> {
    let ann = ITerm::Ann(std::rc::Rc::new(ty.clone()), std::rc::Rc::new(CTerm::Universe));
    i_type0(ctx, Q::Zero, &ann)?;
    Ok(eval_chk(&ctx.names, ty))
}

fn exec_assume(state: &mut IState, bindings: Vec<(String, Q, CTerm)>) -> Result<String, ReplError> {
    let mut lines = Vec::new();
    for (name, usage, ty_chk) in bindings {
        let ty_value = check_is_well_formed_type(&state.context, &ty_chk)?;
        lines.push(format!("assumed {} : {}", name, render(&pretty_value(&ty_value), PRINT_WIDTH)));
        state.context = state.context.extend(Binding::new(Name::global(name), usage, ty_value));
    }
    Ok(lines.join("\n"))
}

fn exec_let(state: &mut IState, usage: Q, name: String, term: ITerm) -> Result<String, ReplError> {
    let ty = i_type0(&state.context, usage, &term)?;
    let value = eval_inf(&state.context.names, &term);
    let rendered = format!("{} : {}", render(&pretty_value(&value), PRINT_WIDTH), render(&pretty_value(&ty), PRINT_WIDTH));
    state.context = state.context.define_global(name, usage, value, ty);
    Ok(rendered)
}

fn exec_eval(state: &IState, usage: Q, term: ITerm) -> Result<String, ReplError> {
    let ty = i_type0(&state.context, usage, &term)?;
    let value = eval_inf(&state.context.names, &term);
    Ok(format!("{} : {}", render(&pretty_value(&value), PRINT_WIDTH), render(&pretty_value(&ty), PRINT_WIDTH)))
}

/// `:type <expr>` — infer and print only the type, never the normal
/// form. Checked at usage `0`: a type query is not a runtime use of
/// `term`, only an inspection of it.
fn exec_type_query(state: &IState, term: ITerm) -> Result<String, ReplError> {
    let ty = i_type0(&state.context, Q::Zero, &term)?;
    Ok(render(&pretty_value(&ty), PRINT_WIDTH))
}

fn browse(state: &IState) -> String {
    let mut lines: Vec<String> = state
        .context
        .types
        .iter()
        .filter(|binding| matches!(binding.name, Name::Global(_)))
        .map(|binding| {
            format!(
                "{} {} : {}",
                binding.usage,
                render(&pretty_name(&binding.name), PRINT_WIDTH),
                render(&pretty_value(&binding.ty), PRINT_WIDTH),
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push("(nothing in scope)".to_string());
    }
    lines.join("\n")
}

const HELP_TEXT: &str = "\
Commands:
  <expr>          infer, evaluate, and print <expr>
  :type <expr>    infer and print the type of <expr> only
  :browse         list every binding currently in scope
  :load <file>    parse and run every statement in <file>
  :quit           exit
  :help           print this message";

/// Run one already-parsed statement against `state`, returning the text
/// to print. `Stmt::Out`'s payload is only ever `":browse"`/`":help"`
/// placeholders the parser can't itself resolve (they need `state`);
/// the real REPL loop intercepts `:quit`/`:load` before parsing, since
/// those need control over the loop or the filesystem.
pub fn exec_stmt(state: &mut IState, stmt: Stmt) -> Result<String, ReplError> {
    match to_core_stmt(&stmt)? {
        CoreStmt::Assume(bindings) => exec_assume(state, bindings),
        CoreStmt::Let(q, name, term) => exec_let(state, q, name, term),
        CoreStmt::Eval(q, term) => exec_eval(state, q, term),
        CoreStmt::TypeQuery(term) => exec_type_query(state, term),
        CoreStmt::PutStrLn(s) => Ok(s),
        CoreStmt::Out(s) if s == ":browse" => Ok(browse(state)),
        CoreStmt::Out(s) if s == ":help" => Ok(HELP_TEXT.to_string()),
        CoreStmt::Out(s) => Ok(s),
    }
}

/// Run every statement in `src` in order (what `:load` and non-interactive
/// script execution both reduce to), returning each statement's output.
pub fn run_script(state: &mut IState, src: &str) -> Result<Vec<String>, ReplError> {
    let stmts = crate::syntax::parse_stmts(src)?;
    let mut outputs = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        outputs.push(exec_stmt(state, stmt)?);
    }
    Ok(outputs)
}

fn load_file(state: &mut IState, path: &str) -> Result<String, ReplError> {
    let src = fs::read_to_string(path).map_err(|source| ReplError::Io { path: PathBuf::from(path), source })?;
    let outputs = run_script(state, &src)?;
    Ok(outputs.join("\n"))
}

/// Handle one line of REPL input: `:quit`/`:load` are intercepted here
/// since they need to drive the loop or the filesystem; everything else
/// is parsed as a `Stmt` and run through `exec_stmt`.
pub fn handle_line(state: &mut IState, line: &str) -> Result<Outcome, ReplError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Outcome::Printed(String::new()));
    }
    if trimmed == ":quit" {
        return Ok(Outcome::Quit);
    }
    if let Some(path) = trimmed.strip_prefix(":load") {
        return Ok(Outcome::Printed(load_file(state, path.trim())?));
    }
    let is_known_command = matches!(trimmed, ":help" | ":browse") || trimmed.starts_with(":type");
    if trimmed.starts_with(':') && !is_known_command {
        return Err(ReplError::UnknownCommand(trimmed.to_string()));
    }
    let stmt = parse_stmt(trimmed)?;
    Ok(Outcome::Printed(exec_stmt(state, stmt)?))
}

/// The interactive read-eval-print loop. `main.rs` calls this after
/// optionally `:load`-ing a script path given on the command line.
pub fn run(mut state: IState) -> Result<(), ReplError> {
    let mut rl = DefaultEditor::new().expect("failed to initialize the line editor");
    info!("starting the interactive shell");
    loop {
        match rl.readline("janus> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match handle_line(&mut state, &line) {
                    Ok(Outcome::Printed(text)) => {
                        if !text.is_empty() {
                            println!("{}", text);
                        }
                    },
                    Ok(Outcome::Quit) => break,
                    Err(err) => {
                        println!("{}", render_repl_error(&err));
                    },
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(ReplError::Io { path: PathBuf::new(), source: std::io::Error::new(std::io::ErrorKind::Other, err) }),
        }
    }
    Ok(())
}

pub fn render_repl_error(err: &ReplError) -> String {
    match err {
        ReplError::TypeCheck(TypeCheckError::Type(type_error)) => render(&pretty_error(type_error), PRINT_WIDTH),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_then_evaluate_the_identity_function() {
        let mut state = IState::new();
        let outputs = run_script(
            &mut state,
            "assume (0 a : U) (1 x : a)\n(\\x y . y : (0 x : U) -> (1 y : x) -> x) a x",
        )
        .unwrap();
        assert_eq!(outputs.len(), 2);
        assert!(outputs[1].starts_with("x : a"));
    }

    #[test]
    fn let_binding_is_visible_to_later_statements() {
        let mut state = IState::new();
        let outputs = run_script(&mut state, "assume (0 a : U) (1 x : a)\nlet 1 y = x\ny").unwrap();
        assert!(outputs[2].starts_with("x : a"));
    }

    #[test]
    fn browse_lists_every_assumed_binding() {
        let mut state = IState::new();
        run_script(&mut state, "assume (0 a : U) (1 x : a)").unwrap();
        let listing = browse(&state);
        assert!(listing.contains("a"));
        assert!(listing.contains("x"));
    }

    #[test]
    fn an_unknown_free_variable_is_a_recoverable_error() {
        let mut state = IState::new();
        let err = run_script(&mut state, "b").unwrap_err();
        assert!(matches!(err, ReplError::TypeCheck(_)));
    }

    #[test]
    fn quit_ends_the_loop_without_touching_the_context() {
        let mut state = IState::new();
        match handle_line(&mut state, ":quit").unwrap() {
            Outcome::Quit => {},
            Outcome::Printed(_) => panic!("expected Quit"),
        }
    }

    #[test]
    fn help_prints_the_command_summary() {
        let mut state = IState::new();
        match handle_line(&mut state, ":help").unwrap() {
            Outcome::Printed(text) => assert!(text.contains(":quit")),
            Outcome::Quit => panic!("expected Printed"),
        }
    }

    #[test]
    fn type_command_prints_only_the_type_not_the_normal_form() {
        // `:type id A`, where `id : (0 x:U) -> (1 y:x) -> x`, should
        // print just `(1 a : A) -> A` — never a `value : type` pair.
        let mut state = IState::new();
        run_script(
            &mut state,
            "let 1 id = (\\x y . y) : (0 x : U) -> (1 y : x) -> x\nassume (0 A : U)",
        )
        .unwrap();
        match handle_line(&mut state, ":type id A").unwrap() {
            Outcome::Printed(text) => assert_eq!(text, "(1 a : A) -> A"),
            Outcome::Quit => panic!("expected Printed"),
        }
    }
}
