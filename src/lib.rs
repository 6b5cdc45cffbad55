//! `janus`: an interactive checker and evaluator for a small
//! dependently-typed λ-calculus enriched with a quantitative
//! (resource-aware) type discipline over the semiring `{0, 1, ω}`.
//!
//! The library surface splits into the core calculus (`semiring`,
//! `core`, `context`, `typing`) and the collaborator modules that make
//! it runnable as a shell (`syntax`, `pretty`, `repl`, `diagnostics`).

pub mod context;
pub mod core;
pub mod diagnostics;
pub mod pretty;
pub mod repl;
pub mod semiring;
pub mod syntax;
pub mod typing;
