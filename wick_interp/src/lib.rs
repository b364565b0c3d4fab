//! Fused parser/evaluator for the wick language (spec §4.5, §4.6).
//!
//! There is no separate AST stage: `Interpreter` walks tokens directly off a
//! `wick_lexer::Reader` and executes as it goes, using `Reader::save`/`jump`
//! both to make first-class function calls (spec §4.5.12) and to re-run a
//! loop's body (spec §4.5.7–§4.5.9) without re-lexing from the top.

pub mod flow;
pub mod interpreter;
pub mod scope;

pub use flow::Flow;
pub use interpreter::Interpreter;

use wick_common::WickResult;
use wick_lexer::Reader;

/// Opens `path` and runs it to completion (spec §4.5.1). `debug` controls
/// whether the live-object registry is dumped to `object.dsv` on exit
/// (spec §6).
pub fn run_file(path: impl AsRef<std::path::Path>, debug: bool) -> WickResult<()> {
    let reader = Reader::open(path)?;
    Interpreter::new(reader, debug).run()
}

/// Runs already-loaded source text, for tests and embedders that don't want
/// to go through the filesystem.
pub fn run_source(name: impl Into<std::path::PathBuf>, source: impl Into<String>, debug: bool) -> WickResult<()> {
    let reader = Reader::from_source(name, source);
    Interpreter::new(reader, debug).run()
}
