//! Structured control flow (spec §9 design note).
//!
//! The original implementation models `break`/`continue`/`return` as stack
//! unwinding through a saved reader continuation. This interpreter instead
//! threads an explicit `Flow` value up through every statement-executing
//! method, which reads the same way in Rust without hand-rolled unwinding:
//! each construct's executor inspects the `Flow` its body produced and
//! decides whether to keep looping, propagate, or consume it.

use wick_values::Value;

#[derive(Debug, Clone)]
pub enum Flow {
    /// Fell off the end of a statement normally; keep going.
    Next,
    /// `break` was executed; consumed by the nearest enclosing loop.
    Break,
    /// `continue` was executed; consumed by the nearest enclosing loop.
    Continue,
    /// `return` was executed; propagates until the enclosing function call.
    Return(Value),
}
