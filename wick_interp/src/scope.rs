//! The identifier table (spec §4.2): a stack of frames, innermost last.
//! Frame 0 is the module frame — functions register into it during the
//! pre-scan (§4.5.2) and it stays addressable by `*_global` regardless of how
//! deep the active call stack is when an import runs.

use hashbrown::HashMap;

use wick_common::{Span, WickError, WickResult};
use wick_values::Value;

pub struct Scope {
    frames: Vec<HashMap<String, Value>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    /// Declares `name` in the innermost frame. Fails if already declared
    /// *there* — an outer binding of the same name is shadowed, not an error.
    pub fn add(&mut self, name: &str, span: Span) -> WickResult<()> {
        let frame = self.frames.last_mut().expect("scope always has a frame");
        if frame.contains_key(name) {
            return Err(WickError::name(format!("'{name}' is already declared in this scope"), span));
        }
        frame.insert(name.to_string(), Value::None);
        Ok(())
    }

    /// Declares `name` in the module frame regardless of call depth (used by
    /// function pre-scan, §4.5.2).
    pub fn add_global(&mut self, name: &str, span: Span) -> WickResult<()> {
        if self.frames[0].contains_key(name) {
            return Err(WickError::name(format!("function '{name}' is already defined"), span));
        }
        self.frames[0].insert(name.to_string(), Value::None);
        Ok(())
    }

    /// Looks up `name` starting from the innermost frame outward.
    pub fn search(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name).cloned())
    }

    /// Attaches `value` to whichever frame already holds a binding for
    /// `name` (innermost match wins); falls back to the innermost frame if
    /// `name` isn't bound anywhere yet, for the `add` + `bind` declaration
    /// pattern.
    pub fn bind(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
        self.frames.last_mut().expect("scope always has a frame").insert(name.to_string(), value);
    }

    /// Attaches `value` directly in the module frame (used by function
    /// pre-scan, which always targets frame 0).
    pub fn bind_global(&mut self, name: &str, value: Value) {
        self.frames[0].insert(name.to_string(), value);
    }

    /// Detaches `name` from whichever frame currently holds it (innermost
    /// match wins), as if it had never been declared there (spec §4.2
    /// `unbind`). A no-op if `name` isn't bound anywhere.
    pub fn unbind(&mut self, name: &str) {
        for frame in self.frames.iter_mut().rev() {
            if frame.remove(name).is_some() {
                return;
            }
        }
    }

    /// Appends a fresh frame (spec §4.2 `append_level`), used when entering a
    /// function call.
    pub fn append_level(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame (spec §4.2 `remove_level`), used when a call
    /// returns.
    pub fn remove_level(&mut self) {
        self.frames.pop();
        debug_assert!(!self.frames.is_empty(), "module frame must never be popped");
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wick_common::Position;

    fn span() -> Span {
        Span::single(Position::start(), 0)
    }

    #[test]
    fn unbind_removes_the_name_so_search_no_longer_finds_it() {
        let mut scope = Scope::new();
        scope.add("x", span()).unwrap();
        scope.bind("x", Value::Int(1));
        assert!(scope.search("x").is_some());

        scope.unbind("x");
        assert!(scope.search("x").is_none());
    }

    #[test]
    fn unbind_is_a_no_op_for_a_name_that_was_never_bound() {
        let mut scope = Scope::new();
        scope.unbind("never_declared");
        assert!(scope.search("never_declared").is_none());
    }
}
