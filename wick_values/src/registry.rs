//! Optional live-object registry (spec §3 "object registry", §6 `object.dsv`).
//!
//! Every heap-allocated `Value` payload (`Str`, `List`, `Position`) registers
//! a `Weak` handle here under a monotonic id at construction; the payload's
//! own `Drop` impl deregisters it when the last `Rc` clone goes away. This
//! gives the same observability as the specification's manual
//! `incref`/`decref` bookkeeping without hand-rolled counters: Rust's
//! reference counting already *is* the refcount the spec describes, we just
//! watch it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use hashbrown::HashMap;

use crate::value::{ListBody, PositionBody, StrBody};

enum Entry {
    Str(Weak<RefCell<StrBody>>),
    List(Weak<RefCell<ListBody>>),
    Position(Weak<PositionBody>),
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: HashMap<u64, Entry>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

/// Reserve the next allocation id. Called once per heap `Value` construction.
pub fn next_id() -> u64 {
    REGISTRY.with(|r| {
        let mut r = r.borrow_mut();
        let id = r.next_id;
        r.next_id += 1;
        id
    })
}

pub(crate) fn register_str(id: u64, handle: Weak<RefCell<StrBody>>) {
    REGISTRY.with(|r| r.borrow_mut().live.insert(id, Entry::Str(handle)));
}

pub(crate) fn register_list(id: u64, handle: Weak<RefCell<ListBody>>) {
    REGISTRY.with(|r| r.borrow_mut().live.insert(id, Entry::List(handle)));
}

pub(crate) fn register_position(id: u64, handle: Weak<PositionBody>) {
    REGISTRY.with(|r| r.borrow_mut().live.insert(id, Entry::Position(handle)));
}

/// Called by each body's `Drop` impl when its last owning reference goes
/// away (refcount reaches zero per spec §3).
pub(crate) fn deregister(id: u64) {
    REGISTRY.with(|r| {
        r.borrow_mut().live.remove(&id);
    });
}

/// Number of objects still live. Used by tests to verify testable property 1
/// (§8): a non-diverging program leaves no live objects.
pub fn live_count() -> usize {
    REGISTRY.with(|r| r.borrow().live.len())
}

struct Row {
    id: u64,
    refcount: usize,
    kind: &'static str,
    value: String,
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{};{}", self.id, self.refcount, self.kind, self.value)
    }
}

/// Render the live-object table in the `object;refcount;type;value` format
/// spec §6 requires for `object.dsv`.
pub fn dump() -> String {
    let rows: Vec<Row> = REGISTRY.with(|r| {
        let r = r.borrow();
        let mut rows: Vec<Row> = r
            .live
            .iter()
            .filter_map(|(&id, entry)| match entry {
                Entry::Str(weak) => weak.upgrade().map(|rc| Row {
                    id,
                    refcount: Weak::strong_count(weak),
                    kind: "string",
                    value: rc.borrow().value.clone(),
                }),
                Entry::List(weak) => weak.upgrade().map(|rc| Row {
                    id,
                    refcount: Weak::strong_count(weak),
                    kind: "list",
                    value: format!("<{} elements>", rc.borrow().value.len()),
                }),
                Entry::Position(weak) => weak.upgrade().map(|rc| Row {
                    id,
                    refcount: Weak::strong_count(weak),
                    kind: "position",
                    value: format!("file {} offset {}", rc.value.file_id, rc.value.offset),
                }),
            })
            .collect();
        rows.sort_by_key(|row| row.id);
        rows
    });

    let mut out = String::from("object;refcount;type;value\n");
    for row in rows {
        out.push_str(&row.to_string());
        out.push('\n');
    }
    out
}
