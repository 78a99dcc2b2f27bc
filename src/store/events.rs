//! Mutation listeners with exact, shallow and wildcard path matching.
//!
//! Every mutating registry operation fires an event carrying the action
//! type, the affected path and the action-specific arguments. Listeners
//! register under a single action (or the catch-all `all`) with an
//! optional path filter:
//!
//! ```text
//! "add"            every add, any path
//! "set:user.name"  set events whose path matches user.name
//! "remove:cfg.*"   remove events one level below cfg
//! "all"            every action, any path
//! ```
//!
//! Matching rule: no filter always matches; a filter ending in a
//! wildcard segment matches when every segment before the wildcard
//! equals the fired path's segments before its last; otherwise the
//! filter must equal the full path, or equal just the path's final
//! segment (shallow convenience). Segments are split with the owning
//! registry's separator at fire time.

use std::collections::HashMap;
use std::rc::Rc;

use crate::store::error::Error;
use crate::store::value::Value;

/// Registry actions listeners can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Set,
    Get,
    Remove,
    ListOps,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Set => "set",
            Action::Get => "get",
            Action::Remove => "remove",
            Action::ListOps => "listops",
        }
    }

    fn from_name(name: &str) -> Option<Action> {
        match name {
            "add" => Some(Action::Add),
            "set" => Some(Action::Set),
            "get" => Some(Action::Get),
            "remove" => Some(Action::Remove),
            "listops" => Some(Action::ListOps),
            _ => None,
        }
    }
}

/// Callback invoked with the action, the affected path and the
/// action-specific arguments.
pub type ListenerFn = Rc<dyn Fn(Action, &str, &[Value])>;

struct ListenerRecord {
    filter: Option<String>,
    callback: ListenerFn,
}

/// Per-instance listener buckets. Catch-all listeners are kept apart and
/// consulted for every action.
#[derive(Default)]
pub(crate) struct ListenerTable {
    by_action: HashMap<Action, Vec<ListenerRecord>>,
    catch_all: Vec<ListenerRecord>,
}

impl ListenerTable {
    /// Register a callback under `spec`, which is `action` or
    /// `action:path`.
    pub(crate) fn listen(&mut self, spec: &str, callback: ListenerFn) -> Result<(), Error> {
        let (name, filter) = match spec.split_once(':') {
            Some((name, path)) => (name, Some(path.to_string())),
            None => (spec, None),
        };
        let record = ListenerRecord { filter, callback };
        if name == "all" {
            self.catch_all.push(record);
            return Ok(());
        }
        let action = Action::from_name(name)
            .ok_or_else(|| Error::Configuration(format!("unknown listener action \"{}\"", name)))?;
        self.by_action.entry(action).or_insert_with(Vec::new).push(record);
        Ok(())
    }

    /// Collect the callbacks whose filter matches `path`.
    pub(crate) fn matching(&self, action: Action, path: &str, sep: char) -> Vec<ListenerFn> {
        let mut out = Vec::new();
        if let Some(records) = self.by_action.get(&action) {
            for record in records {
                if record.filter.as_ref().map_or(true, |f| filter_matches(f, path, sep)) {
                    out.push(record.callback.clone());
                }
            }
        }
        for record in &self.catch_all {
            if record.filter.as_ref().map_or(true, |f| filter_matches(f, path, sep)) {
                out.push(record.callback.clone());
            }
        }
        out
    }
}

fn filter_matches(filter: &str, path: &str, sep: char) -> bool {
    let fsegs: Vec<&str> = filter.split(sep).filter(|s| !s.is_empty()).collect();
    let psegs: Vec<&str> = path.split(sep).filter(|s| !s.is_empty()).collect();
    if fsegs.last() == Some(&"*") {
        if psegs.is_empty() {
            return fsegs.len() == 1;
        }
        return fsegs[..fsegs.len() - 1] == psegs[..psegs.len() - 1];
    }
    filter == path || psegs.last().map_or(false, |last| *last == filter)
}
