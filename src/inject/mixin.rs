//! Shared operation table.
//!
//! The Rust rendition of prototype extension: a process-wide
//! (thread-local) table of named callables shared by every registry
//! instance. Installing a map copies its callable members into the
//! table; [`Registry::invoke`] dispatches one with the registry itself
//! as receiver.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::store::api::Registry;
use crate::store::error::Error;
use crate::store::value::{FuncRef, MapRef, Value};

thread_local! {
    static MIXINS: RefCell<HashMap<String, FuncRef>> = RefCell::new(HashMap::new());
}

/// Copy every callable property of `map` into the shared operation
/// table, overwriting same-named operations. Non-callables are skipped.
/// Returns the number of operations installed.
pub fn install_mixins(map: &MapRef) -> usize {
    let mut installed = 0;
    MIXINS.with(|table| {
        let mut table = table.borrow_mut();
        for (name, value) in map.borrow().iter() {
            if let Value::Func(func) = value {
                table.insert(name.clone(), func.clone());
                installed += 1;
            }
        }
    });
    debug!(installed, "mixins installed");
    installed
}

impl Registry {
    /// Call a shared operation with this registry as receiver. Unknown
    /// names fail with [`Error::KeyNotFound`].
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let func = MIXINS
            .with(|table| table.borrow().get(name).cloned())
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))?;
        func.invoke(Value::Registry(self.clone()), args)
    }
}
