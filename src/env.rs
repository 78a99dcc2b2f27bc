//! The ambient root object.
//!
//! A thread-local map standing in for the mutable global scope: it is
//! the default binding context, the install target for named bindings,
//! and the object `global:`-prefixed dependency tokens resolve against.
//! Registry values are `Rc`-based and single-threaded, so each thread
//! owns its own root.

use crate::store::value::{new_map, MapRef};

thread_local! {
    static ROOT: MapRef = new_map();
}

/// The live ambient root object for the current thread.
pub fn root() -> MapRef {
    ROOT.with(|root| root.clone())
}
