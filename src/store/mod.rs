//! The value store: dynamically typed values, delimited path access,
//! the per-instance registry and its mutation events.
//!
//! A [`Registry`] owns a tree of [`Value`]s addressed by delimited path
//! (`.` by default, configurable per instance). `add` refuses to
//! overwrite, `set` refuses to create, `remove` rebuilds the parent
//! mapping, and every mutation notifies the instance's listeners.

pub mod api;
pub mod error;
pub mod events;
pub mod path;
pub mod value;

pub use api::Registry;
pub use error::Error;
pub use events::{Action, ListenerFn};
pub use path::{read_path, write_path};
pub use value::{new_list, new_map, FnKind, FuncRef, FuncValue, ListRef, MapRef, NativeFn, Value};
