//! # ampule - a path-addressed value registry with function binding
//!
//! A lightweight dependency registry: named values addressed by
//! delimited path, and bound functions whose declared dependencies are
//! looked up in the registry and injected at call time.
//!
//! ## Quick Start
//!
//! ### Storing and retrieving values
//!
//! ```
//! use ampule::{Registry, Value};
//!
//! let registry = Registry::new();
//! registry.add("data", Value::from("somedata")).unwrap();
//! assert_eq!(registry.get("data"), Value::from("somedata"));
//!
//! // Absent paths read as the sentinel `false`.
//! assert_eq!(registry.get("missing"), Value::Bool(false));
//!
//! // `set` updates, `add` refuses to overwrite.
//! registry.set("data", Value::from("newdata")).unwrap();
//! assert!(registry.add("data", Value::from("again")).is_err());
//! ```
//!
//! ### Binding functions to registry paths
//!
//! A bound function declares the registry paths it depends on. The
//! resolved values are injected ahead of the caller's own arguments,
//! and resolution happens on every call, so a bound function always
//! sees the registry's current state:
//!
//! ```
//! use ampule::{Registry, Value};
//!
//! let registry = Registry::create(Value::map_of(vec![(
//!     "first",
//!     Value::map_of(vec![("second", Value::from("done"))]),
//! )]));
//!
//! let func = Value::native(|_this, args| {
//!     let data = args[0].as_str().unwrap_or("").to_string();
//!     let msg = args[1].as_str().unwrap_or("").to_string();
//!     Ok(Value::from(format!("{} - {}", msg, data)))
//! });
//! registry.add_with("func", func, &["first.second"]).unwrap();
//!
//! let out = registry
//!     .exec("func", vec![Value::from("hello world")])
//!     .unwrap();
//! assert_eq!(out, Value::from("hello world - done"));
//! ```
//!
//! ### Listening for mutations
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ampule::{Registry, Value};
//!
//! let registry = Registry::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! registry
//!     .listen("add", move |action, path, _args| {
//!         log.borrow_mut().push(format!("{}:{}", action.name(), path));
//!     })
//!     .unwrap();
//!
//! registry.add("data", Value::from(1i64)).unwrap();
//! assert_eq!(seen.borrow().len(), 1);
//! assert_eq!(seen.borrow()[0], "add:data");
//! ```
//!
//! ## Architecture
//!
//! - **[`store`]** - the dynamic [`Value`] model, delimited path
//!   access, the [`Registry`] itself and its mutation events
//! - **[`inject`]** - the binding cabinet, call-time dependency
//!   resolution, shared operations and the resource-fetch seam
//! - **[`env`]** - the ambient root object: default binding context and
//!   the root `global:`-prefixed dependency tokens resolve against
//!
//! Everything is single-threaded and synchronous: values are shared
//! with `Rc<RefCell<...>>`, and no operation suspends.

pub mod env;
pub mod inject;
pub mod store;

pub use inject::{
    install_mixins, parse_manifest, BindConfig, DepToken, FetchDescriptor, ResourceFetcher,
};
pub use store::{
    new_list, new_map, Action, Error, FnKind, FuncRef, FuncValue, ListRef, MapRef, NativeFn,
    Registry, Value,
};

/// Current version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
