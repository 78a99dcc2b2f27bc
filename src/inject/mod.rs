//! The binding subsystem: the cabinet of binding records, call-time
//! dependency resolution, shared operations and the resource-fetch seam.
//!
//! Binding associates a function with an ordered list of dependency
//! tokens and an execution context. The returned closure resolves its
//! tokens against the registry's *current* state on every call:
//!
//! ```text
//! bind(["first.second"], f)      declare dependencies
//!      |
//! cabinet record                 target fn + tokens + context + closure
//!      |
//! closure(free args...)          look up tokens now, prepend results,
//!      |                         append free args
//! f(resolved..., free...)        plain call or factory construction
//! ```

pub mod cabinet;
pub mod fetch;
pub mod mixin;
pub mod resolve;

pub use cabinet::{BindConfig, BindingRecord};
pub use fetch::{parse_manifest, FetchDescriptor, ResourceFetcher};
pub use mixin::install_mixins;
pub use resolve::DepToken;
