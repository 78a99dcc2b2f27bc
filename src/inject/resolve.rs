//! Call-time dependency resolution.
//!
//! A binding declares an ordered list of dependency tokens. Each call of
//! the bound closure resolves every token against the registry's state
//! *at that moment* - two calls can observe different values when the
//! registry was mutated in between - and hands the resolved values to
//! the target function ahead of the caller's own arguments.

use tracing::trace;

use crate::env;
use crate::store::api::Registry;
use crate::store::error::Error;
use crate::store::path::read_path;
use crate::store::value::{FuncRef, Value};

/// One entry in a binding's dependency list, parsed once at bind time.
#[derive(Clone, Debug, PartialEq)]
pub enum DepToken {
    /// The empty token: a deliberate placeholder slot, resolves to
    /// `Undefined`.
    Skip,
    /// `*`: the entire current entries map, live.
    All,
    /// `this`: the owning registry instance.
    SelfRef,
    /// `global:<path>`: resolved against the ambient root object,
    /// ignoring the registry.
    Global(String),
    /// A registry path.
    Path(String),
}

impl DepToken {
    pub fn parse(raw: &str) -> DepToken {
        if raw.is_empty() {
            DepToken::Skip
        } else if raw == "*" {
            DepToken::All
        } else if raw == "this" {
            DepToken::SelfRef
        } else if let Some(rest) = raw.strip_prefix("global:") {
            DepToken::Global(rest.to_string())
        } else {
            DepToken::Path(raw.to_string())
        }
    }
}

fn resolve_token(registry: &Registry, token: &DepToken) -> Value {
    match token {
        DepToken::Skip => Value::Undefined,
        DepToken::All => Value::Map(registry.entries()),
        DepToken::SelfRef => Value::Registry(registry.clone()),
        DepToken::Global(path) => read_path(
            path,
            &Value::Map(env::root()),
            registry.separator(),
        ),
        DepToken::Path(path) => registry.read(path),
    }
}

/// Resolve `tokens` against the registry's current state, append the
/// caller's free arguments, and invoke `target` with `ctx` as receiver.
/// Factory targets construct an instance and ignore the receiver.
pub(crate) fn run(
    registry: &Registry,
    tokens: &[DepToken],
    target: &FuncRef,
    ctx: &Value,
    free: Vec<Value>,
) -> Result<Value, Error> {
    let mut args: Vec<Value> = tokens
        .iter()
        .map(|token| resolve_token(registry, token))
        .collect();
    trace!(injected = args.len(), free = free.len(), "resolving binding");
    args.extend(free);
    target.invoke(ctx.clone(), args)
}
