//! The binding cabinet.
//!
//! Every bind operation appends a [`BindingRecord`] linking the original
//! target function, its parsed dependency tokens, its execution context
//! and the externally visible bound closure. The closure is the record's
//! identity: [`wrap`], [`copy`] and introspection look records up by
//! comparing closure pointers, never by content.
//!
//! One operation exists per call shape:
//!
//! | operation         | context       | installed?                    |
//! |-------------------|---------------|-------------------------------|
//! | `bind`            | ambient root  | no - closure returned         |
//! | `bind_in`         | explicit      | no - closure returned         |
//! | `bind_named`      | ambient root  | at `name` on the root object  |
//! | `bind_named_in`   | the target    | at `name` on the target       |
//! | `bind_with`       | config or root| iff the config carries a name |
//!
//! Records are never pruned; callers may hold closure identities for
//! `wrap`/`copy` indefinitely. `binding_count` exposes the growth.
//!
//! [`wrap`]: crate::store::api::Registry::wrap
//! [`copy`]: crate::store::api::Registry::copy

use std::rc::Rc;

use crate::env;
use crate::inject::resolve::{run, DepToken};
use crate::store::api::Registry;
use crate::store::error::Error;
use crate::store::path::{split_tail, write_path};
use crate::store::value::{FuncRef, FuncValue, MapRef, Value};

/// One cabinet entry.
pub struct BindingRecord {
    pub(crate) target: FuncRef,
    pub(crate) tokens: Vec<DepToken>,
    pub(crate) ctx: Value,
    pub(crate) bound: FuncRef,
}

/// The configuration-struct bind shape. `name` triggers installation,
/// onto `target` when given, otherwise onto the ambient root object.
pub struct BindConfig {
    pub name: Option<String>,
    pub bindings: Vec<String>,
    pub func: Value,
    pub ctx: Option<Value>,
    pub target: Option<MapRef>,
}

/// Build the externally visible closure for a binding. It captures a
/// weak handle so a closure stored inside its own registry does not keep
/// the instance alive; calling it after the registry is gone fails with
/// [`Error::Detached`].
fn make_bound(registry: &Registry, tokens: Vec<DepToken>, target: FuncRef, ctx: Value) -> FuncRef {
    let weak = Rc::downgrade(&registry.inner);
    Rc::new(FuncValue::plain_boxed(move |_this, free| {
        let inner = weak.upgrade().ok_or(Error::Detached)?;
        let registry = Registry { inner };
        run(&registry, &tokens, &target, &ctx, free)
    }))
}

impl Registry {
    /// Bind `func` to the dependency `paths` anonymously, with the
    /// ambient root object as context. Returns the bound closure.
    pub fn bind(&self, paths: &[&str], func: Value) -> Result<Value, Error> {
        self.bind_in(paths, func, Value::Map(env::root()))
    }

    /// Bind `func` to the dependency `paths` with an explicit context.
    pub fn bind_in(&self, paths: &[&str], func: Value, ctx: Value) -> Result<Value, Error> {
        let target = func
            .as_func()
            .ok_or_else(|| Error::Configuration("binding target is not callable".to_string()))?;
        let tokens = paths.iter().map(|p| DepToken::parse(p)).collect();
        Ok(self.bind_record(tokens, target, ctx))
    }

    /// Bind and install the closure at `name` (delimiter notation,
    /// auto-vivifying) on the ambient root object.
    pub fn bind_named(&self, name: &str, paths: &[&str], func: Value) -> Result<Value, Error> {
        self.bind_named_in(name, paths, func, env::root())
    }

    /// Bind with `target` as both context and install target.
    pub fn bind_named_in(
        &self,
        name: &str,
        paths: &[&str],
        func: Value,
        target: MapRef,
    ) -> Result<Value, Error> {
        let bound = self.bind_in(paths, func, Value::Map(target.clone()))?;
        self.install(name, &target, bound.clone());
        Ok(bound)
    }

    /// Bind from a configuration struct.
    pub fn bind_with(&self, config: BindConfig) -> Result<Value, Error> {
        let ctx = config.ctx.unwrap_or_else(|| Value::Map(env::root()));
        let paths: Vec<&str> = config.bindings.iter().map(String::as_str).collect();
        let bound = self.bind_in(&paths, config.func, ctx)?;
        if let Some(name) = config.name {
            let target = config.target.unwrap_or_else(env::root);
            self.install(&name, &target, bound.clone());
        }
        Ok(bound)
    }

    fn install(&self, name: &str, target: &MapRef, value: Value) {
        let sep = self.separator();
        if let Some((parent, last)) = split_tail(name, sep) {
            write_path(&parent, target, sep)
                .borrow_mut()
                .insert(last, value);
        }
    }

    pub(crate) fn bind_record(&self, tokens: Vec<DepToken>, target: FuncRef, ctx: Value) -> Value {
        let bound = make_bound(self, tokens.clone(), target.clone(), ctx.clone());
        self.inner.borrow_mut().cabinet.push(BindingRecord {
            target,
            tokens,
            ctx,
            bound: bound.clone(),
        });
        Value::Func(bound)
    }

    fn find_record(&self, bound: &FuncRef) -> Option<(FuncRef, Vec<DepToken>, Value, FuncRef)> {
        let inner = self.inner.borrow();
        inner
            .cabinet
            .iter()
            .find(|record| Rc::ptr_eq(&record.bound, bound))
            .map(|record| {
                (
                    record.target.clone(),
                    record.tokens.clone(),
                    record.ctx.clone(),
                    record.bound.clone(),
                )
            })
    }

    /// Wrap a previously bound closure in `wrapper`. The wrapper is
    /// invoked with a re-callable stand-in for the original closure as
    /// its first argument, followed by the call's own arguments; calling
    /// the stand-in with arguments overrides the outer ones. `None` when
    /// `bound` is not a cabinet closure.
    pub fn wrap(&self, bound: &Value, wrapper: &Value, ctx: Option<Value>) -> Option<Value> {
        let bound_ref = bound.as_func()?;
        let wrapper_ref = wrapper.as_func()?;
        let (_, _, _, original) = self.find_record(&bound_ref)?;
        let ctx = ctx.unwrap_or_else(|| Value::Registry(self.clone()));
        Some(Value::closure(move |_this, call_args: Vec<Value>| {
            let outer = call_args.clone();
            let inner_bound = original.clone();
            let inner_ctx = ctx.clone();
            let stand_in = Value::closure(move |_t, override_args: Vec<Value>| {
                let args = if override_args.is_empty() {
                    outer.clone()
                } else {
                    override_args
                };
                inner_bound.invoke(inner_ctx.clone(), args)
            });
            let mut wrapper_args = Vec::with_capacity(call_args.len() + 1);
            wrapper_args.push(stand_in);
            wrapper_args.extend(call_args);
            wrapper_ref.invoke(ctx.clone(), wrapper_args)
        }))
    }

    /// Copy an existing bound closure under a new dependency list,
    /// reusing the original target function. The context falls back to
    /// the source record's. Returns the new bound closure, or `None`
    /// when `bound` is not a cabinet closure.
    pub fn copy(&self, paths: &[&str], bound: &Value, ctx: Option<Value>) -> Option<Value> {
        let bound_ref = bound.as_func()?;
        let (target, _, record_ctx, _) = self.find_record(&bound_ref)?;
        let tokens = paths.iter().map(|p| DepToken::parse(p)).collect();
        Some(self.bind_record(tokens, target, ctx.unwrap_or(record_ctx)))
    }
}
