//! The registry: a per-instance named store of values, addressed by
//! delimited path.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use uuid::Uuid;

use crate::env;
use crate::inject::cabinet::BindingRecord;
use crate::store::error::Error;
use crate::store::events::{Action, ListenerTable};
use crate::store::path::{read_path, split_tail, write_path};
use crate::store::value::{new_map, MapRef, Value};

pub(crate) struct Inner {
    pub(crate) id: String,
    pub(crate) entries: MapRef,
    pub(crate) separator: char,
    pub(crate) cabinet: Vec<BindingRecord>,
    pub(crate) listeners: ListenerTable,
}

/// A handle to one registry instance. Cloning the handle shares the
/// instance; dropping the last strong handle drops the instance, at
/// which point any surviving bound closures fail with
/// [`Error::Detached`].
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Rc<RefCell<Inner>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_entries(new_map())
    }

    /// Create a registry seeded from `props`. A map value is adopted by
    /// reference (not copied); anything else yields an empty registry.
    pub fn create(props: Value) -> Self {
        match props {
            Value::Map(m) => Self::with_entries(m),
            _ => Self::new(),
        }
    }

    fn with_entries(entries: MapRef) -> Self {
        let inner = Inner {
            id: Uuid::new_v4().to_hyphenated().to_string(),
            entries,
            separator: '.',
            cabinet: Vec::new(),
            listeners: ListenerTable::default(),
        };
        Registry {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// The instance's opaque unique identifier.
    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }

    pub(crate) fn same_instance(&self, other: &Registry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The entire entries mapping - a live reference, not a copy.
    pub fn entries(&self) -> MapRef {
        self.inner.borrow().entries.clone()
    }

    /// The current path delimiter.
    pub fn separator(&self) -> char {
        self.inner.borrow().separator
    }

    /// Change the path delimiter. Succeeds only for a non-alphanumeric,
    /// non-whitespace character; returns `false` and leaves the
    /// delimiter unchanged on rejection.
    pub fn set_separator(&self, sep: char) -> bool {
        if sep.is_alphanumeric() || sep.is_whitespace() {
            return false;
        }
        self.inner.borrow_mut().separator = sep;
        true
    }

    /// Resolve `path` against the current entries; `Undefined` when
    /// absent. Internal primitive behind `get`/`add`/`set`.
    pub(crate) fn read(&self, path: &str) -> Value {
        let (entries, sep) = {
            let inner = self.inner.borrow();
            (inner.entries.clone(), inner.separator)
        };
        read_path(path, &Value::Map(entries), sep)
    }

    /// Add a new item to the registry. The name may use delimiter
    /// notation, in which case a deep entry is built. Fails with
    /// [`Error::DuplicateKey`] if anything other than `Undefined`
    /// already lives at `name` - a stored `false` or empty map still
    /// counts as present.
    pub fn add(&self, name: &str, value: Value) -> Result<(), Error> {
        if !self.read(name).is_undefined() {
            return Err(Error::DuplicateKey(name.to_string()));
        }
        let (entries, sep) = {
            let inner = self.inner.borrow();
            (inner.entries.clone(), inner.separator)
        };
        if let Some((parent, last)) = split_tail(name, sep) {
            write_path(&parent, &entries, sep)
                .borrow_mut()
                .insert(last, value.clone());
        } else {
            return Err(Error::DuplicateKey(name.to_string()));
        }
        debug!(path = %name, "registry add");
        self.fire(Action::Add, name, &[value]);
        Ok(())
    }

    /// Add a value, first binding it to `paths` when it is callable.
    /// Non-callables are stored as-is.
    pub fn add_with(&self, name: &str, value: Value, paths: &[&str]) -> Result<(), Error> {
        self.add(name, self.bind_if_callable(value, paths)?)
    }

    /// Add every pair of `map` individually, recursing on [`add`].
    ///
    /// [`add`]: Registry::add
    pub fn add_all(&self, map: &MapRef) -> Result<(), Error> {
        // Snapshot first: a listener may touch the same map re-entrantly.
        let pairs: Vec<(String, Value)> = map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in pairs {
            self.add(&name, value)?;
        }
        Ok(())
    }

    /// Absorb a sequence of maps, each via [`add_all`].
    ///
    /// [`add_all`]: Registry::add_all
    pub fn add_many(&self, maps: &[MapRef]) -> Result<(), Error> {
        for map in maps {
            self.add_all(map)?;
        }
        Ok(())
    }

    /// Remove a named item. The parent mapping is rebuilt as a filtered
    /// copy excluding the final key; a top-level removal replaces the
    /// whole entries map. A no-op (apart from the `remove` event) when
    /// the path is absent or its parent is not a map.
    pub fn remove(&self, name: &str) {
        let name = name.trim();
        let (entries, sep) = {
            let inner = self.inner.borrow();
            (inner.entries.clone(), inner.separator)
        };
        if let Some((parent, last)) = split_tail(name, sep) {
            let parent_val = if parent.is_empty() {
                Value::Map(entries.clone())
            } else {
                read_path(&parent, &Value::Map(entries.clone()), sep)
            };
            if let Value::Map(old) = parent_val {
                let filtered = new_map();
                for (k, v) in old.borrow().iter() {
                    if k != &last {
                        filtered.borrow_mut().insert(k.clone(), v.clone());
                    }
                }
                if parent.is_empty() {
                    self.inner.borrow_mut().entries = filtered;
                } else {
                    // Write the rebuilt parent back directly so a remove
                    // fires exactly one event.
                    let (grandparent, parent_key) =
                        split_tail(&parent, sep).expect("parent path has segments");
                    write_path(&grandparent, &entries, sep)
                        .borrow_mut()
                        .insert(parent_key, Value::Map(filtered));
                }
            }
            debug!(path = %name, "registry remove");
            self.fire(Action::Remove, name, &[]);
        }
    }

    /// Remove each named item in turn.
    pub fn remove_many(&self, names: &[&str]) {
        for name in names {
            self.remove(name);
        }
    }

    /// Retrieve a named item. Returns the sentinel `Bool(false)` when
    /// resolution yields `Undefined` - callers cannot distinguish
    /// "absent" from a stored `false` through this method.
    pub fn get(&self, name: &str) -> Value {
        let value = self.read(name);
        self.fire(Action::Get, name, &[]);
        if value.is_undefined() {
            Value::Bool(false)
        } else {
            value
        }
    }

    /// Set a named item. Fails with [`Error::KeyNotFound`] when the path
    /// resolves to `Undefined` and its parent map has no own key for the
    /// final segment - the dual check keeps a previously-added
    /// `Undefined` entry settable.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        let (entries, sep) = {
            let inner = self.inner.borrow();
            (inner.entries.clone(), inner.separator)
        };
        let (parent, last) = match split_tail(name, sep) {
            Some(parts) => parts,
            None => return Ok(()),
        };
        if read_path(name, &Value::Map(entries.clone()), sep).is_undefined() {
            let parent_val = if parent.is_empty() {
                Value::Map(entries.clone())
            } else {
                read_path(&parent, &Value::Map(entries.clone()), sep)
            };
            let has_own = match parent_val {
                Value::Map(m) => m.borrow().contains_key(&last),
                _ => false,
            };
            if !has_own {
                return Err(Error::KeyNotFound(name.to_string()));
            }
        }
        write_path(&parent, &entries, sep)
            .borrow_mut()
            .insert(last, value.clone());
        debug!(path = %name, "registry set");
        self.fire(Action::Set, name, &[value]);
        Ok(())
    }

    /// Set a value, first binding it to `paths` when it is callable.
    pub fn set_with(&self, name: &str, value: Value, paths: &[&str]) -> Result<(), Error> {
        self.set(name, self.bind_if_callable(value, paths)?)
    }

    fn bind_if_callable(&self, value: Value, paths: &[&str]) -> Result<Value, Error> {
        if value.is_callable() && !paths.is_empty() {
            self.bind_in(paths, value, Value::Map(env::root()))
        } else {
            Ok(value)
        }
    }

    /// Apply `op` to the list stored at `name`, in place. Fails with
    /// [`Error::NotAnArray`] when the value there is not a list. The
    /// `listops` event carries the (possibly mutated) list and the op's
    /// return value.
    pub fn listops<F>(&self, name: &str, op: F) -> Result<Value, Error>
    where
        F: FnOnce(&mut Vec<Value>) -> Value,
    {
        let list = match self.read(name) {
            Value::List(l) => l,
            _ => return Err(Error::NotAnArray(name.to_string())),
        };
        let returned = op(&mut list.borrow_mut());
        debug!(path = %name, "registry listops");
        self.fire(
            Action::ListOps,
            name,
            &[Value::List(list), returned.clone()],
        );
        Ok(returned)
    }

    /// Call an executable registry item directly, with the registry
    /// itself as receiver. A non-callable target yields the sentinel
    /// `Bool(false)`.
    pub fn exec(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.exec_in(name, args, Value::Registry(self.clone()))
    }

    /// Call an executable registry item with an explicit receiver.
    pub fn exec_in(&self, name: &str, args: Vec<Value>, ctx: Value) -> Result<Value, Error> {
        match self.get(name) {
            Value::Func(f) => f.invoke(ctx, args),
            _ => Ok(Value::Bool(false)),
        }
    }

    /// Register a listener. `spec` is an action name (`add`, `set`,
    /// `get`, `remove`, `listops`, `all`), optionally followed by
    /// `:path` to filter by path.
    pub fn listen<F>(&self, spec: &str, callback: F) -> Result<(), Error>
    where
        F: Fn(Action, &str, &[Value]) + 'static,
    {
        self.inner
            .borrow_mut()
            .listeners
            .listen(spec, Rc::new(callback))
    }

    /// Number of binding records accumulated by this instance.
    pub fn binding_count(&self) -> usize {
        self.inner.borrow().cabinet.len()
    }

    /// Dispatch an event to every matching listener. Callbacks run after
    /// the internal borrow is released and may re-enter the registry.
    pub(crate) fn fire(&self, action: Action, path: &str, extra: &[Value]) {
        let callbacks = {
            let inner = self.inner.borrow();
            inner.listeners.matching(action, path, inner.separator)
        };
        for callback in callbacks {
            callback(action, path, extra);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
