use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::store::api::Registry;
use crate::store::error::Error;

/// Shared nested mapping. Clones alias the same storage.
pub type MapRef = Rc<RefCell<HashMap<String, Value>>>;

/// Shared list. Clones alias the same storage.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared callable. Identity-compared by the binding cabinet.
pub type FuncRef = Rc<FuncValue>;

/// Function signature for native callables. Receives the invocation
/// receiver and the assembled argument list.
pub type NativeFn = fn(this: Value, args: Vec<Value>) -> Result<Value, Error>;

/// A callable - either compiled-in or closure-provided.
pub enum Callable {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),
    /// Boxed closure - small vtable indirection cost.
    Boxed(Box<dyn Fn(Value, Vec<Value>) -> Result<Value, Error>>),
}

/// How a callable is invoked: as a plain function, or as a factory that
/// constructs a fresh instance on every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FnKind {
    Plain,
    Factory,
}

/// A callable value together with its invocation kind and, for factories,
/// the prototype map copied onto every constructed instance.
pub struct FuncValue {
    pub kind: FnKind,
    call: Callable,
    pub proto: Option<MapRef>,
}

impl FuncValue {
    pub fn plain(f: NativeFn) -> Self {
        FuncValue {
            kind: FnKind::Plain,
            call: Callable::Native(f),
            proto: None,
        }
    }

    pub fn plain_boxed<F>(f: F) -> Self
    where
        F: Fn(Value, Vec<Value>) -> Result<Value, Error> + 'static,
    {
        FuncValue {
            kind: FnKind::Plain,
            call: Callable::Boxed(Box::new(f)),
            proto: None,
        }
    }

    pub fn factory_boxed<F>(f: F, proto: Option<MapRef>) -> Self
    where
        F: Fn(Value, Vec<Value>) -> Result<Value, Error> + 'static,
    {
        FuncValue {
            kind: FnKind::Factory,
            call: Callable::Boxed(Box::new(f)),
            proto,
        }
    }

    fn raw_call(&self, this: Value, args: Vec<Value>) -> Result<Value, Error> {
        match &self.call {
            Callable::Native(f) => f(this, args),
            Callable::Boxed(f) => f(this, args),
        }
    }

    /// Execute this callable. Plain functions run against the supplied
    /// receiver. Factories ignore it: a fresh instance map is created,
    /// seeded from the prototype, and used as the receiver; an explicit
    /// object-valued return overrides the instance.
    pub fn invoke(&self, this: Value, args: Vec<Value>) -> Result<Value, Error> {
        match self.kind {
            FnKind::Plain => self.raw_call(this, args),
            FnKind::Factory => {
                let instance = new_map();
                if let Some(proto) = &self.proto {
                    for (k, v) in proto.borrow().iter() {
                        instance.borrow_mut().insert(k.clone(), v.clone());
                    }
                }
                let ret = self.raw_call(Value::Map(instance.clone()), args)?;
                if ret.is_object() {
                    Ok(ret)
                } else {
                    Ok(Value::Map(instance))
                }
            }
        }
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FuncValue({:?})", self.kind)
    }
}

/// A dynamically typed registry value. Scalars are held by value;
/// lists, maps and callables are shared by reference, so cloning a
/// `Value` aliases the same underlying storage.
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(ListRef),
    Map(MapRef),
    Func(FuncRef),
    Registry(Registry),
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(n) => Value::Float(*n),
            Value::Str(s) => Value::Str(s.to_string()),
            Value::List(l) => Value::List(l.clone()),
            Value::Map(m) => Value::Map(m.clone()),
            Value::Func(f) => Value::Func(f.clone()),
            Value::Registry(r) => Value::Registry(r.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            (Value::Registry(a), Value::Registry(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Float(n) => write!(f, "Value::Float({})", n),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::List(l) => write!(f, "Value::List(len={})", l.borrow().len()),
            Value::Map(m) => write!(f, "Value::Map(len={})", m.borrow().len()),
            Value::Func(_) => write!(f, "Value::Func(...)"),
            Value::Registry(r) => write!(f, "Value::Registry({})", r.id()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::List(l) => write!(f, "list({})", l.borrow().len()),
            Value::Map(m) => write!(f, "map({})", m.borrow().len()),
            Value::Func(_) => write!(f, "function"),
            Value::Registry(r) => write!(f, "registry({})", r.id()),
        }
    }
}

impl Value {
    /// Build a plain callable from a function pointer.
    pub fn native(f: NativeFn) -> Value {
        Value::Func(Rc::new(FuncValue::plain(f)))
    }

    /// Build a plain callable from a capturing closure.
    pub fn closure<F>(f: F) -> Value
    where
        F: Fn(Value, Vec<Value>) -> Result<Value, Error> + 'static,
    {
        Value::Func(Rc::new(FuncValue::plain_boxed(f)))
    }

    /// Build a factory callable. Every invocation constructs a fresh
    /// instance map seeded with the entries of `proto`.
    pub fn factory<F>(f: F, proto: MapRef) -> Value
    where
        F: Fn(Value, Vec<Value>) -> Result<Value, Error> + 'static,
    {
        Value::Func(Rc::new(FuncValue::factory_boxed(f, Some(proto))))
    }

    /// Build a flat map value from key/value pairs.
    pub fn map_of(pairs: Vec<(&str, Value)>) -> Value {
        let m = new_map();
        for (k, v) in pairs {
            m.borrow_mut().insert(k.to_string(), v);
        }
        Value::Map(m)
    }

    /// Build a list value.
    pub fn list_of(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Func(_))
    }

    /// Object-valued in the constructor-return sense: anything shared by
    /// reference rather than held by value.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Map(_) | Value::Func(_) | Value::Registry(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<MapRef> {
        match self {
            Value::Map(m) => Some(m.clone()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<ListRef> {
        match self {
            Value::List(l) => Some(l.clone()),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<FuncRef> {
        match self {
            Value::Func(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// Dispatch a callable member of a map value, with the map itself as
    /// the receiver.
    pub fn call_method(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let map = match self {
            Value::Map(m) => m.clone(),
            _ => return Err(Error::NotCallable(name.to_string())),
        };
        let member = map.borrow().get(name).cloned();
        match member {
            Some(Value::Func(f)) => f.invoke(self.clone(), args),
            Some(_) => Err(Error::NotCallable(name.to_string())),
            None => Err(Error::KeyNotFound(name.to_string())),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::list_of(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => {
                let m = new_map();
                for (k, v) in fields {
                    m.borrow_mut().insert(k, Value::from(v));
                }
                Value::Map(m)
            }
        }
    }
}

/// Allocate an empty shared map.
pub fn new_map() -> MapRef {
    Rc::new(RefCell::new(HashMap::new()))
}

/// Allocate an empty shared list.
pub fn new_list() -> ListRef {
    Rc::new(RefCell::new(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_aliases_maps() {
        let m = new_map();
        let a = Value::Map(m.clone());
        let b = a.clone();
        m.borrow_mut().insert("k".to_string(), Value::Int(1));
        assert_eq!(a, b);
        if let Value::Map(inner) = &b {
            assert_eq!(inner.borrow().len(), 1);
        }
    }

    #[test]
    fn test_equality_is_identity_for_aggregates() {
        let a = Value::map_of(vec![("k", Value::Int(1))]);
        let b = Value::map_of(vec![("k", Value::Int(1))]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"n": 3, "f": 1.5, "s": "x", "l": [true, null]}"#).unwrap();
        let v = Value::from(json);
        let m = v.as_map().unwrap();
        assert_eq!(m.borrow().get("n"), Some(&Value::Int(3)));
        assert_eq!(m.borrow().get("f"), Some(&Value::Float(1.5)));
        assert_eq!(m.borrow().get("s"), Some(&Value::Str("x".to_string())));
        let l = m.borrow().get("l").unwrap().as_list().unwrap();
        assert_eq!(l.borrow().as_slice(), &[Value::Bool(true), Value::Null]);
    }

    #[test]
    fn test_factory_constructs_instances() {
        let proto = new_map();
        proto.borrow_mut().insert(
            "tag".to_string(),
            Value::native(|_this, _args| Ok(Value::from("tagged"))),
        );
        let factory = Value::factory(
            |this, args| {
                if let Value::Map(m) = &this {
                    m.borrow_mut()
                        .insert("arg".to_string(), args.into_iter().next().unwrap());
                }
                Ok(Value::Undefined)
            },
            proto,
        );
        let f = factory.as_func().unwrap();
        let instance = f.invoke(Value::Undefined, vec![Value::Int(7)]).unwrap();
        let m = instance.as_map().unwrap();
        assert_eq!(m.borrow().get("arg"), Some(&Value::Int(7)));
        assert_eq!(
            instance.call_method("tag", vec![]).unwrap(),
            Value::from("tagged")
        );
    }
}
