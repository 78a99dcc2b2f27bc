//! Delimited path access over nested map values.

use crate::store::value::{new_map, MapRef, Value};

/// Read the value at a delimited `path` inside `root`. Splits on `sep`,
/// drops empty segments and walks map by map; a missing or non-map
/// intermediate short-circuits to `Undefined`. A path with no non-empty
/// segments reads as the root itself.
pub fn read_path(path: &str, root: &Value, sep: char) -> Value {
    let mut cur = root.clone();
    for seg in path.split(sep).filter(|s| !s.is_empty()) {
        let next = match &cur {
            Value::Map(m) => m.borrow().get(seg).cloned().unwrap_or(Value::Undefined),
            _ => return Value::Undefined,
        };
        cur = next;
    }
    cur
}

/// Walk `root` along `path`, creating an empty map at every missing
/// segment, and return the innermost map. The final leaf is not created;
/// callers assign it themselves after passing the path minus its last
/// segment. A non-map value sitting at an intermediate segment is
/// replaced by a fresh map.
pub fn write_path(path: &str, root: &MapRef, sep: char) -> MapRef {
    let mut cur = root.clone();
    for seg in path.split(sep).filter(|s| !s.is_empty()) {
        let next = {
            let mut map = cur.borrow_mut();
            match map.get(seg) {
                Some(Value::Map(m)) => m.clone(),
                _ => {
                    let fresh = new_map();
                    map.insert(seg.to_string(), Value::Map(fresh.clone()));
                    fresh
                }
            }
        };
        cur = next;
    }
    cur
}

/// Split a path into its parent (joined with `sep`) and final segment.
/// `None` when the path has no non-empty segments.
pub(crate) fn split_tail(path: &str, sep: char) -> Option<(String, String)> {
    let mut segs: Vec<&str> = path.split(sep).filter(|s| !s.is_empty()).collect();
    let last = segs.pop()?;
    Some((segs.join(&sep.to_string()), last.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_intermediate() {
        let root = Value::map_of(vec![("a", Value::Int(1))]);
        assert_eq!(read_path("a", &root, '.'), Value::Int(1));
        assert_eq!(read_path("a.b.c", &root, '.'), Value::Undefined);
        assert_eq!(read_path("x", &root, '.'), Value::Undefined);
    }

    #[test]
    fn test_read_empty_path_is_root() {
        let root = Value::map_of(vec![("a", Value::Int(1))]);
        assert_eq!(read_path("", &root, '.'), root);
        assert_eq!(read_path("...", &root, '.'), root);
    }

    #[test]
    fn test_write_autovivifies() {
        let root = new_map();
        let innermost = write_path("a.b", &root, '.');
        innermost
            .borrow_mut()
            .insert("c".to_string(), Value::Int(9));
        assert_eq!(
            read_path("a.b.c", &Value::Map(root), '.'),
            Value::Int(9)
        );
    }

    #[test]
    fn test_write_replaces_non_map_intermediate() {
        let root = new_map();
        root.borrow_mut()
            .insert("a".to_string(), Value::Bool(false));
        let innermost = write_path("a", &root, '.');
        innermost
            .borrow_mut()
            .insert("b".to_string(), Value::Int(2));
        assert_eq!(
            read_path("a.b", &Value::Map(root), '.'),
            Value::Int(2)
        );
    }

    #[test]
    fn test_split_tail() {
        assert_eq!(
            split_tail("a.b.c", '.'),
            Some(("a.b".to_string(), "c".to_string()))
        );
        assert_eq!(split_tail("a", '.'), Some(("".to_string(), "a".to_string())));
        assert_eq!(split_tail("", '.'), None);
        assert_eq!(
            split_tail("a#b", '#'),
            Some(("a".to_string(), "b".to_string()))
        );
    }
}
