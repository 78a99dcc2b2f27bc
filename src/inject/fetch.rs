//! The resource-fetch seam.
//!
//! The transport itself lives outside this crate: callers hand in any
//! [`ResourceFetcher`] and the registry absorbs whatever it produces
//! through the normal `add`/`set` contract. A failed fetch is logged and
//! leaves the corresponding dependency absent - there is no retry. The
//! completion callback runs exactly once, after every descriptor has
//! been accounted for, success or failure.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::store::api::Registry;
use crate::store::error::Error;
use crate::store::value::Value;

/// One resource to load: `path` is handed to the fetcher verbatim,
/// `bind` is the registry path the decoded response lands at.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchDescriptor {
    pub path: String,
    pub bind: String,
}

/// Decode a descriptor list from a JSON document of the form
/// `[{"path": "...", "bind": "..."}, ...]`.
pub fn parse_manifest(json: &str) -> Result<Vec<FetchDescriptor>, Error> {
    serde_json::from_str(json)
        .map_err(|e| Error::Configuration(format!("bad fetch manifest: {}", e)))
}

/// Supplies raw resources by path. Implementations decide what `path`
/// means - a URL, a file, a test fixture.
pub trait ResourceFetcher {
    fn fetch(&self, path: &str) -> Result<serde_json::Value, String>;
}

impl Registry {
    /// Fetch every descriptor and absorb the decoded responses, then run
    /// `on_complete`.
    ///
    /// Merge rules at the `bind` path: an absent target is a plain
    /// `add`; a map response into a map target merges key by key with
    /// incoming keys winning; a list response into a populated target is
    /// nested under a `json` sub-key; anything else is a plain `set`.
    pub fn fetch<F>(
        &self,
        descriptors: &[FetchDescriptor],
        fetcher: &dyn ResourceFetcher,
        on_complete: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&Registry),
    {
        for descriptor in descriptors {
            match fetcher.fetch(&descriptor.path) {
                Ok(raw) => {
                    self.absorb(&descriptor.bind, Value::from(raw))?;
                    debug!(path = %descriptor.path, bind = %descriptor.bind, "resource absorbed");
                }
                Err(err) => {
                    warn!(path = %descriptor.path, error = %err, "resource fetch failed");
                }
            }
        }
        on_complete(self);
        Ok(())
    }

    fn absorb(&self, bind: &str, value: Value) -> Result<(), Error> {
        let existing = self.read(bind);
        if existing.is_undefined() {
            return self.add(bind, value);
        }
        let sep = self.separator();
        match (&existing, &value) {
            (Value::Map(_), Value::Map(incoming)) => {
                // Merge through the public contract so each key fires
                // its own event.
                let pairs: Vec<(String, Value)> = incoming
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (key, val) in pairs {
                    let path = format!("{}{}{}", bind, sep, key);
                    if self.read(&path).is_undefined() {
                        self.add(&path, val)?;
                    } else {
                        self.set(&path, val)?;
                    }
                }
                Ok(())
            }
            (Value::Map(_), Value::List(_)) => {
                let path = format!("{}{}json", bind, sep);
                if self.read(&path).is_undefined() {
                    self.add(&path, value)
                } else {
                    self.set(&path, value)
                }
            }
            _ => self.set(bind, value),
        }
    }
}
