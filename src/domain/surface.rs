/// Surface Snapshot
///
/// The set of member names each module exposes. Module order is kept as
/// inserted (or as written in JSON); members are kept sorted.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SurfaceSnapshot {
    modules: IndexMap<String, BTreeSet<String>>,
}

/// Accepted JSON shapes for one module's members.
#[derive(Deserialize)]
#[serde(untagged)]
enum MemberListing {
    /// `["name", ...]`
    Names(Vec<String>),
    /// `{"name": <type or nested object>, ...}` as captured inside the host
    Detailed(IndexMap<String, serde_json::Value>),
}

impl SurfaceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"module": [names...]}` or the detailed capture shape.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: IndexMap<String, MemberListing> =
            serde_json::from_str(json).context("Invalid surface snapshot JSON")?;

        let mut snapshot = Self::new();
        for (module, listing) in raw {
            let names: Vec<String> = match listing {
                MemberListing::Names(names) => names,
                MemberListing::Detailed(map) => map.into_keys().collect(),
            };
            snapshot.insert_module(module, names);
        }
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize surface snapshot")
    }

    /// Add `names` to `module`, creating the module if needed.
    pub fn insert_module<I, S>(&mut self, module: impl Into<String>, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules
            .entry(module.into())
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn members(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.modules.get(module)
    }

    pub fn contains_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Copy containing only the named modules, in the order given.
    pub fn restricted_to(&self, modules: &[String]) -> Self {
        let mut out = Self::new();
        for m in modules {
            if let Some(members) = self.modules.get(m) {
                out.modules.insert(m.clone(), members.clone());
            }
        }
        out
    }
}
