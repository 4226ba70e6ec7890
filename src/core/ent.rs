use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::error::{Error, Result};

pub const INDEX_MACRO: &str = "{#INDEX}";
pub const UPSTREAM_MACRO: &str = "{#UPSTREAM}";
pub const NAME_MACRO: &str = "{#NAME}";
pub const STATUS_MACRO_PREFIX: &str = "{#STATUS} of ";

/// One element of `servers.server` after field extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRecord {
    pub index: i64,
    pub upstream: String,
    pub name: String,
    pub status: String,
}

impl ServerRecord {
    /// Macro key carrying this server's health state, e.g.
    /// `{#STATUS} of 10.0.0.1:80`.
    pub fn status_key(&self) -> String {
        format!("{}{}", STATUS_MACRO_PREFIX, self.name)
    }
}

/// A flat macro map for a single discovered server. The status key depends
/// on the server name, so this is a map and not a struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiscoveryEntry(Map<String, Value>);

impl DiscoveryEntry {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ServerRecord> for DiscoveryEntry {
    fn from(record: ServerRecord) -> Self {
        let status_key = record.status_key();
        let mut macros = Map::new();
        macros.insert(INDEX_MACRO.to_string(), Value::from(record.index));
        macros.insert(UPSTREAM_MACRO.to_string(), Value::String(record.upstream));
        macros.insert(NAME_MACRO.to_string(), Value::String(record.name));
        macros.insert(status_key, Value::String(record.status));
        DiscoveryEntry(macros)
    }
}

/// Zabbix low-level discovery payload: `{"data": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryDocument {
    pub data: Vec<DiscoveryEntry>,
}

impl DiscoveryDocument {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Serializes with one tab of indentation per level.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(Error::Serialize)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl FromIterator<ServerRecord> for DiscoveryDocument {
    fn from_iter<I: IntoIterator<Item = ServerRecord>>(iter: I) -> Self {
        DiscoveryDocument {
            data: iter.into_iter().map(DiscoveryEntry::from).collect(),
        }
    }
}
