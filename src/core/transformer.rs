//! Turns the nginx upstream check module's JSON status page into a Zabbix
//! low-level discovery document.
//!
//! The status document looks like
//!
//! ```json
//! {"servers": {"total": 2, "generation": 1, "server": [
//!     {"index": 0, "upstream": "backend", "name": "10.0.0.1:80", "status": "up", "rise": 10, "fall": 0, "type": "http", "port": 0}
//! ]}}
//! ```
//!
//! Only `index`, `upstream`, `name` and `status` are kept. A missing or
//! oddly typed field never fails the document, it falls back to `0` / `""`.

use serde_json::Value;

use crate::core::ent::{DiscoveryDocument, ServerRecord};
use crate::core::error::{Error, Result};

const SERVERS_POINTER: &str = "/servers/server";

/// Full pipeline: raw status text in, tab-indented discovery JSON out.
pub fn transform(raw_body: &str) -> Result<String> {
    discover(raw_body)?.to_pretty_json()
}

/// Parses the status text and projects every server into a discovery entry.
pub fn discover(raw_body: &str) -> Result<DiscoveryDocument> {
    let root: Value = serde_json::from_str(raw_body).map_err(Error::Parse)?;
    let doc: DiscoveryDocument = server_values(&root).map(extract_record).collect();
    tracing::debug!("discovered {} upstream servers", doc.len());
    Ok(doc)
}

fn server_values(root: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match root.pointer(SERVERS_POINTER) {
        Some(Value::Array(servers)) => Box::new(servers.iter()),
        Some(Value::Object(servers)) => Box::new(servers.values()),
        None => {
            tracing::debug!("no servers.server in status document");
            Box::new(std::iter::empty())
        }
        // a lone value still counts as one server, every field defaulted
        Some(other) => {
            tracing::warn!("servers.server is not a list: {}", other);
            Box::new(std::iter::once(other))
        }
    }
}

fn extract_record(server: &Value) -> ServerRecord {
    ServerRecord {
        index: int_field(server, "index"),
        upstream: string_field(server, "upstream"),
        name: string_field(server, "name"),
        status: string_field(server, "status"),
    }
}

fn int_field(server: &Value, field: &str) -> i64 {
    match server.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Some(Value::String(s)) => parse_int(s.trim()),
        Some(Value::Bool(b)) => i64::from(*b),
        other => {
            tracing::trace!("field {} defaulted to 0 (found {:?})", field, other);
            0
        }
    }
}

fn parse_int(s: &str) -> i64 {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or_default()
}

fn string_field(server: &Value, field: &str) -> String {
    match server.get(field) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => {
            tracing::trace!("field {} defaulted to empty string", field);
            String::new()
        }
        Some(other) => other.to_string(),
    }
}
