//! JSON-RPC 2.0 over plain HTTP, plus the few helpers needed to read geth's
//! hex-encoded quantities and persist raw responses.

use crate::errors::{BootError, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::{fs, io};
use std::path::Path;

const REQUEST_ID: u64 = 1;

/// Something that can carry a JSON-RPC call to the node and hand back the
/// whole response body.
pub trait RpcTransport {
    fn call(&self, method: &str, params: Value) -> Result<Value>;
}

/// Unauthenticated HTTP transport on top of the blocking reqwest client.
/// No timeout is set; calls wait as long as the client's defaults allow.
pub struct HttpRpc {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Self {
        HttpRpc {
            client: reqwest::blocking::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Request envelope shared by every call.
pub fn request_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": REQUEST_ID,
    })
}

impl RpcTransport for HttpRpc {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let transport_err = |e: reqwest::Error| BootError::RpcTransport {
            method: method.to_string(),
            reason: e.to_string(),
        };

        // The body is parsed regardless of HTTP status; geth reports RPC level
        // failures inside the JSON.
        let response = self
            .client
            .post(&self.url)
            .json(&request_body(method, params))
            .send()
            .map_err(transport_err)?;

        tracing::trace!(method, status = %response.status(), "rpc response");
        response.json::<Value>().map_err(transport_err)
    }
}

/// Parses a geth quantity (`"0x1a"`) into a number.
pub fn parse_quantity(value: &Value) -> Result<u64> {
    let wide = parse_wide_quantity(value)?;
    u64::try_from(wide).map_err(|_| BootError::RpcResponse {
        method: "quantity".to_string(),
        body: value.to_string(),
    })
}

/// Same as `parse_quantity` but wide enough for wei amounts.
pub fn parse_wide_quantity(value: &Value) -> Result<u128> {
    let invalid = || BootError::RpcResponse {
        method: "quantity".to_string(),
        body: value.to_string(),
    };
    let text = value.as_str().ok_or_else(invalid)?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u128::from_str_radix(digits, 16).map_err(|_| invalid())
}

/// Reads `key` from a JSON object as a quantity, treating a missing key as zero.
pub fn quantity_field(object: &Value, key: &str) -> Result<u64> {
    match object.get(key) {
        Some(v) => parse_quantity(v),
        None => Ok(0),
    }
}

/// Encodes a number the way geth expects block numbers in params.
pub fn format_quantity(n: u64) -> String {
    format!("{:#x}", n)
}

/// Writes a response body to disk, pretty-printed with four-space indentation.
pub fn write_status(path: &Path, body: &Value) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    body.serialize(&mut serializer).map_err(io::Error::from)?;
    fs::write(path, buf)?;
    Ok(())
}
