// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Decoding of GitHub REST error documents into `StatusError::Api`.
//
// `errors` entries come either as plain strings or as objects with
// `resource`/`field`/`code` and an optional `message`.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::status::StatusError;

#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<Value>,
}

fn render_sub_error(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(message) = map.get("message").and_then(Value::as_str) {
                return Some(message.to_string());
            }
            let parts: Vec<&str> = ["resource", "field", "code"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn api_error(status: u16, body: &str) -> StatusError {
    let document: ErrorDocument = serde_json::from_str(body).unwrap_or_default();
    let message = if document.message.is_empty() {
        match body.trim() {
            "" => format!("HTTP {status}"),
            raw => format!("HTTP {status}: {raw}"),
        }
    } else {
        document.message
    };

    StatusError::Api {
        status,
        message,
        errors: document.errors.iter().filter_map(render_sub_error).collect(),
    }
}
