// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies for the §6 request table. The CI plugin ABI pairs every
//! body with a status code; that pairing is the transport's concern, so this
//! module only shapes the body string.

use serde::Serialize;

/// A handled request's result body.
#[derive(Debug, Clone)]
pub enum PluginResponse {
    /// `{}` — most mutating requests (`server-ping`, `create-agent`, `job-completion`).
    Empty,
    /// The literal `"true"`/`"false"` string body `should-assign-work` uses —
    /// deliberately not a JSON `true`/`false`, per §6.
    Bool(bool),
    /// A JSON-serializable body (`get-icon`, `get-capabilities`,
    /// `migrate-config`, `get-*-metadata`, `validate-*`).
    Json(serde_json::Value),
    /// An HTML view (`*-status-report`).
    Html(String),
}

impl PluginResponse {
    pub fn json(value: impl Serialize) -> Self {
        Self::Json(serde_json::to_value(value).unwrap_or(serde_json::Value::Null))
    }

    /// Render to the wire body a transport would send verbatim.
    pub fn body(&self) -> String {
        match self {
            Self::Empty => "{}".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Json(value) => value.to_string(),
            Self::Html(html) => html.clone(),
        }
    }
}

/// A failure response: logged, then turned into a 500-equivalent body (§7
/// propagation policy) — except `validate-*`, which models failure as a
/// normal `Json` body of `{key, message}` entries instead of this type.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_body_is_the_bare_literal_not_json() {
        assert_eq!(PluginResponse::Bool(true).body(), "true");
        assert_eq!(PluginResponse::Bool(false).body(), "false");
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(PluginResponse::Empty.body(), "{}");
    }
}
