// prvd - CLI for the Provide platform API
// Copyright (C) 2024 The prvd contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Request dispatch and result interpretation shared by the create commands
//!
//! Every create command ends the same way: one request, a 201 or a failure,
//! and on success a single `id<TAB>name` line on stdout. Nothing is retried.

use crate::client::ResponseData;
use crate::document::ConfigDocument;
use serde_json::Value;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    /// A required value is missing or empty. Raised before any request.
    #[error("{0}")]
    Validation(String),
    /// A port list contained a token that is not a non-negative integer.
    #[error("invalid {protocol} ingress port: {token:?}")]
    InvalidPort {
        protocol: &'static str,
        token: String,
    },
    #[error("prompt cancelled")]
    Cancelled,
    #[error("reading input: {0}")]
    Prompt(String),
    /// The request never completed.
    #[error("{0}")]
    Transport(String),
    /// The request completed with anything other than 201.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// A 201 whose body lacks the fields the command needs.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    /// The user exists remotely; the authentication that follows creation failed.
    #[error("user {user_id} was created but authentication failed")]
    FollowUp {
        user_id: String,
        #[source]
        source: Box<CommandError>,
    },
    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

impl CommandError {
    pub fn missing(field: &str) -> Self {
        CommandError::Validation(format!("{field} is required"))
    }
}

/// The entity a create request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub id: String,
    pub name: String,
}

/// Outer request body: top-level identifiers plus the assembled config
/// under `config`.
pub fn payload(identifiers: &[(&str, &str)], config: ConfigDocument) -> ConfigDocument {
    let mut outer = ConfigDocument::new();
    for (key, value) in identifiers {
        outer.insert(key, *value);
    }
    outer.with("config", config)
}

/// Runs a single request, folding transport failures and non-201 statuses
/// into [`CommandError`].
pub fn submit<F>(send: F) -> Result<Value, CommandError>
where
    F: FnOnce() -> anyhow::Result<ResponseData>,
{
    let response = send().map_err(|err| CommandError::Transport(format!("{err:#}")))?;
    debug!(status = response.status, "create request completed");

    if !response.is_created() {
        return Err(CommandError::Rejected {
            status: response.status,
            body: response.body,
        });
    }

    response.json.ok_or_else(|| {
        CommandError::UnexpectedResponse(format!("body is not JSON: {}", response.body))
    })
}

/// Reads the id and display name out of a created entity.
pub fn created_entity(json: &Value) -> Result<Created, CommandError> {
    let id = json
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CommandError::UnexpectedResponse(format!("no id in {json}")))?;

    Ok(Created {
        id: id.to_string(),
        name: display_name(json),
    })
}

fn display_name(json: &Value) -> String {
    if let Some(name) = json.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    let first = json.get("first_name").and_then(Value::as_str).unwrap_or("");
    let last = json.get("last_name").and_then(Value::as_str).unwrap_or("");
    format!("{first} {last}").trim().to_string()
}

pub fn emit_created<W: Write>(out: &mut W, created: &Created) -> Result<(), CommandError> {
    writeln!(out, "{}\t{}", created.id, created.name)?;
    out.flush()?;
    Ok(())
}
