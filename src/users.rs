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

//! `users create` and `users authenticate`.
//!
//! Creating a user is followed by an authentication with the same
//! credentials. If that second call fails the command fails too, even though
//! the user already exists remotely; nothing is rolled back.

use crate::api::Platform;
use crate::dispatch::{CommandError, created_entity, emit_created, submit};
use crate::document::ConfigDocument;
use crate::prompt::{Prompter, flag_or_prompt};
use crate::session::Session;
use clap::Args;
use serde_json::Value;
use std::io::Write;
use tracing::debug;

#[derive(Args, Debug, Clone, Default)]
pub struct UserCreateArgs {
    #[arg(long, help = "First name (prompted when omitted)")]
    pub first_name: Option<String>,
    #[arg(long, help = "Last name (prompted when omitted)")]
    pub last_name: Option<String>,
    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    #[arg(long, help = "Email address (prompted when omitted)")]
    pub email: Option<String>,
    #[arg(long, help = "Password (prompted when omitted)")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn collect<P: Prompter + ?Sized>(
        args: CredentialArgs,
        prompter: &mut P,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            email: flag_or_prompt(prompter, args.email, "Email", false)?,
            password: flag_or_prompt(prompter, args.password, "Password", true)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInputs {
    pub first_name: String,
    pub last_name: String,
    pub credentials: Credentials,
}

impl UserInputs {
    /// Prompts in order: first name, last name, email, password.
    pub fn collect<P: Prompter + ?Sized>(
        args: UserCreateArgs,
        prompter: &mut P,
    ) -> Result<Self, CommandError> {
        let first_name = flag_or_prompt(prompter, args.first_name, "First Name", false)?;
        let last_name = flag_or_prompt(prompter, args.last_name, "Last Name", false)?;
        let credentials = Credentials::collect(args.credentials, prompter)?;
        Ok(Self {
            first_name,
            last_name,
            credentials,
        })
    }
}

pub fn user_params(inputs: &UserInputs) -> ConfigDocument {
    ConfigDocument::new()
        .with("email", inputs.credentials.email.as_str())
        .with("password", inputs.credentials.password.as_str())
        .with("first_name", inputs.first_name.as_str())
        .with("last_name", inputs.last_name.as_str())
}

pub fn create<W: Write, P: Prompter + ?Sized>(
    args: UserCreateArgs,
    session: &mut Session,
    platform: &Platform,
    prompter: &mut P,
    out: &mut W,
) -> Result<(), CommandError> {
    let inputs = UserInputs::collect(args, prompter)?;
    let params = user_params(&inputs);

    let json = submit(|| platform.create_user(&params))?;
    let created = created_entity(&json)?;
    session.record_user(&created.id);
    debug!(user_id = %created.id, "user created; authenticating");

    login(platform, &inputs.credentials, session).map_err(|err| CommandError::FollowUp {
        user_id: created.id.clone(),
        source: Box::new(err),
    })?;

    emit_created(out, &created)?;
    Ok(())
}

pub fn authenticate<W: Write, P: Prompter + ?Sized>(
    args: CredentialArgs,
    session: &mut Session,
    platform: &Platform,
    prompter: &mut P,
    out: &mut W,
) -> Result<(), CommandError> {
    let credentials = Credentials::collect(args, prompter)?;
    login(platform, &credentials, session)?;
    writeln!(out, "authenticated {}", credentials.email)?;
    Ok(())
}

fn login(
    platform: &Platform,
    credentials: &Credentials,
    session: &mut Session,
) -> Result<(), CommandError> {
    let json = submit(|| platform.authenticate(&credentials.email, &credentials.password))?;
    let token = issued_token(&json)
        .ok_or_else(|| CommandError::UnexpectedResponse("no token in authentication response".into()))?;
    session.record_token(token);
    Ok(())
}

fn issued_token(json: &Value) -> Option<&str> {
    let token = json.get("token")?;
    token
        .get("token")
        .and_then(Value::as_str)
        .or_else(|| token.as_str())
        .filter(|t| !t.is_empty())
}
