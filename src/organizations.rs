//! `organizations init`.

use crate::api::Platform;
use crate::collect::require_non_empty;
use crate::dispatch::{CommandError, created_entity, emit_created, payload, submit};
use crate::document::ConfigDocument;
use crate::session::Session;
use clap::Args;
use std::io::Write;

#[derive(Args, Debug, Clone, Default)]
pub struct OrganizationInitArgs {
    #[arg(long, help = "Name of the organization")]
    pub name: String,
    #[arg(
        long = "network",
        value_name = "NETWORK_ID",
        help = "Network to associate with the organization (defaults to the configured network)"
    )]
    pub network: Option<String>,
}

/// The organization config only carries the session's network, which may be
/// empty.
pub fn organization_config(session: &Session) -> ConfigDocument {
    ConfigDocument::new().with("network_id", session.network_id().unwrap_or(""))
}

pub fn init<W: Write>(
    args: OrganizationInitArgs,
    session: &mut Session,
    platform: &Platform,
    out: &mut W,
) -> Result<(), CommandError> {
    let name = require_non_empty("name", &args.name)?;
    if let Some(network) = args.network.as_deref().filter(|n| !n.trim().is_empty()) {
        session.use_network(network);
    }
    let token = session.require_token()?.to_string();

    let params = payload(&[("name", name.as_str())], organization_config(session));
    let json = submit(|| platform.create_organization(&token, &params))?;
    let created = created_entity(&json)?;
    session.record_organization(&created.id);
    emit_created(out, &created)?;
    Ok(())
}
