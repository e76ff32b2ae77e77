//! Per-invocation session context.
//!
//! A [`Session`] is built once in `main` from the resolved configuration and
//! handed by reference to each command. Commands read the token and
//! identifiers from it and record what they create, so later steps of the
//! same invocation see the new ids.

use crate::config::EffectiveConfig;
use crate::dispatch::CommandError;
use tracing::debug;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    issued_token: bool,
    network_id: Option<String>,
    organization_id: Option<String>,
    node_id: Option<String>,
    user_id: Option<String>,
}

impl Session {
    pub fn new(config: &EffectiveConfig) -> Self {
        Self {
            token: config.api_token.clone(),
            network_id: config.network_id.clone(),
            organization_id: config.organization_id.clone(),
            ..Self::default()
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn require_token(&self) -> Result<&str, CommandError> {
        self.token().ok_or_else(|| {
            CommandError::Validation(
                "API token is required; authenticate with `prvd users authenticate` or pass --token"
                    .into(),
            )
        })
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Token obtained during this invocation, if any.
    pub fn issued_token(&self) -> Option<&str> {
        if self.issued_token {
            self.token()
        } else {
            None
        }
    }

    pub fn use_network(&mut self, network_id: &str) {
        self.network_id = Some(network_id.to_string());
    }

    pub fn record_node(&mut self, node_id: &str) {
        debug!(node_id, "recorded node");
        self.node_id = Some(node_id.to_string());
    }

    pub fn record_organization(&mut self, organization_id: &str) {
        debug!(organization_id, "recorded organization");
        self.organization_id = Some(organization_id.to_string());
    }

    pub fn record_user(&mut self, user_id: &str) {
        debug!(user_id, "recorded user");
        self.user_id = Some(user_id.to_string());
    }

    pub fn record_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
        self.issued_token = true;
    }
}
