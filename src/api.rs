//! Remote operations of the Provide platform used by the create commands.

use crate::client::{ApiClient, ResponseData};
use anyhow::Result;
use serde::Serialize;
use serde_json::json;

/// Entry points for the ident (organizations, users, auth) and goldmine
/// (networks, nodes) services.
#[derive(Debug, Clone)]
pub struct Platform {
    ident_url: String,
    goldmine_url: String,
}

impl Platform {
    pub fn new(ident_url: &str, goldmine_url: &str) -> Self {
        Self {
            ident_url: ident_url.to_string(),
            goldmine_url: goldmine_url.to_string(),
        }
    }

    pub fn create_network_node<T: Serialize + ?Sized>(
        &self,
        token: &str,
        network_id: &str,
        params: &T,
    ) -> Result<ResponseData> {
        ApiClient::new(&self.goldmine_url, Some(token))?
            .post_json(&["api", "v1", "networks", network_id, "nodes"], params)
    }

    pub fn create_organization<T: Serialize + ?Sized>(
        &self,
        token: &str,
        params: &T,
    ) -> Result<ResponseData> {
        ApiClient::new(&self.ident_url, Some(token))?
            .post_json(&["api", "v1", "organizations"], params)
    }

    pub fn create_user<T: Serialize + ?Sized>(&self, params: &T) -> Result<ResponseData> {
        ApiClient::new(&self.ident_url, None)?.post_json(&["api", "v1", "users"], params)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<ResponseData> {
        ApiClient::new(&self.ident_url, None)?.post_json(
            &["api", "v1", "authenticate"],
            &json!({ "email": email, "password": password }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn network_id_cannot_reroute_node_creation() {
        let server = MockServer::start();
        let traversal = server.mock(|when, then| {
            when.method(POST).path("/api/v1/networks/other/nodes");
            then.status(201).json_body(json!({"id": "wrong"}));
        });
        let truncated = server.mock(|when, then| {
            when.method(POST).path("/api/v1/networks/net");
            then.status(201).json_body(json!({"id": "wrong"}));
        });
        let truncated_nodes = server.mock(|when, then| {
            when.method(POST).path("/api/v1/networks/net/nodes");
            then.status(201).json_body(json!({"id": "wrong"}));
        });

        let platform = Platform::new("http://unused.test", &server.base_url());
        for network_id in ["net-1/../other", "net?x=", "net#x"] {
            let response = platform
                .create_network_node("tok", network_id, &json!({}))
                .unwrap();
            assert_ne!(response.status, 201, "{network_id} was rerouted");
        }

        traversal.assert_hits(0);
        truncated.assert_hits(0);
        truncated_nodes.assert_hits(0);
    }
}
