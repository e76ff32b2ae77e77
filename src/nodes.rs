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

//! `nodes init`: assembles a node configuration and submits it to a network.

use crate::api::Platform;
use crate::collect::{parse_ports, require_non_empty};
use crate::dispatch::{CommandError, created_entity, emit_created, payload, submit};
use crate::document::ConfigDocument;
use crate::session::Session;
use clap::{ArgAction, Args};
use std::io::Write;
use tracing::debug;

const ANY_EGRESS: &str = "*";
const ANY_SOURCE: &str = "0.0.0.0/0";

#[derive(Args, Debug, Clone, Default)]
pub struct NodeInitArgs {
    #[arg(long = "network", value_name = "NETWORK_ID", help = "Target network id")]
    pub network: String,
    #[arg(
        long,
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
        help = "When true, genesis state and peer resolution are enforced during initialization"
    )]
    pub p2p: bool,
    #[arg(
        long,
        help = "Docker image; can be an official image name or fully-qualified repo"
    )]
    pub image: String,
    #[arg(long, help = "Role for the node, i.e., peer, validator, nats")]
    pub role: String,
    #[arg(long, value_name = "PATH", help = "Path for the http health check on the node")]
    pub health_check_path: Option<String>,
    #[arg(
        long = "tcp-ingress",
        value_name = "PORTS",
        help = "Comma-separated tcp ingress ports to open on the node"
    )]
    pub tcp_ingress: Option<String>,
    #[arg(
        long = "udp-ingress",
        value_name = "PORTS",
        help = "Comma-separated udp ingress ports to open on the node"
    )]
    pub udp_ingress: Option<String>,
    #[command(flatten)]
    pub infrastructure: InfrastructureArgs,
}

/// Where and how the node is provisioned.
#[derive(Args, Debug, Clone)]
pub struct InfrastructureArgs {
    #[arg(long, default_value = "docker", help = "Infrastructure provider to use for the deployment")]
    pub provider: String,
    #[arg(long, default_value = "us-east-1", help = "Target region in which to provision the node")]
    pub region: String,
    #[arg(long, default_value = "aws", help = "Target infrastructure platform")]
    pub target: String,
    #[arg(long = "engine", value_name = "ENGINE_ID", help = "Consensus engine id")]
    pub engine: Option<String>,
    #[arg(long, help = "Container definition to run instead of (or alongside) --image")]
    pub container: Option<String>,
    #[arg(long, help = "Task role assumed by the node's container")]
    pub task_role: Option<String>,
    #[arg(long, value_name = "KEY", help = "AWS access key id for the target infrastructure")]
    pub aws_access_key_id: Option<String>,
    #[arg(long, value_name = "SECRET", help = "AWS secret access key for the target infrastructure")]
    pub aws_secret_access_key: Option<String>,
}

impl Default for InfrastructureArgs {
    fn default() -> Self {
        Self {
            provider: "docker".into(),
            region: "us-east-1".into(),
            target: "aws".into(),
            engine: None,
            container: None,
            task_role: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
        }
    }
}

/// Validated inputs for a node configuration. Optional values are empty
/// strings when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInputs {
    pub network_id: String,
    pub p2p: bool,
    pub image: String,
    pub container: String,
    pub task_role: String,
    pub role: String,
    pub provider_id: String,
    pub region: String,
    pub target_id: String,
    pub engine_id: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub health_check_path: String,
    pub tcp_ingress: Vec<u64>,
    pub udp_ingress: Vec<u64>,
}

impl NodeInputs {
    pub fn collect(args: NodeInitArgs) -> Result<Self, CommandError> {
        let infra = args.infrastructure;
        Ok(Self {
            network_id: require_non_empty("network", &args.network)?,
            p2p: args.p2p,
            image: args.image,
            container: infra.container.unwrap_or_default(),
            task_role: infra.task_role.unwrap_or_default(),
            role: require_non_empty("role", &args.role)?,
            provider_id: infra.provider,
            region: infra.region,
            target_id: infra.target,
            engine_id: infra.engine.unwrap_or_default(),
            aws_access_key_id: infra.aws_access_key_id.unwrap_or_default(),
            aws_secret_access_key: infra.aws_secret_access_key.unwrap_or_default(),
            health_check_path: args.health_check_path.unwrap_or_default(),
            tcp_ingress: parse_ports("tcp", args.tcp_ingress.as_deref().unwrap_or(""))?,
            udp_ingress: parse_ports("udp", args.udp_ingress.as_deref().unwrap_or(""))?,
        })
    }
}

pub fn credentials_config(inputs: &NodeInputs) -> ConfigDocument {
    ConfigDocument::new()
        .with_non_empty("aws_access_key_id", &inputs.aws_access_key_id)
        .with_non_empty("aws_secret_access_key", &inputs.aws_secret_access_key)
}

pub fn env_config() -> ConfigDocument {
    ConfigDocument::new()
}

pub fn security_config(tcp: &[u64], udp: &[u64], health_check_path: &str) -> ConfigDocument {
    let rule = ConfigDocument::new()
        .with("tcp", tcp.to_vec())
        .with("udp", udp.to_vec());

    let mut security = ConfigDocument::new()
        .with("egress", ANY_EGRESS)
        .with("ingress", ConfigDocument::new().with(ANY_SOURCE, rule));

    if !health_check_path.is_empty() {
        security.insert(
            "health_check",
            ConfigDocument::new().with("path", health_check_path),
        );
    }

    security
}

pub fn node_config(inputs: &NodeInputs) -> ConfigDocument {
    ConfigDocument::new()
        .with("credentials", credentials_config(inputs))
        .with("engine_id", inputs.engine_id.as_str())
        .with("env", env_config())
        .with("p2p", inputs.p2p)
        .with("provider_id", inputs.provider_id.as_str())
        .with("region", inputs.region.as_str())
        .with("role", inputs.role.as_str())
        .with("target_id", inputs.target_id.as_str())
        .with_non_empty("container", &inputs.container)
        .with_non_empty("image", &inputs.image)
        .with_non_empty("task_role", &inputs.task_role)
        .with(
            "security",
            security_config(
                &inputs.tcp_ingress,
                &inputs.udp_ingress,
                &inputs.health_check_path,
            ),
        )
}

pub fn init<W: Write>(
    args: NodeInitArgs,
    session: &mut Session,
    platform: &Platform,
    out: &mut W,
) -> Result<(), CommandError> {
    let inputs = NodeInputs::collect(args)?;
    let token = session.require_token()?.to_string();
    session.use_network(&inputs.network_id);

    debug!(network_id = %inputs.network_id, role = %inputs.role, "assembling node config");
    let params = payload(
        &[("network_id", inputs.network_id.as_str())],
        node_config(&inputs),
    );

    let json = submit(|| platform.create_network_node(&token, &inputs.network_id, &params))?;
    let created = created_entity(&json)?;
    session.record_node(&created.id);
    emit_created(out, &created)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveConfig;
    use crate::document::ConfigValue;
    use httpmock::prelude::*;
    use serde_json::json;

    fn args() -> NodeInitArgs {
        NodeInitArgs {
            network: "net-1".into(),
            p2p: true,
            image: "redis".into(),
            role: "redis".into(),
            ..NodeInitArgs::default()
        }
    }

    fn session(token: Option<&str>) -> Session {
        Session::new(&EffectiveConfig {
            api_token: token.map(str::to_string),
            ident_url: "http://unused.test".into(),
            goldmine_url: "http://unused.test".into(),
            network_id: None,
            organization_id: None,
        })
    }

    #[test]
    fn assembles_full_node_document() {
        let mut args = args();
        args.tcp_ingress = Some("80,443".into());
        args.udp_ingress = Some("30303".into());
        args.health_check_path = Some("/status".into());
        args.infrastructure.engine = Some("ethash".into());
        args.infrastructure.aws_access_key_id = Some("AKIA".into());

        let inputs = NodeInputs::collect(args).unwrap();
        let doc = serde_json::to_value(node_config(&inputs)).unwrap();

        assert_eq!(
            doc,
            json!({
                "credentials": {"aws_access_key_id": "AKIA"},
                "engine_id": "ethash",
                "env": {},
                "image": "redis",
                "p2p": true,
                "provider_id": "docker",
                "region": "us-east-1",
                "role": "redis",
                "target_id": "aws",
                "security": {
                    "egress": "*",
                    "ingress": {"0.0.0.0/0": {"tcp": [80, 443], "udp": [30303]}},
                    "health_check": {"path": "/status"}
                }
            })
        );
    }

    #[test]
    fn optional_keys_present_only_when_supplied() {
        let mut bare = args();
        bare.image = String::new();
        let doc = node_config(&NodeInputs::collect(bare).unwrap());
        for key in ["container", "image", "task_role"] {
            assert!(!doc.contains_key(key), "{key} should be absent");
        }

        let mut full = args();
        full.infrastructure.container = Some("redis-container".into());
        full.infrastructure.task_role = Some("ecsTaskRole".into());
        let doc = node_config(&NodeInputs::collect(full).unwrap());
        assert_eq!(doc.get("image"), Some(&ConfigValue::from("redis")));
        assert_eq!(doc.get("container"), Some(&ConfigValue::from("redis-container")));
        assert_eq!(doc.get("task_role"), Some(&ConfigValue::from("ecsTaskRole")));
    }

    #[test]
    fn empty_sub_documents_are_kept() {
        let doc = node_config(&NodeInputs::collect(args()).unwrap());
        assert!(doc.document("credentials").is_some_and(ConfigDocument::is_empty));
        assert!(doc.document("env").is_some_and(ConfigDocument::is_empty));
    }

    #[test]
    fn health_check_only_with_path() {
        let without = security_config(&[], &[], "");
        assert!(!without.contains_key("health_check"));
        assert_eq!(
            serde_json::to_value(&without).unwrap(),
            json!({"egress": "*", "ingress": {"0.0.0.0/0": {"tcp": [], "udp": []}}})
        );

        let with = security_config(&[22], &[], "/healthz");
        assert_eq!(
            serde_json::to_value(with.get("health_check")).unwrap(),
            json!({"path": "/healthz"})
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let inputs = NodeInputs::collect(args()).unwrap();
        assert_eq!(node_config(&inputs), node_config(&inputs));
        assert_eq!(
            serde_json::to_string(&node_config(&inputs)).unwrap(),
            serde_json::to_string(&node_config(&inputs)).unwrap()
        );
    }

    #[test]
    fn rejects_bad_port_and_empty_network() {
        let mut bad_port = args();
        bad_port.tcp_ingress = Some("80,abc".into());
        assert!(matches!(
            NodeInputs::collect(bad_port),
            Err(CommandError::InvalidPort { protocol: "tcp", .. })
        ));

        for blank in ["", "   "] {
            let mut no_network = args();
            no_network.network = blank.into();
            assert!(matches!(
                NodeInputs::collect(no_network),
                Err(CommandError::Validation(_))
            ));
        }
    }

    #[test]
    fn init_submits_and_prints_created_node() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/networks/net-1/nodes")
                .header("Authorization", "Bearer tok")
                .json_body(json!({
                    "network_id": "net-1",
                    "config": {
                        "credentials": {},
                        "engine_id": "",
                        "env": {},
                        "image": "redis",
                        "p2p": false,
                        "provider_id": "docker",
                        "region": "us-east-1",
                        "role": "redis",
                        "target_id": "aws",
                        "security": {
                            "egress": "*",
                            "ingress": {"0.0.0.0/0": {"tcp": [6379], "udp": []}}
                        }
                    }
                }));
            then.status(201).json_body(json!({"id": "abc123", "name": "node-1"}));
        });

        let platform = Platform::new("http://unused.test", &server.base_url());
        let mut session = session(Some("tok"));
        let mut out = Vec::new();
        let mut args = args();
        args.p2p = false;
        args.tcp_ingress = Some("6379".into());

        init(args, &mut session, &platform, &mut out).unwrap();

        mock.assert();
        assert_eq!(String::from_utf8(out).unwrap(), "abc123\tnode-1\n");
        assert_eq!(session.node_id(), Some("abc123"));
        assert_eq!(session.network_id(), Some("net-1"));
    }

    #[test]
    fn init_rejection_prints_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/networks/net-1/nodes");
            then.status(422).body(r#"{"errors":["image is invalid"]}"#);
        });

        let platform = Platform::new("http://unused.test", &server.base_url());
        let mut session = session(Some("tok"));
        let mut out = Vec::new();

        let err = init(args(), &mut session, &platform, &mut out).unwrap_err();

        assert!(err.to_string().contains("image is invalid"));
        assert!(out.is_empty());
        assert_eq!(session.node_id(), None);
    }

    #[test]
    fn invalid_port_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(201);
        });

        let platform = Platform::new(&server.base_url(), &server.base_url());
        let mut session = session(Some("tok"));
        let mut args = args();
        args.udp_ingress = Some("30303,abc".into());

        let err = init(args, &mut session, &platform, &mut Vec::new()).unwrap_err();

        mock.assert_hits(0);
        assert_eq!(err.to_string(), "invalid udp ingress port: \"abc\"");
    }

    #[test]
    fn init_requires_token() {
        let platform = Platform::new("http://unused.test", "http://unused.test");
        let mut session = session(None);
        let err = init(args(), &mut session, &platform, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[test]
    fn identifiers_are_sent_as_given() {
        let mut padded = args();
        padded.network = " net-1 ".into();
        padded.role = "peer ".into();

        let inputs = NodeInputs::collect(padded).unwrap();

        assert_eq!(inputs.network_id, " net-1 ");
        assert_eq!(inputs.role, "peer ");
    }
}
