//! Kubernetes `NodeList` wire types and conversion.
//!
//! Only the fields nodewarden reads are modelled; everything else in the
//! API response is ignored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use nodewarden_core::{Allocatable, NodeCondition, NodeObservation};

#[derive(Debug, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

#[derive(Debug, Deserialize)]
pub struct Node {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: NodeStatusWire,
}

#[derive(Debug, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusWire {
    #[serde(default)]
    pub conditions: Vec<ConditionWire>,
    #[serde(default)]
    pub addresses: Vec<AddressWire>,
    #[serde(default)]
    pub node_info: NodeInfoWire,
    #[serde(default)]
    pub allocatable: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionWire {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AddressWire {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeInfoWire {
    pub kubelet_version: String,
    pub os_image: String,
    pub architecture: String,
}

impl From<Node> for NodeObservation {
    fn from(node: Node) -> Self {
        let status = node.status;
        let address = status
            .addresses
            .iter()
            .find(|a| a.kind == "InternalIP")
            .map(|a| a.address.clone())
            .unwrap_or_default();
        let quantity = |key: &str| status.allocatable.get(key).cloned().unwrap_or_default();

        NodeObservation {
            name: node.metadata.name,
            conditions: status
                .conditions
                .iter()
                .map(|c| NodeCondition {
                    condition_type: c.kind.clone(),
                    status: c.status.clone(),
                    last_transition: c.last_transition_time,
                })
                .collect(),
            address,
            kubelet_version: status.node_info.kubelet_version.clone(),
            os_image: status.node_info.os_image.clone(),
            architecture: status.node_info.architecture.clone(),
            allocatable: Allocatable {
                cpu: quantity("cpu"),
                memory: quantity("memory"),
                pods: quantity("pods"),
            },
        }
    }
}
