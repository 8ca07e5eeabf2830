//! Monitored-resource label profiles.
//!
//! Two generations of resource schema exist in the wild: the current
//! pod-level `k8s_pod` resource and the legacy container-level
//! `gke_container` resource. Both are resolved from the same inputs
//! (instance metadata plus the identity flags), selected by
//! [`ResourceModel`].

use std::collections::BTreeMap;

use rackpulse_gcp::{GcpResult, MetadataClient};
use tracing::{debug, warn};

use crate::error::{ExportError, ExportResult};

/// Which label profile the agent's writes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceModel {
    /// Current pod-level resource (`k8s_pod`).
    Pod,
    /// Legacy container-level resource (`gke_container`).
    Container,
}

/// Identity of the pod the agent sits beside, from process flags.
#[derive(Debug, Clone)]
pub struct PodIdentity {
    pub namespace: String,
    pub pod_name: String,
    /// Required by the legacy container model only.
    pub pod_id: Option<String>,
}

/// Immutable monitored-resource identity, resolved once at startup and
/// reused unchanged for every write the process issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabels {
    resource_type: &'static str,
    labels: BTreeMap<String, String>,
}

impl ResourceLabels {
    /// Resolve the label mapping for `model` from instance metadata and
    /// the pod identity.
    ///
    /// A failed metadata lookup labels that field blank rather than
    /// failing startup; an unpublishable label set surfaces as a
    /// backend rejection at write time.
    /// Resolution is pure given its inputs: the same metadata values
    /// and identity always produce an identical mapping, in identical
    /// iteration order.
    pub async fn resolve(
        model: ResourceModel,
        identity: &PodIdentity,
        metadata: &MetadataClient,
    ) -> ExportResult<Self> {
        let resolved = match model {
            ResourceModel::Pod => {
                let project_id = or_blank("project_id", metadata.project_id().await);
                let location = or_blank(
                    "location",
                    metadata.instance_attribute("cluster-location").await,
                );
                let cluster_name = or_blank(
                    "cluster_name",
                    metadata.instance_attribute("cluster-name").await,
                );

                let mut labels = BTreeMap::new();
                labels.insert("project_id".to_string(), project_id);
                labels.insert("location".to_string(), location);
                labels.insert("cluster_name".to_string(), cluster_name);
                labels.insert("namespace_name".to_string(), identity.namespace.clone());
                labels.insert("pod_name".to_string(), identity.pod_name.clone());
                Self {
                    resource_type: "k8s_pod",
                    labels,
                }
            }
            ResourceModel::Container => {
                let pod_id = identity.pod_id.clone().ok_or(ExportError::MissingPodId)?;
                let project_id = or_blank("project_id", metadata.project_id().await);
                let zone = or_blank("zone", metadata.zone().await);
                let cluster_name = or_blank(
                    "cluster_name",
                    metadata.instance_attribute("cluster-name").await,
                );

                let mut labels = BTreeMap::new();
                labels.insert("project_id".to_string(), project_id);
                labels.insert("zone".to_string(), zone);
                labels.insert("cluster_name".to_string(), cluster_name);
                labels.insert("namespace_id".to_string(), identity.namespace.clone());
                labels.insert("pod_id".to_string(), pod_id);
                // The legacy schema requires these labels even though a
                // sidecar has no values for them.
                labels.insert("container_name".to_string(), String::new());
                labels.insert("instance_id".to_string(), String::new());
                Self {
                    resource_type: "gke_container",
                    labels,
                }
            }
        };

        debug!(
            resource_type = resolved.resource_type,
            labels = resolved.labels.len(),
            "resource labels resolved"
        );
        Ok(resolved)
    }

    /// The monitored-resource type these labels describe.
    pub fn resource_type(&self) -> &str {
        self.resource_type
    }

    /// The label mapping, in stable iteration order.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// The project writes are billed against.
    pub fn project_id(&self) -> &str {
        self.labels
            .get("project_id")
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn or_blank(label: &str, result: GcpResult<String>) -> String {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(label, error = %e, "metadata lookup failed, labeling blank");
            String::new()
        }
    }
}

#[cfg(test)]
impl ResourceLabels {
    /// Hand-build labels for tests that don't need a metadata server.
    pub(crate) fn for_tests<const N: usize>(
        resource_type: &'static str,
        entries: [(&str, &str); N],
    ) -> Self {
        Self {
            resource_type,
            labels: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
