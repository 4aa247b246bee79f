// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::types::generation_satisfied;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "core.stevedore.dev", version = "v1alpha2", kind = "ClusterBuilder")]
#[kube(status = "ClusterBuilderStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterBuilderSpec {
    /// Registry tag the control plane pushes the built builder image to
    pub tag: String,
    pub stack: ObjectRef,
    pub store: ObjectRef,
    /// Buildpack detection order, opaque to the import pipeline
    #[serde(default)]
    pub order: Vec<serde_json::Value>,
    pub service_account_ref: ServiceAccountRef,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct ObjectRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct ServiceAccountRef {
    pub name: String,
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBuilderStatus {
    #[serde(default)]
    pub observed_generation: i64,
    /// Generation of the referenced store the controller last processed
    #[serde(default)]
    pub observed_store_generation: i64,
    /// Generation of the referenced stack the controller last processed
    #[serde(default)]
    pub observed_stack_generation: i64,
}

impl ClusterBuilder {
    /// Whether the builder's status reflects at least the given store and
    /// stack generations. Zero observed generations read as satisfied; older
    /// control-plane versions never populate them.
    pub fn is_converged(&self, expected_store_gen: i64, expected_stack_gen: i64) -> bool {
        let (store, stack) = self
            .status
            .as_ref()
            .map(|s| (s.observed_store_generation, s.observed_stack_generation))
            .unwrap_or((0, 0));

        generation_satisfied(store, expected_store_gen)
            && generation_satisfied(stack, expected_stack_gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_builder(status: Option<ClusterBuilderStatus>) -> ClusterBuilder {
        ClusterBuilder {
            metadata: ObjectMeta {
                name: Some("test-builder".to_string()),
                ..Default::default()
            },
            spec: ClusterBuilderSpec {
                tag: "repo:clusterbuilder-test-builder".to_string(),
                stack: ObjectRef {
                    name: "base".to_string(),
                },
                store: ObjectRef {
                    name: "default-store".to_string(),
                },
                order: vec![],
                service_account_ref: ServiceAccountRef {
                    name: "default".to_string(),
                    namespace: "stevedore-system".to_string(),
                },
            },
            status,
        }
    }

    fn status(store: i64, stack: i64) -> ClusterBuilderStatus {
        ClusterBuilderStatus {
            observed_generation: 0,
            observed_store_generation: store,
            observed_stack_generation: stack,
        }
    }

    #[test]
    fn test_unpopulated_generations_converge_immediately() {
        let builder = make_builder(Some(status(0, 0)));
        assert!(builder.is_converged(5, 3));
    }

    #[test]
    fn test_missing_status_converges_immediately() {
        let builder = make_builder(None);
        assert!(builder.is_converged(5, 3));
    }

    #[test]
    fn test_exact_generations_converge() {
        let builder = make_builder(Some(status(5, 3)));
        assert!(builder.is_converged(5, 3));
    }

    #[test]
    fn test_newer_generations_converge() {
        let builder = make_builder(Some(status(6, 4)));
        assert!(builder.is_converged(5, 3));
    }

    #[test]
    fn test_stale_store_generation_does_not_converge() {
        let builder = make_builder(Some(status(4, 3)));
        assert!(!builder.is_converged(5, 3));
    }

    #[test]
    fn test_stale_stack_generation_does_not_converge() {
        let builder = make_builder(Some(status(5, 2)));
        assert!(!builder.is_converged(5, 3));
    }
}
