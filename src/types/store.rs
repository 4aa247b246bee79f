// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::types::generation_satisfied;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "core.stevedore.dev", version = "v1alpha2", kind = "ClusterStore")]
#[kube(status = "ClusterStoreStatus")]
pub struct ClusterStoreSpec {
    #[serde(default)]
    pub sources: Vec<StoreImage>,
}

/// A buildpack package image aggregated by a store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub struct StoreImage {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStoreStatus {
    #[serde(default)]
    pub observed_generation: i64,
}

impl ClusterStore {
    /// Generation the controller has most recently processed, 0 when the
    /// control-plane version does not report it
    pub fn observed_generation(&self) -> i64 {
        self.status
            .as_ref()
            .map(|s| s.observed_generation)
            .unwrap_or(0)
    }

    /// Whether the controller has observed at least the expected generation
    pub fn is_observed_at(&self, expected: i64) -> bool {
        generation_satisfied(self.observed_generation(), expected)
    }

    /// Whether the store already aggregates the given image reference
    pub fn has_source(&self, image: &str) -> bool {
        self.spec.sources.iter().any(|s| s.image == image)
    }
}
