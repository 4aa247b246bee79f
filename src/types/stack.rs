// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::types::generation_satisfied;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "core.stevedore.dev", version = "v1alpha2", kind = "ClusterStack")]
#[kube(status = "ClusterStackStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterStackSpec {
    /// OS-stack identifier shared by the build and run images
    pub id: String,
    pub build_image: StackImage,
    pub run_image: StackImage,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct StackImage {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStackStatus {
    #[serde(default)]
    pub observed_generation: i64,
}

impl ClusterStack {
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
}
