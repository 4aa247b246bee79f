// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Legacy descriptor schema (`deps.stevedore.dev/v1alpha1`).
//!
//! Differs from the current schema only in field names: `stores` became
//! `clusterStores`, `defaultStack` became `defaultClusterStack`, and each
//! builder's `stack`/`store` became `clusterStack`/`clusterStore`. The
//! upgrade is lossless.

use serde::Deserialize;

use crate::descriptor::current::{
    BuilderEntry, DependencyDescriptor, SourceImage, StackEntry, StoreEntry,
};
use crate::descriptor::API_VERSION_V1ALPHA2;

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorV1Alpha1 {
    pub api_version: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub default_stack: Option<String>,
    #[serde(default)]
    pub default_cluster_builder: Option<String>,
    #[serde(default)]
    pub lifecycle: Option<SourceImage>,
    #[serde(default)]
    pub stores: Vec<StoreEntry>,
    #[serde(default)]
    pub cluster_stacks: Vec<StackEntry>,
    #[serde(default)]
    pub cluster_builders: Vec<BuilderEntryV1Alpha1>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BuilderEntryV1Alpha1 {
    pub name: String,
    pub stack: String,
    pub store: String,
    #[serde(default)]
    pub order: Vec<serde_json::Value>,
}

impl DescriptorV1Alpha1 {
    /// Mechanical upgrade to the current schema
    pub fn to_current(self) -> DependencyDescriptor {
        DependencyDescriptor {
            api_version: API_VERSION_V1ALPHA2.to_string(),
            kind: self.kind,
            default_cluster_stack: self.default_stack,
            default_cluster_builder: self.default_cluster_builder,
            lifecycle: self.lifecycle,
            cluster_stores: self.stores,
            cluster_stacks: self.cluster_stacks,
            cluster_builders: self
                .cluster_builders
                .into_iter()
                .map(|b| BuilderEntry {
                    name: b.name,
                    cluster_stack: b.stack,
                    cluster_store: b.store,
                    order: b.order,
                })
                .collect(),
        }
    }
}
