// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent create-or-update per resource kind.
//!
//! Every kind follows the same shape: read by name, create on 404, otherwise
//! apply a kind-specific merge against the existing object and replace it.
//! Merges start from the existing object so the resource version survives.

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, PostParams};
use kube::ResourceExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{ClusterBuilder, ClusterStack, ClusterStore};

/// Read an object by name, mapping 404 to `None`
pub async fn get_optional<K>(api: &Api<K>, name: &str) -> Result<Option<K>>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.get(name).await {
        Ok(existing) => Ok(Some(existing)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create the target object, or merge it into the existing one and replace.
/// Returns the written object, including its post-write generation.
pub async fn upsert<K>(api: &Api<K>, target: K, merge: impl FnOnce(K, K) -> K) -> Result<K>
where
    K: kube::Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    let name = target.name_any();

    match api.get(&name).await {
        Ok(existing) => {
            debug!("{} already exists, updating", name);
            let merged = merge(existing, target);
            let written = api.replace(&name, &PostParams::default(), &merged).await?;
            info!("Updated {}", name);
            Ok(written)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("{} not found, creating", name);
            let written = api.create(&PostParams::default(), &target).await?;
            info!("Created {}", name);
            Ok(written)
        }
        Err(e) => Err(e.into()),
    }
}

/// Lifecycle merge: unconditional overwrite of the image data plus fresh
/// import annotations
pub fn merge_config_map(existing: ConfigMap, target: ConfigMap) -> ConfigMap {
    let mut merged = existing;
    merged.data = target.data;
    merged.metadata.annotations = merge_annotations(
        merged.metadata.annotations.take(),
        target.metadata.annotations,
    );
    merged
}

/// Store merge: non-destructive set union. Existing sources are kept
/// verbatim; new sources are appended in declaration order unless an entry
/// with the same image reference is already present. Relocated refs are
/// digest-addressed, so this is digest equality.
pub fn merge_store(existing: ClusterStore, target: ClusterStore) -> ClusterStore {
    let mut merged = existing;
    for source in target.spec.sources {
        if !merged.has_source(&source.image) {
            merged.spec.sources.push(source);
        }
    }
    merged.metadata.annotations = merge_annotations(
        merged.metadata.annotations.take(),
        target.metadata.annotations,
    );
    merged
}

/// Stack merge: a stack has exactly one build/run pair, so the spec is
/// replaced outright, annotations included
pub fn merge_stack(existing: ClusterStack, target: ClusterStack) -> ClusterStack {
    let mut merged = existing;
    merged.spec = target.spec;
    merged.metadata.annotations = target.metadata.annotations;
    merged
}

/// Builder merge: full spec overwrite, but annotations are a union with new
/// values winning, so externally-set annotations survive the import
pub fn merge_builder(existing: ClusterBuilder, target: ClusterBuilder) -> ClusterBuilder {
    let mut merged = existing;
    merged.spec = target.spec;
    merged.metadata.annotations = merge_annotations(
        merged.metadata.annotations.take(),
        target.metadata.annotations,
    );
    merged
}

/// Union of keys; new values win on conflict
pub fn merge_annotations(
    existing: Option<BTreeMap<String, String>>,
    new: Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    match (existing, new) {
        (Some(mut existing), Some(new)) => {
            existing.extend(new);
            Some(existing)
        }
        (existing, None) => existing,
        (None, new) => new,
    }
}
