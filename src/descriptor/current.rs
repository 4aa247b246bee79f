// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Current descriptor schema (`deps.stevedore.dev/v1alpha2`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ImportError, Result};

/// Name given to the alias entries appended for the designated defaults
pub const DEFAULT_ALIAS: &str = "default";

/// Declarative bundle describing a build toolchain: a lifecycle image, named
/// buildpack stores, named OS-stack image pairs, and named builders
/// referencing them. Immutable after parse; validated once.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDescriptor {
    pub api_version: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub default_cluster_stack: Option<String>,
    #[serde(default)]
    pub default_cluster_builder: Option<String>,
    #[serde(default)]
    pub lifecycle: Option<SourceImage>,
    #[serde(default)]
    pub cluster_stores: Vec<StoreEntry>,
    #[serde(default)]
    pub cluster_stacks: Vec<StackEntry>,
    #[serde(default)]
    pub cluster_builders: Vec<BuilderEntry>,
}

/// A single not-yet-relocated image reference, tag or digest form
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pub image: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct StoreEntry {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SourceImage>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackEntry {
    pub name: String,
    pub build_image: SourceImage,
    pub run_image: SourceImage,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuilderEntry {
    pub name: String,
    pub cluster_stack: String,
    pub cluster_store: String,
    /// Buildpack detection order, opaque to the import pipeline
    #[serde(default)]
    pub order: Vec<serde_json::Value>,
}

impl DependencyDescriptor {
    /// Structural validation: per-kind name uniqueness, then reference
    /// resolution for the defaults and every builder's cross-references.
    /// Pure; rejects malformed input before any relocation begins.
    pub fn validate(&self) -> Result<()> {
        check_unique("ClusterStore", self.cluster_stores.iter().map(|s| &s.name))?;
        check_unique("ClusterStack", self.cluster_stacks.iter().map(|s| &s.name))?;
        check_unique(
            "ClusterBuilder",
            self.cluster_builders.iter().map(|b| &b.name),
        )?;

        if let Some(name) = &self.default_cluster_stack {
            if !self.cluster_stacks.iter().any(|s| &s.name == name) {
                return Err(ImportError::UnresolvedReference {
                    referrer: "defaultClusterStack".to_string(),
                    kind: "ClusterStack",
                    name: name.clone(),
                });
            }
        }

        if let Some(name) = &self.default_cluster_builder {
            if !self.cluster_builders.iter().any(|b| &b.name == name) {
                return Err(ImportError::UnresolvedReference {
                    referrer: "defaultClusterBuilder".to_string(),
                    kind: "ClusterBuilder",
                    name: name.clone(),
                });
            }
        }

        for builder in &self.cluster_builders {
            if !self
                .cluster_stacks
                .iter()
                .any(|s| s.name == builder.cluster_stack)
            {
                return Err(ImportError::UnresolvedReference {
                    referrer: format!("ClusterBuilder {}", builder.name),
                    kind: "ClusterStack",
                    name: builder.cluster_stack.clone(),
                });
            }
            if !self
                .cluster_stores
                .iter()
                .any(|s| s.name == builder.cluster_store)
            {
                return Err(ImportError::UnresolvedReference {
                    referrer: format!("ClusterBuilder {}", builder.name),
                    kind: "ClusterStore",
                    name: builder.cluster_store.clone(),
                });
            }
        }

        Ok(())
    }

    /// Declared stacks plus, when a default is designated, one alias entry
    /// named "default" copied from the designated stack. The "default" name
    /// is reserved for the alias: a user-declared entry with that name is
    /// rejected here when it would collide with the appended alias.
    /// Designating the "default" entry itself appends nothing.
    ///
    /// Call once per import run; the result is the authoritative entry list
    /// from then on. Re-invoking on the same instance is harmless (the
    /// descriptor itself is never mutated) but the alias must not be fed
    /// back in as input.
    pub fn stacks_with_default(&self) -> Result<Vec<StackEntry>> {
        let mut entries = self.cluster_stacks.clone();
        if let Some(default_name) = &self.default_cluster_stack {
            if default_name != DEFAULT_ALIAS {
                if entries.iter().any(|s| s.name == DEFAULT_ALIAS) {
                    return Err(ImportError::DuplicateName {
                        kind: "ClusterStack",
                        name: DEFAULT_ALIAS.to_string(),
                    });
                }
                if let Some(designated) =
                    self.cluster_stacks.iter().find(|s| &s.name == default_name)
                {
                    let mut alias = designated.clone();
                    alias.name = DEFAULT_ALIAS.to_string();
                    entries.push(alias);
                }
            }
        }
        Ok(entries)
    }

    /// Declared builders plus, when a default is designated, one alias entry
    /// named "default" copied from the designated builder. Collision rules
    /// match [`Self::stacks_with_default`].
    pub fn builders_with_default(&self) -> Result<Vec<BuilderEntry>> {
        let mut entries = self.cluster_builders.clone();
        if let Some(default_name) = &self.default_cluster_builder {
            if default_name != DEFAULT_ALIAS {
                if entries.iter().any(|b| b.name == DEFAULT_ALIAS) {
                    return Err(ImportError::DuplicateName {
                        kind: "ClusterBuilder",
                        name: DEFAULT_ALIAS.to_string(),
                    });
                }
                if let Some(designated) = self
                    .cluster_builders
                    .iter()
                    .find(|b| &b.name == default_name)
                {
                    let mut alias = designated.clone();
                    alias.name = DEFAULT_ALIAS.to_string();
                    entries.push(alias);
                }
            }
        }
        Ok(entries)
    }
}

/// First duplicate wins the error message
fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ImportError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
