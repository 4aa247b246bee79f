// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Versioned dependency-descriptor model, parsing, and validation.

pub mod current;
pub mod legacy;

pub use current::{BuilderEntry, DependencyDescriptor, SourceImage, StackEntry, StoreEntry};

use serde::Deserialize;

use crate::error::{ImportError, Result};

/// Legacy descriptor schema version
pub const API_VERSION_V1ALPHA1: &str = "deps.stevedore.dev/v1alpha1";
/// Current descriptor schema version
pub const API_VERSION_V1ALPHA2: &str = "deps.stevedore.dev/v1alpha2";

/// Descriptor schema versions this engine can decode
pub const SUPPORTED_API_VERSIONS: [&str; 2] = [API_VERSION_V1ALPHA1, API_VERSION_V1ALPHA2];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    #[serde(default)]
    api_version: String,
}

/// Parse a raw descriptor document, upgrading legacy schemas to the current
/// one and validating the result. Pure: no network or cluster I/O happens
/// before this returns.
pub fn parse(raw: &str) -> Result<DependencyDescriptor> {
    let probe: VersionProbe = serde_yaml::from_str(raw)?;

    let descriptor = match probe.api_version.as_str() {
        API_VERSION_V1ALPHA1 => {
            serde_yaml::from_str::<legacy::DescriptorV1Alpha1>(raw)?.to_current()
        }
        API_VERSION_V1ALPHA2 => serde_yaml::from_str::<DependencyDescriptor>(raw)?,
        other => {
            return Err(ImportError::UnsupportedApiVersion {
                found: other.to_string(),
                supported: SUPPORTED_API_VERSIONS.to_vec(),
            })
        }
    };

    descriptor.validate()?;
    Ok(descriptor)
}
