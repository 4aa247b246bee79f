// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Relocation adapter boundary.
//!
//! The real registry transport lives outside this crate; callers supply
//! implementations of [`ImageFetcher`] and [`ImageRelocator`] together with
//! the credentials to use. Relocation is digest-addressed: a relocated
//! reference is always `<repository>@<digest>`, so re-relocating identical
//! content to the same destination yields an identical ref.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

/// An image fetched from a registry. Digest computation belongs to the
/// fetching collaborator; this crate never parses image bytes itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteImage {
    /// The reference the image was fetched by
    pub reference: String,
    /// Content digest, `sha256:...` form
    pub digest: String,
    labels: BTreeMap<String, String>,
}

impl RemoteImage {
    pub fn new(reference: impl Into<String>, digest: impl Into<String>) -> Self {
        RemoteImage {
            reference: reference.into(),
            digest: digest.into(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Look up an OCI config label on the image
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(|v| v.as_str())
    }
}

/// Credentials per registry host, threaded explicitly from the entry point.
/// There is no process-global default keychain.
#[derive(Clone, Debug, Default)]
pub struct Keychain {
    credentials: BTreeMap<String, RegistryCredential>,
}

#[derive(Clone, Debug)]
pub struct RegistryCredential {
    pub username: String,
    pub password: String,
}

impl Keychain {
    pub fn with_credential(
        mut self,
        registry: impl Into<String>,
        credential: RegistryCredential,
    ) -> Self {
        self.credentials.insert(registry.into(), credential);
        self
    }

    /// Resolve the credential for an image reference by its registry host
    pub fn resolve(&self, reference: &str) -> Option<&RegistryCredential> {
        let registry = reference.split('/').next().unwrap_or(reference);
        self.credentials.get(registry)
    }
}

/// Fetch an image from a registry
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, keychain: &Keychain, reference: &str) -> Result<RemoteImage>;
}

/// Push a fetched image into a destination repository, content-addressed
#[async_trait]
pub trait ImageRelocator: Send + Sync {
    /// Returns the relocated reference, always `<destination_repository>@<digest>`
    async fn relocate(
        &self,
        keychain: &Keychain,
        image: &RemoteImage,
        destination_repository: &str,
    ) -> Result<String>;
}

/// The canonical relocated-reference form
pub fn relocated_ref(repository: &str, digest: &str) -> String {
    format!("{}@{}", repository, digest)
}

/// Relocator for preview runs: performs no network write and synthesizes the
/// ref the real relocator would have produced. Fetching still happens, so
/// diffs reflect real digests.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardRelocator;

#[async_trait]
impl ImageRelocator for DiscardRelocator {
    async fn relocate(
        &self,
        _keychain: &Keychain,
        image: &RemoteImage,
        destination_repository: &str,
    ) -> Result<String> {
        Ok(relocated_ref(destination_repository, &image.digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keychain_resolves_by_registry_host() {
        let keychain = Keychain::default().with_credential(
            "registry.example.com",
            RegistryCredential {
                username: "importer".to_string(),
                password: "hunter2".to_string(),
            },
        );

        assert!(keychain
            .resolve("registry.example.com/buildpack-a:1.0")
            .is_some());
        assert!(keychain.resolve("ghcr.io/buildpack-a:1.0").is_none());
    }

    #[test]
    fn test_relocated_ref_is_digest_addressed() {
        assert_eq!(
            relocated_ref("registry.example.com/deps", "sha256:abc"),
            "registry.example.com/deps@sha256:abc"
        );
    }

    #[tokio::test]
    async fn test_discard_relocator_synthesizes_the_would_be_ref() {
        let image = RemoteImage::new("registry.example.com/buildpack-a:1.0", "sha256:abc");
        let relocated = DiscardRelocator
            .relocate(&Keychain::default(), &image, "registry.example.com/deps")
            .await
            .unwrap();
        assert_eq!(relocated, "registry.example.com/deps@sha256:abc");
    }

    #[test]
    fn test_label_lookup() {
        let image = RemoteImage::new("ref", "sha256:abc")
            .with_label(crate::constants::STACK_ID_LABEL, "io.stacks.bionic");
        assert_eq!(
            image.label(crate::constants::STACK_ID_LABEL),
            Some("io.stacks.bionic")
        );
        assert_eq!(image.label("other"), None);
    }
}
