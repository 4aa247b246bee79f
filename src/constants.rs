// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Annotation keys stamped onto every imported resource
pub mod annotations {
    /// Serialized copy of the object's own spec, written at import time so the
    /// cluster layer can compute three-way merges later
    pub const LAST_APPLIED: &str = "stevedore.dev/last-applied-spec";
    /// RFC 3339 timestamp shared by every object touched in one import run
    pub const IMPORT_TIMESTAMP: &str = "stevedore.dev/import-timestamp";
}

/// API group of the cluster-managed resource kinds
pub const API_GROUP: &str = "core.stevedore.dev";
/// API version of the cluster-managed resource kinds
pub const API_VERSION: &str = "v1alpha2";

/// Lifecycle image configuration
pub mod lifecycle {
    /// Name of the ConfigMap holding the relocated lifecycle image reference
    pub const CONFIG_MAP_NAME: &str = "lifecycle-image";
    /// Data key under which the image reference is stored
    pub const IMAGE_KEY: &str = "image";
}

/// Registry tag prefix for builder images, namespaced per builder name so
/// builders never collide on a tag
pub const BUILDER_TAG_PREFIX: &str = "clusterbuilder";

/// OCI image label carrying the OS-stack identifier
pub const STACK_ID_LABEL: &str = "io.buildpacks.stack.id";
