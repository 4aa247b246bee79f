// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to parse dependency descriptor: {0}")]
    Descriptor(#[from] serde_yaml::Error),

    #[error("Unsupported descriptor apiVersion {found:?}: must be one of {supported:?}")]
    UnsupportedApiVersion {
        found: String,
        supported: Vec<&'static str>,
    },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{referrer} references unknown {kind}: {name}")]
    UnresolvedReference {
        referrer: String,
        kind: &'static str,
        name: String,
    },

    #[error("Registry error for image {image}: {reason}")]
    Registry { image: String, reason: String },

    #[error("Stack {name}: image {image} carries no stack id label")]
    MissingStackId { name: String, image: String },

    #[error("Stack {name}: build image reports stack id {build_id:?} but run image reports {run_id:?}")]
    StackIdMismatch {
        name: String,
        build_id: String,
        run_id: String,
    },

    #[error("Failed to serialize {kind} spec for {name}: {source}")]
    SpecSerialization {
        kind: &'static str,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Timed out waiting for {kind} {name} to converge")]
    WaitTimedOut { kind: &'static str, name: String },

    #[error("Watch stream failed for {kind} {name}: {source}")]
    WatchFailed {
        kind: &'static str,
        name: String,
        #[source]
        source: kube_runtime::watcher::Error,
    },

    #[error("Watch stream closed before {kind} {name} converged")]
    WatchClosed { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;
