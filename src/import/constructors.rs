// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pure constructors for the target-state objects, one per resource kind.
//! No I/O: relocated references and metadata come in, fully-formed objects
//! (including the last-applied and import-timestamp annotations) come out.

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{annotations, lifecycle, BUILDER_TAG_PREFIX, STACK_ID_LABEL};
use crate::error::{ImportError, Result};
use crate::registry::RemoteImage;
use crate::types::{
    ClusterBuilder, ClusterBuilderSpec, ClusterStack, ClusterStackSpec, ClusterStore,
    ClusterStoreSpec, ObjectRef, ServiceAccountRef, StackImage, StoreImage,
};

/// Registry tag a builder image is pushed to, namespaced per builder name
pub fn builder_tag(repository: &str, name: &str) -> String {
    format!("{}:{}-{}", repository, BUILDER_TAG_PREFIX, name)
}

/// The OS-stack id a stack's images declare. Both images must carry the
/// label and agree on its value.
pub fn stack_id(name: &str, build: &RemoteImage, run: &RemoteImage) -> Result<String> {
    let build_id = build
        .label(STACK_ID_LABEL)
        .ok_or_else(|| ImportError::MissingStackId {
            name: name.to_string(),
            image: build.reference.clone(),
        })?;
    let run_id = run
        .label(STACK_ID_LABEL)
        .ok_or_else(|| ImportError::MissingStackId {
            name: name.to_string(),
            image: run.reference.clone(),
        })?;

    if build_id != run_id {
        return Err(ImportError::StackIdMismatch {
            name: name.to_string(),
            build_id: build_id.to_string(),
            run_id: run_id.to_string(),
        });
    }

    Ok(build_id.to_string())
}

/// Lifecycle image configuration: a ConfigMap in the control-plane namespace
/// holding the relocated lifecycle image reference
pub fn lifecycle_config_map(
    namespace: &str,
    relocated_image: &str,
    timestamp: &str,
) -> Result<ConfigMap> {
    let mut data = BTreeMap::new();
    data.insert(lifecycle::IMAGE_KEY.to_string(), relocated_image.to_string());

    let annotations =
        import_annotations("ConfigMap", lifecycle::CONFIG_MAP_NAME, &data, timestamp)?;

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(lifecycle::CONFIG_MAP_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(annotations),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    })
}

pub fn cluster_store(
    name: &str,
    relocated_sources: Vec<String>,
    timestamp: &str,
) -> Result<ClusterStore> {
    let spec = ClusterStoreSpec {
        sources: relocated_sources
            .into_iter()
            .map(|image| StoreImage { image })
            .collect(),
    };
    let annotations = import_annotations("ClusterStore", name, &spec, timestamp)?;

    Ok(ClusterStore {
        metadata: named_metadata(name, annotations),
        spec,
        status: None,
    })
}

pub fn stack_spec(id: String, relocated_build: String, relocated_run: String) -> ClusterStackSpec {
    ClusterStackSpec {
        id,
        build_image: StackImage {
            image: relocated_build,
        },
        run_image: StackImage {
            image: relocated_run,
        },
    }
}

pub fn cluster_stack(name: &str, spec: ClusterStackSpec, timestamp: &str) -> Result<ClusterStack> {
    let annotations = import_annotations("ClusterStack", name, &spec, timestamp)?;

    Ok(ClusterStack {
        metadata: named_metadata(name, annotations),
        spec,
        status: None,
    })
}

pub fn builder_spec(
    name: &str,
    repository: &str,
    stack: &str,
    store: &str,
    order: Vec<serde_json::Value>,
    service_account: &str,
    service_account_namespace: &str,
) -> ClusterBuilderSpec {
    ClusterBuilderSpec {
        tag: builder_tag(repository, name),
        stack: ObjectRef {
            name: stack.to_string(),
        },
        store: ObjectRef {
            name: store.to_string(),
        },
        order,
        service_account_ref: ServiceAccountRef {
            name: service_account.to_string(),
            namespace: service_account_namespace.to_string(),
        },
    }
}

pub fn cluster_builder(
    name: &str,
    spec: ClusterBuilderSpec,
    timestamp: &str,
) -> Result<ClusterBuilder> {
    let annotations = import_annotations("ClusterBuilder", name, &spec, timestamp)?;

    Ok(ClusterBuilder {
        metadata: named_metadata(name, annotations),
        spec,
        status: None,
    })
}

fn named_metadata(name: &str, annotations: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        annotations: Some(annotations),
        ..Default::default()
    }
}

fn import_annotations<S: Serialize>(
    kind: &'static str,
    name: &str,
    spec: &S,
    timestamp: &str,
) -> Result<BTreeMap<String, String>> {
    let last_applied =
        serde_json::to_string(spec).map_err(|source| ImportError::SpecSerialization {
            kind,
            name: name.to_string(),
            source,
        })?;

    let mut result = BTreeMap::new();
    result.insert(annotations::LAST_APPLIED.to_string(), last_applied);
    result.insert(
        annotations::IMPORT_TIMESTAMP.to_string(),
        timestamp.to_string(),
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-08-23T10:00:00Z";

    fn stack_image(id: Option<&str>) -> RemoteImage {
        let image = RemoteImage::new("registry.example.com/build:full", "sha256:aaa");
        match id {
            Some(id) => image.with_label(STACK_ID_LABEL, id),
            None => image,
        }
    }

    #[test]
    fn test_builder_tag_namespaces_by_name() {
        assert_eq!(
            builder_tag("registry.example.com/deps", "base"),
            "registry.example.com/deps:clusterbuilder-base"
        );
        assert_ne!(
            builder_tag("registry.example.com/deps", "a"),
            builder_tag("registry.example.com/deps", "b")
        );
    }

    #[test]
    fn test_stack_id_requires_matching_labels() {
        let build = stack_image(Some("io.stacks.bionic"));
        let run = stack_image(Some("io.stacks.bionic"));
        assert_eq!(stack_id("base", &build, &run).unwrap(), "io.stacks.bionic");
    }

    #[test]
    fn test_stack_id_mismatch_is_rejected() {
        let build = stack_image(Some("io.stacks.bionic"));
        let run = stack_image(Some("io.stacks.jammy"));
        assert!(matches!(
            stack_id("base", &build, &run),
            Err(ImportError::StackIdMismatch { .. })
        ));
    }

    #[test]
    fn test_stack_id_missing_label_is_rejected() {
        let build = stack_image(None);
        let run = stack_image(Some("io.stacks.bionic"));
        assert!(matches!(
            stack_id("base", &build, &run),
            Err(ImportError::MissingStackId { .. })
        ));
    }

    #[test]
    fn test_cluster_store_carries_import_annotations() {
        let store = cluster_store(
            "default-store",
            vec!["repo@sha256:aaa".to_string()],
            TS,
        )
        .unwrap();

        let meta = store.metadata.annotations.unwrap();
        assert_eq!(
            meta.get(annotations::IMPORT_TIMESTAMP).map(String::as_str),
            Some(TS)
        );
        let last_applied = meta.get(annotations::LAST_APPLIED).unwrap();
        let parsed: ClusterStoreSpec = serde_json::from_str(last_applied).unwrap();
        assert_eq!(parsed, store.spec);
    }

    #[test]
    fn test_lifecycle_config_map_shape() {
        let cm = lifecycle_config_map("stevedore-system", "repo@sha256:fff", TS).unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("lifecycle-image"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("stevedore-system"));
        assert_eq!(
            cm.data.unwrap().get("image").map(String::as_str),
            Some("repo@sha256:fff")
        );
    }

    #[test]
    fn test_builder_spec_references_by_name() {
        let spec = builder_spec(
            "base",
            "registry.example.com/deps",
            "base-stack",
            "default-store",
            vec![serde_json::json!({"group": [{"id": "example/a"}]})],
            "build-sa",
            "stevedore-system",
        );
        assert_eq!(spec.tag, "registry.example.com/deps:clusterbuilder-base");
        assert_eq!(spec.stack.name, "base-stack");
        assert_eq!(spec.store.name, "default-store");
        assert_eq!(spec.service_account_ref.name, "build-sa");
    }
}
