// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Import pipeline orchestration.
//!
//! One logical pipeline per invocation: parse and validate the descriptor,
//! relocate every referenced image into the canonical repository, then write
//! the cluster resources in dependency order (lifecycle, stores, stacks,
//! builders) and wait for the control plane to converge on each.

pub mod constructors;
pub mod differ;
pub mod upsert;
pub mod waiter;

pub use differ::ChangeSummary;
pub use waiter::{await_condition, WaitOutcome};

use futures::future;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::{info, instrument};

use crate::config::ImportConfig;
use crate::constants::lifecycle;
use crate::descriptor::{self, DependencyDescriptor, StackEntry};
use crate::error::{ImportError, Result};
use crate::registry::{DiscardRelocator, ImageFetcher, ImageRelocator, Keychain, RemoteImage};
use crate::types::{ClusterBuilder, ClusterStack, ClusterStackSpec, ClusterStore};

/// Injected clock so every object in one run is stamped identically
pub trait TimestampProvider: Send + Sync {
    fn timestamp(&self) -> String;
}

/// Wall-clock timestamp provider
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimestampProvider for SystemClock {
    fn timestamp(&self) -> String {
        chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// One created or updated resource, in write order. Carries the written
/// object as it came back from the cluster so renderers can print the
/// resulting specs without re-reading anything.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub kind: &'static str,
    pub name: String,
    pub object: serde_json::Value,
}

/// Ordered record of every object the run created or updated, suitable for
/// downstream rendering
#[derive(Debug, Default)]
pub struct ImportResult {
    objects: Vec<TrackedObject>,
}

impl ImportResult {
    fn track<K: Serialize>(&mut self, kind: &'static str, name: &str, written: &K) -> Result<()> {
        let object =
            serde_json::to_value(written).map_err(|source| ImportError::SpecSerialization {
                kind,
                name: name.to_string(),
                source,
            })?;
        self.objects.push(TrackedObject {
            kind,
            name: name.to_string(),
            object,
        });
        Ok(())
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }
}

/// Every descriptor entry with its post-relocation image references and, for
/// stacks, the constructed target spec. Produced once per run.
struct RelocatedDescriptor {
    lifecycle: Option<String>,
    stores: Vec<RelocatedStore>,
    stacks: Vec<RelocatedStack>,
}

struct RelocatedStore {
    name: String,
    sources: Vec<String>,
}

struct RelocatedStack {
    name: String,
    spec: ClusterStackSpec,
}

/// Drives one import (or preview) run against the control plane. All
/// collaborators are injected; this type never constructs network clients.
pub struct Importer<F, R, T = SystemClock> {
    client: Client,
    config: ImportConfig,
    fetcher: F,
    relocator: R,
    clock: T,
}

impl<F, R, T> Importer<F, R, T>
where
    F: ImageFetcher,
    R: ImageRelocator,
    T: TimestampProvider,
{
    pub fn new(client: Client, config: ImportConfig, fetcher: F, relocator: R, clock: T) -> Self {
        Self {
            client,
            config,
            fetcher,
            relocator,
            clock,
        }
    }

    /// Import the descriptor: relocate every referenced image, then create
    /// or update the cluster resources in dependency order, waiting for each
    /// store, stack, and builder to converge. Returns the ordered list of
    /// objects written.
    #[instrument(skip(self, keychain, raw))]
    pub async fn import(&self, keychain: &Keychain, raw: &str) -> Result<ImportResult> {
        let descriptor = descriptor::parse(raw)?;
        let stacks = descriptor.stacks_with_default()?;
        let builders = descriptor.builders_with_default()?;

        // Relocation completes in full before the first cluster write: one
        // unreachable image aborts the run with nothing applied.
        let staged = self.stage(keychain, &descriptor, &stacks).await?;

        let timestamp = self.clock.timestamp();
        let mut result = ImportResult::default();

        if let Some(image_ref) = &staged.lifecycle {
            let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.config.namespace);
            let target =
                constructors::lifecycle_config_map(&self.config.namespace, image_ref, &timestamp)?;
            let written = upsert::upsert(&api, target, upsert::merge_config_map).await?;
            info!("Imported lifecycle image {}", image_ref);
            result.track("ConfigMap", lifecycle::CONFIG_MAP_NAME, &written)?;
        }

        let store_api: Api<ClusterStore> = Api::all(self.client.clone());
        let mut store_generation: HashMap<String, i64> = HashMap::new();
        for store in &staged.stores {
            let target =
                constructors::cluster_store(&store.name, store.sources.clone(), &timestamp)?;
            let written = upsert::upsert(&store_api, target, upsert::merge_store).await?;
            let generation = written.metadata.generation.unwrap_or(0);
            self.await_converged(&store_api, "ClusterStore", &store.name, move |s: &ClusterStore| {
                s.is_observed_at(generation)
            })
            .await?;
            store_generation.insert(store.name.clone(), generation);
            result.track("ClusterStore", &store.name, &written)?;
        }

        let stack_api: Api<ClusterStack> = Api::all(self.client.clone());
        let mut stack_generation: HashMap<String, i64> = HashMap::new();
        for stack in &staged.stacks {
            let target = constructors::cluster_stack(&stack.name, stack.spec.clone(), &timestamp)?;
            let written = upsert::upsert(&stack_api, target, upsert::merge_stack).await?;
            let generation = written.metadata.generation.unwrap_or(0);
            self.await_converged(&stack_api, "ClusterStack", &stack.name, move |s: &ClusterStack| {
                s.is_observed_at(generation)
            })
            .await?;
            stack_generation.insert(stack.name.clone(), generation);
            result.track("ClusterStack", &stack.name, &written)?;
        }

        let builder_api: Api<ClusterBuilder> = Api::all(self.client.clone());
        for entry in &builders {
            let spec = constructors::builder_spec(
                &entry.name,
                &self.config.default_repository,
                &entry.cluster_stack,
                &entry.cluster_store,
                entry.order.clone(),
                &self.config.service_account,
                &self.config.namespace,
            );
            let target = constructors::cluster_builder(&entry.name, spec, &timestamp)?;
            let written = upsert::upsert(&builder_api, target, upsert::merge_builder).await?;

            // The builder's wait depends on generations captured from the
            // store and stack writes earlier in this run
            let expected_store_gen = store_generation
                .get(&entry.cluster_store)
                .copied()
                .unwrap_or(0);
            let expected_stack_gen = stack_generation
                .get(&entry.cluster_stack)
                .copied()
                .unwrap_or(0);
            self.await_converged(
                &builder_api,
                "ClusterBuilder",
                &entry.name,
                move |b: &ClusterBuilder| b.is_converged(expected_store_gen, expected_stack_gen),
            )
            .await?;
            result.track("ClusterBuilder", &entry.name, &written)?;
        }

        info!("Import converged: {} objects written", result.objects().len());
        Ok(result)
    }

    /// Compute the diff an import would produce, without mutating anything.
    /// Images are fetched (so the diff shows real digests) but relocation is
    /// discarded.
    #[instrument(skip(self, keychain, raw))]
    pub async fn summarize_changes(&self, keychain: &Keychain, raw: &str) -> Result<ChangeSummary> {
        let descriptor = descriptor::parse(raw)?;
        let stacks = descriptor.stacks_with_default()?;
        let builders = descriptor.builders_with_default()?;
        let repository = self.config.default_repository.as_str();
        let discard = DiscardRelocator;

        let mut summary = differ::SummaryBuilder::new();

        let mut lifecycle_block = differ::Block::new("Lifecycle");
        let lifecycle_api: Api<ConfigMap> =
            Api::namespaced(self.client.clone(), &self.config.namespace);
        let current_lifecycle = upsert::get_optional(&lifecycle_api, lifecycle::CONFIG_MAP_NAME)
            .await?
            .and_then(|cm| cm.data.and_then(|d| d.get(lifecycle::IMAGE_KEY).cloned()));
        let target_lifecycle = match &descriptor.lifecycle {
            Some(source) => {
                let image = self.fetcher.fetch(keychain, &source.image).await?;
                Some(discard.relocate(keychain, &image, repository).await?)
            }
            None => None,
        };
        lifecycle_block.push_entry(
            lifecycle::CONFIG_MAP_NAME,
            differ::lifecycle_changes(current_lifecycle.as_deref(), target_lifecycle.as_deref()),
        );
        summary.push_block(lifecycle_block);

        let mut store_block = differ::Block::new("ClusterStores");
        let store_api: Api<ClusterStore> = Api::all(self.client.clone());
        for store in &descriptor.cluster_stores {
            let current = upsert::get_optional(&store_api, &store.name).await?;
            // Digest lookups for one store fan out together; any failure
            // aborts the whole diff
            let fetches = store
                .sources
                .iter()
                .map(|source| self.fetcher.fetch(keychain, &source.image));
            let images = future::try_join_all(fetches).await?;
            let mut prospective = Vec::with_capacity(images.len());
            for image in &images {
                prospective.push(discard.relocate(keychain, image, repository).await?);
            }
            store_block.push_entry(
                &store.name,
                differ::store_changes(current.as_ref(), &prospective),
            );
        }
        summary.push_block(store_block);

        let mut stack_block = differ::Block::new("ClusterStacks");
        let stack_api: Api<ClusterStack> = Api::all(self.client.clone());
        for stack in &stacks {
            let build = self.fetcher.fetch(keychain, &stack.build_image.image).await?;
            let run = self.fetcher.fetch(keychain, &stack.run_image.image).await?;
            let id = constructors::stack_id(&stack.name, &build, &run)?;
            let build_ref = discard.relocate(keychain, &build, repository).await?;
            let run_ref = discard.relocate(keychain, &run, repository).await?;
            let target = constructors::stack_spec(id, build_ref, run_ref);
            let current = upsert::get_optional(&stack_api, &stack.name).await?;
            stack_block.push_entry(
                &stack.name,
                differ::stack_changes(current.as_ref().map(|s| &s.spec), &target),
            );
        }
        summary.push_block(stack_block);

        let mut builder_block = differ::Block::new("ClusterBuilders");
        let builder_api: Api<ClusterBuilder> = Api::all(self.client.clone());
        for entry in &builders {
            let target = constructors::builder_spec(
                &entry.name,
                repository,
                &entry.cluster_stack,
                &entry.cluster_store,
                entry.order.clone(),
                &self.config.service_account,
                &self.config.namespace,
            );
            let current = upsert::get_optional(&builder_api, &entry.name).await?;
            builder_block.push_entry(
                &entry.name,
                differ::builder_changes(current.as_ref().map(|b| &b.spec), &target),
            );
        }
        summary.push_block(builder_block);

        Ok(summary.finish())
    }

    /// Relocate every image the descriptor references. Each source is
    /// fetched and relocated at most once per run.
    async fn stage(
        &self,
        keychain: &Keychain,
        descriptor: &DependencyDescriptor,
        stacks: &[StackEntry],
    ) -> Result<RelocatedDescriptor> {
        let mut cache: HashMap<String, (RemoteImage, String)> = HashMap::new();

        let lifecycle = match &descriptor.lifecycle {
            Some(source) => Some(
                self.fetch_and_relocate(&mut cache, keychain, &source.image)
                    .await?
                    .1,
            ),
            None => None,
        };

        let mut stores = Vec::with_capacity(descriptor.cluster_stores.len());
        for store in &descriptor.cluster_stores {
            let mut sources = Vec::with_capacity(store.sources.len());
            for source in &store.sources {
                let (_, relocated) = self
                    .fetch_and_relocate(&mut cache, keychain, &source.image)
                    .await?;
                sources.push(relocated);
            }
            stores.push(RelocatedStore {
                name: store.name.clone(),
                sources,
            });
        }

        let mut relocated_stacks = Vec::with_capacity(stacks.len());
        for stack in stacks {
            let (build, build_ref) = self
                .fetch_and_relocate(&mut cache, keychain, &stack.build_image.image)
                .await?;
            let (run, run_ref) = self
                .fetch_and_relocate(&mut cache, keychain, &stack.run_image.image)
                .await?;
            let id = constructors::stack_id(&stack.name, &build, &run)?;
            relocated_stacks.push(RelocatedStack {
                name: stack.name.clone(),
                spec: constructors::stack_spec(id, build_ref, run_ref),
            });
        }

        Ok(RelocatedDescriptor {
            lifecycle,
            stores,
            stacks: relocated_stacks,
        })
    }

    async fn fetch_and_relocate(
        &self,
        cache: &mut HashMap<String, (RemoteImage, String)>,
        keychain: &Keychain,
        reference: &str,
    ) -> Result<(RemoteImage, String)> {
        if let Some(hit) = cache.get(reference) {
            return Ok(hit.clone());
        }

        let image = self.fetcher.fetch(keychain, reference).await?;
        let relocated = self
            .relocator
            .relocate(keychain, &image, &self.config.default_repository)
            .await?;
        cache.insert(reference.to_string(), (image.clone(), relocated.clone()));
        Ok((image, relocated))
    }

    async fn await_converged<K>(
        &self,
        api: &Api<K>,
        kind: &'static str,
        name: &str,
        condition: impl Fn(&K) -> bool,
    ) -> Result<()>
    where
        K: kube::Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    {
        match waiter::await_condition(api, kind, name, self.config.wait_timeout, condition).await? {
            WaitOutcome::Converged => Ok(()),
            WaitOutcome::TimedOut => Err(ImportError::WaitTimedOut {
                kind,
                name: name.to_string(),
            }),
        }
    }
}
