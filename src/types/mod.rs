// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-managed resource types driven by the import pipeline.

pub mod builder;
pub mod stack;
pub mod store;

pub use builder::{ClusterBuilder, ClusterBuilderSpec, ClusterBuilderStatus, ObjectRef, ServiceAccountRef};
pub use stack::{ClusterStack, ClusterStackSpec, ClusterStackStatus, StackImage};
pub use store::{ClusterStore, ClusterStoreSpec, ClusterStoreStatus, StoreImage};

/// Whether an observed generation satisfies the expected one.
///
/// Older control-plane versions never populate the observed-generation
/// status fields; they stay at 0, which is a compatibility signal and must
/// read as satisfied, never as "not yet reconciled".
pub fn generation_satisfied(observed: i64, expected: i64) -> bool {
    observed == 0 || observed >= expected
}
