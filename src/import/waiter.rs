// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Convergence waiter: await a condition over a change-notification stream
//! for a single named object, with a caller-supplied time budget.

use futures::StreamExt;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::watcher::{watcher, Config as WatcherConfig};
use kube_runtime::WatchStreamExt;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ImportError, Result};

/// Typed outcome of a convergence wait. Errors (transport failures,
/// closed streams) surface through the surrounding `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Converged,
    TimedOut,
}

/// Wait until `condition` holds for the named object.
///
/// The condition is evaluated eagerly against the already-known state first,
/// covering the case where it is already true before any new event arrives.
/// After that, a watch filtered to the single named object re-evaluates the
/// condition on every change event. A transport-level error event is a hard
/// failure, never a silent continue. On expiry of the budget the object is
/// left in whatever state the cluster write put it in.
pub async fn await_condition<K>(
    api: &Api<K>,
    kind: &'static str,
    name: &str,
    budget: Duration,
    condition: impl Fn(&K) -> bool,
) -> Result<WaitOutcome>
where
    K: kube::Resource + Clone + DeserializeOwned + Debug + Send + 'static,
{
    match api.get(name).await {
        Ok(current) if condition(&current) => {
            debug!("{} {} already converged", kind, name);
            return Ok(WaitOutcome::Converged);
        }
        Ok(_) => {}
        // The object may appear after the eager check; the watch covers it
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => return Err(e.into()),
    }

    let config = WatcherConfig::default().fields(&format!("metadata.name={}", name));
    let events = watcher(api.clone(), config).applied_objects();
    futures::pin_mut!(events);

    let wait = async {
        loop {
            match events.next().await {
                Some(Ok(object)) => {
                    debug!("Observed {} {} at {:?}", kind, name, object.resource_version());
                    if condition(&object) {
                        return Ok(WaitOutcome::Converged);
                    }
                }
                Some(Err(source)) => {
                    return Err(ImportError::WatchFailed {
                        kind,
                        name: name.to_string(),
                        source,
                    })
                }
                None => {
                    return Err(ImportError::WatchClosed {
                        kind,
                        name: name.to_string(),
                    })
                }
            }
        }
    };

    match timeout(budget, wait).await {
        Ok(result) => result,
        Err(_) => Ok(WaitOutcome::TimedOut),
    }
}
