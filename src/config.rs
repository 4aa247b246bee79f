// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_CONTROL_PLANE_NAMESPACE: &str = "stevedore-system";
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 120;

/// Import configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Canonical repository every referenced image is relocated into
    pub default_repository: String,
    /// Service account (in `namespace`) the control plane builds with
    pub service_account: String,
    /// Namespace holding the lifecycle config and the service account
    pub namespace: String,
    /// Budget for each convergence wait
    pub wait_timeout: Duration,
}

impl ImportConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let default_repository = env::var("DEFAULT_REPOSITORY")
            .context("DEFAULT_REPOSITORY environment variable not set")?;
        let service_account =
            env::var("SERVICE_ACCOUNT").unwrap_or_else(|_| "default".to_string());
        let namespace = env::var("CONTROL_PLANE_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_CONTROL_PLANE_NAMESPACE.to_string());
        let wait_timeout_secs = env::var("IMPORT_WAIT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS);

        Ok(ImportConfig {
            default_repository,
            service_account,
            namespace,
            wait_timeout: Duration::from_secs(wait_timeout_secs),
        })
    }

    /// Construct a configuration programmatically, with defaults for the
    /// control-plane namespace and wait budget
    pub fn new(default_repository: impl Into<String>, service_account: impl Into<String>) -> Self {
        ImportConfig {
            default_repository: default_repository.into(),
            service_account: service_account.into(),
            namespace: DEFAULT_CONTROL_PLANE_NAMESPACE.to_string(),
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
        }
    }
}
