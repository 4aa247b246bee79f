// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod import;
pub mod registry;
pub mod types;

#[cfg(test)]
pub mod test_utils;
