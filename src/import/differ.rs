// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change summarizer: computes the prospective target state field-by-field
//! against the current cluster state and renders one textual block per
//! resource kind. Nothing here mutates the cluster.

use std::fmt::Write;

use crate::types::{ClusterBuilderSpec, ClusterStackSpec, ClusterStore};

pub const NO_CHANGES: &str = "No Changes";

/// A single changed field: the old value (absent for brand-new objects or
/// additive changes) and the value an import would write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Option<String>,
    pub new: String,
}

impl FieldChange {
    fn added(field: &'static str, new: impl Into<String>) -> Self {
        FieldChange {
            field,
            old: None,
            new: new.into(),
        }
    }

    fn replaced(
        field: &'static str,
        old: Option<impl Into<String>>,
        new: impl Into<String>,
    ) -> Option<Self> {
        let old = old.map(Into::into);
        let new = new.into();
        if old.as_deref() == Some(new.as_str()) {
            return None;
        }
        Some(FieldChange { field, old, new })
    }
}

/// The rendered report plus the aggregate flag the caller uses to decide
/// whether to prompt before applying
#[derive(Debug, Clone)]
pub struct ChangeSummary {
    text: String,
    has_changes: bool,
}

impl ChangeSummary {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }
}

struct Entry {
    name: String,
    changes: Vec<FieldChange>,
}

/// Changes for one resource kind, assembled entry by entry and then handed
/// to the [`SummaryBuilder`] whole
pub struct Block {
    heading: &'static str,
    entries: Vec<Entry>,
}

impl Block {
    pub fn new(heading: &'static str) -> Self {
        Block {
            heading,
            entries: Vec::new(),
        }
    }

    /// Record an entry; entries without changes are dropped so unchanged
    /// objects are not echoed in the report
    pub fn push_entry(&mut self, name: &str, changes: Vec<FieldChange>) {
        if changes.is_empty() {
            return;
        }
        self.entries.push(Entry {
            name: name.to_string(),
            changes,
        });
    }
}

/// Accumulates per-kind blocks in pipeline order and renders the report
#[derive(Default)]
pub struct SummaryBuilder {
    blocks: Vec<Block>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        SummaryBuilder::default()
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn finish(self) -> ChangeSummary {
        let mut text = String::new();
        let mut has_changes = false;

        for block in &self.blocks {
            let _ = writeln!(text, "{}\n", block.heading);
            if block.entries.is_empty() {
                let _ = writeln!(text, "{}\n", NO_CHANGES);
                continue;
            }
            has_changes = true;
            for entry in &block.entries {
                let _ = writeln!(text, "{}:", entry.name);
                for change in &entry.changes {
                    if let Some(old) = &change.old {
                        let _ = writeln!(text, "-  {}: {}", change.field, old);
                    }
                    let _ = writeln!(text, "+  {}: {}", change.field, change.new);
                }
                text.push('\n');
            }
        }

        ChangeSummary { text, has_changes }
    }
}

/// Lifecycle diff: a single image field
pub fn lifecycle_changes(current: Option<&str>, target: Option<&str>) -> Vec<FieldChange> {
    let Some(target) = target else {
        return Vec::new();
    };
    FieldChange::replaced("image", current, target)
        .into_iter()
        .collect()
}

/// Store diff: only sources genuinely new to the cluster object, compared by
/// relocated-ref equality. Unchanged sources are not echoed.
pub fn store_changes(current: Option<&ClusterStore>, prospective: &[String]) -> Vec<FieldChange> {
    prospective
        .iter()
        .filter(|source| match current {
            Some(store) => !store.has_source(source),
            None => true,
        })
        .map(|source| FieldChange::added("source", source.clone()))
        .collect()
}

/// Stack diff: id plus the build/run image pair
pub fn stack_changes(
    current: Option<&ClusterStackSpec>,
    target: &ClusterStackSpec,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    changes.extend(FieldChange::replaced(
        "id",
        current.map(|c| c.id.clone()),
        target.id.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "buildImage",
        current.map(|c| c.build_image.image.clone()),
        target.build_image.image.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "runImage",
        current.map(|c| c.run_image.image.clone()),
        target.run_image.image.clone(),
    ));
    changes
}

/// Builder diff: tag, references, service account, and the opaque order
pub fn builder_changes(
    current: Option<&ClusterBuilderSpec>,
    target: &ClusterBuilderSpec,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    changes.extend(FieldChange::replaced(
        "tag",
        current.map(|c| c.tag.clone()),
        target.tag.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "stack",
        current.map(|c| c.stack.name.clone()),
        target.stack.name.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "store",
        current.map(|c| c.store.name.clone()),
        target.store.name.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "serviceAccount",
        current.map(|c| c.service_account_ref.name.clone()),
        target.service_account_ref.name.clone(),
    ));
    changes.extend(FieldChange::replaced(
        "order",
        current.map(|c| order_text(&c.order)),
        order_text(&target.order),
    ));
    changes
}

fn order_text(order: &[serde_json::Value]) -> String {
    serde_json::to_string(order).unwrap_or_else(|_| "[]".to_string())
}
