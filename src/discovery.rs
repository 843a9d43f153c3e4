// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Node auto-discovery
//!
//! At session start the logger looks for a well-known folder under `Objects`
//! and maps its children onto a fixed number of tags. The result is a
//! [`TagSchema`]: it names the CSV columns and drives every read of the
//! session. It is never refreshed within a session.

use log::info;

use crate::client::{NodeId, OpcSession};
use crate::error::LoggerError;

/// First two CSV columns, before the tag columns.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["Timestamp", "Timestamp_UTC_Epoch"];

/// A server node bound to a tag slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedNode {
    pub node: NodeId,
    pub name: String,
}

/// Ordered tag set of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSchema {
    tags: Vec<TaggedNode>,
}

impl TagSchema {
    pub fn new(tags: Vec<TaggedNode>) -> Self {
        Self { tags }
    }

    pub fn tags(&self) -> &[TaggedNode] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// CSV header row: timestamp columns then `Tag<n>_<name>` with n from 1.
    pub fn header(&self) -> Vec<String> {
        TIMESTAMP_COLUMNS
            .iter()
            .map(|column| column.to_string())
            .chain(
                self.tags
                    .iter()
                    .enumerate()
                    .map(|(index, tag)| format!("Tag{}_{}", index + 1, tag.name)),
            )
            .collect()
    }
}

/// Repeat `base` in order until exactly `count` entries are collected.
///
/// A base longer than `count` is truncated. An empty base yields nothing.
pub fn cycle_to_count(base: &[TaggedNode], count: usize) -> Vec<TaggedNode> {
    base.iter().cycle().take(count).cloned().collect()
}

/// Discover `tag_count` tags from the children of the `folder` object.
///
/// Fails with [`LoggerError::FolderNotFound`] when no child of `Objects` has
/// the display name `folder`, and with [`LoggerError::EmptyFolder`] when that
/// folder has no children. Any client failure is a session error.
pub async fn discover_nodes(
    session: &mut dyn OpcSession,
    folder: &str,
    tag_count: usize,
) -> Result<TagSchema, LoggerError> {
    let objects = session.objects_folder();
    let folder_node = find_child_by_name(session, &objects, folder)
        .await?
        .ok_or_else(|| LoggerError::FolderNotFound(folder.to_string()))?;

    let children = session.browse_children(&folder_node).await?;
    if children.is_empty() {
        return Err(LoggerError::EmptyFolder(folder.to_string()));
    }

    let mut base = Vec::with_capacity(children.len());
    for node in children {
        let name = session.display_name(&node).await?;
        base.push(TaggedNode { node, name });
    }

    let schema = TagSchema::new(cycle_to_count(&base, tag_count));

    info!("Auto-discovered {} nodes:", schema.len());
    for (index, tag) in schema.tags().iter().enumerate() {
        info!("  Tag{}: {} -> {}", index + 1, tag.name, tag.node);
    }

    Ok(schema)
}

async fn find_child_by_name(
    session: &mut dyn OpcSession,
    parent: &NodeId,
    name: &str,
) -> Result<Option<NodeId>, LoggerError> {
    for child in session.browse_children(parent).await? {
        if session.display_name(&child).await? == name {
            return Ok(Some(child));
        }
    }
    Ok(None)
}
