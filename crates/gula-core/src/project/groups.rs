//! Arena index over the project's group tree
//!
//! Groups are addressed by [`GroupId`]. Each node keeps a name-keyed map of
//! its child groups and the set of file names it references, which makes
//! lookup-or-create and "already referenced" checks constant-effort and
//! independent of the order in which paths are visited.

use super::plist::Dictionary;
use crate::error::{IntegrationError, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Index of a group node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

#[derive(Debug, Clone)]
pub struct GroupNode {
    /// Identifier of the backing `PBXGroup` object
    pub object_id: String,
    /// Display name (explicit `name`, else `path`)
    pub name: String,
    pub parent: Option<GroupId>,
    children: BTreeMap<String, GroupId>,
    files: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct GroupArena {
    nodes: Vec<GroupNode>,
}

/// Name shown by Xcode for a group or file object
pub(crate) fn display_name(object: &Dictionary) -> Option<&str> {
    object
        .get_str("name")
        .or_else(|| object.get_str("path").map(|p| p.rsplit('/').next().unwrap_or(p)))
}

impl GroupArena {
    /// Index every `PBXGroup` reachable from the main group
    pub fn build(objects: &Dictionary, main_group_id: &str) -> Result<Self> {
        let main = objects
            .get(main_group_id)
            .and_then(|v| v.as_dictionary())
            .ok_or_else(|| {
                IntegrationError::structure(format!("main group {} not found", main_group_id))
            })?;

        let mut arena = GroupArena {
            nodes: vec![GroupNode {
                object_id: main_group_id.to_string(),
                name: display_name(main).unwrap_or("").to_string(),
                parent: None,
                children: BTreeMap::new(),
                files: BTreeSet::new(),
            }],
        };

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(main_group_id.to_string());
        let mut pending = vec![arena.root()];

        while let Some(group) = pending.pop() {
            let object_id = arena.node(group).object_id.clone();
            let Some(object) = objects.get(&object_id).and_then(|v| v.as_dictionary()) else {
                continue;
            };
            let children = object
                .get("children")
                .and_then(|v| v.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();

            for child_id in children.iter().filter_map(|v| v.as_str()) {
                let Some(child) = objects.get(child_id).and_then(|v| v.as_dictionary()) else {
                    debug!("Dangling child reference {} in group {}", child_id, object_id);
                    continue;
                };
                let Some(name) = display_name(child) else {
                    continue;
                };

                match child.get_str("isa") {
                    Some("PBXGroup") => {
                        if !visited.insert(child_id.to_string()) {
                            continue;
                        }
                        // Xcode tolerates duplicate names; the first one wins
                        if arena.child(group, name).is_none() {
                            let id = arena.insert(group, name, child_id);
                            pending.push(id);
                        }
                    }
                    Some("PBXFileReference") => {
                        if let Some(path) = child.get_str("path") {
                            arena.add_file(group, path);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(arena)
    }

    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &GroupNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (GroupId(i), node))
    }

    pub fn node(&self, id: GroupId) -> &GroupNode {
        &self.nodes[id.0]
    }

    pub fn child(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.nodes[parent.0].children.get(name).copied()
    }

    /// Child group names of `parent`, sorted
    pub fn child_names(&self, parent: GroupId) -> impl Iterator<Item = &str> {
        self.nodes[parent.0].children.keys().map(String::as_str)
    }

    pub fn insert(&mut self, parent: GroupId, name: &str, object_id: &str) -> GroupId {
        let id = GroupId(self.nodes.len());
        self.nodes.push(GroupNode {
            object_id: object_id.to_string(),
            name: name.to_string(),
            parent: Some(parent),
            children: BTreeMap::new(),
            files: BTreeSet::new(),
        });
        self.nodes[parent.0].children.insert(name.to_string(), id);
        id
    }

    pub fn has_file(&self, group: GroupId, file_name: &str) -> bool {
        self.nodes[group.0].files.contains(file_name)
    }

    pub fn add_file(&mut self, group: GroupId, file_name: &str) {
        self.nodes[group.0].files.insert(file_name.to_string());
    }

    pub fn files(&self, group: GroupId) -> impl Iterator<Item = &str> {
        self.nodes[group.0].files.iter().map(String::as_str)
    }

    /// Slash-separated path of group names below the main group
    pub fn path(&self, id: GroupId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(group) = current {
            let node = self.node(group);
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }
}
