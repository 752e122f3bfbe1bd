//! Path resolution and tree merging for plugin layouts.
//!
//! A plugin places its menus into the host by name only: each top-level
//! child of the plugin `MenuBar` is looked up in the host `MenuBar`, and if
//! found, the plugin content is nested under the same chain of menus the
//! host uses. Unmatched groups become new top-level menus.

use std::collections::{HashMap, HashSet};

use crate::layout::{
    LayoutNode, TAG_ACTION, TAG_ACTION_PROPERTIES, TAG_MENU, TAG_MENU_BAR, TAG_TEXT, TAG_TOOL_BAR,
};

/// Ancestor chain from the host root down to a matching node (inclusive).
pub type PathEntry = Vec<LayoutNode>;

/// Resolve, for every named target, the path to its first pre-order
/// occurrence in the host menu bar.
///
/// Only `Menu` elements are descended into. Path entries are header clones
/// (tag, attributes, text and `text` labels) and do not alias the host tree.
pub fn resolve_paths(host_menu_bar: &LayoutNode, targets: &[LayoutNode]) -> HashMap<String, PathEntry> {
    let wanted: HashSet<&str> = targets.iter().filter_map(LayoutNode::name).collect();
    let mut paths = HashMap::new();
    if wanted.is_empty() {
        return paths;
    }

    let mut stack = Vec::new();
    collect_paths(host_menu_bar, &wanted, &mut stack, &mut paths);
    paths
}

fn collect_paths(
    node: &LayoutNode,
    wanted: &HashSet<&str>,
    stack: &mut Vec<LayoutNode>,
    paths: &mut HashMap<String, PathEntry>,
) {
    stack.push(node.header_clone());

    if let Some(name) = node.name() {
        if wanted.contains(name) && !paths.contains_key(name) {
            paths.insert(name.to_string(), stack.clone());
        }
    }

    for child in node.children_tagged(TAG_MENU) {
        collect_paths(child, wanted, stack, paths);
    }

    stack.pop();
}

/// Merge the plugin menu bar into a fresh menu bar shaped after the host.
///
/// Each top-level plugin child is nested under the interior nodes of its
/// path (host root and matched node excluded), reusing already-created
/// containers with the same tag and name. Children without a usable path
/// are appended at the top level.
pub fn merge(plugin_menu_bar: &LayoutNode, paths: &HashMap<String, PathEntry>) -> LayoutNode {
    let mut merged = plugin_menu_bar.bare_clone();

    for child in &plugin_menu_bar.children {
        let interior = child
            .name()
            .and_then(|name| paths.get(name))
            .filter(|path| path.len() > 2)
            .map(|path| &path[1..path.len() - 1]);

        let Some(steps) = interior else {
            merged.children.push(child.clone());
            continue;
        };

        let mut current = &mut merged;
        for step in steps {
            let idx = match current
                .children
                .iter()
                .position(|c| c.tag == step.tag && c.name() == step.name())
            {
                Some(idx) => idx,
                None => {
                    current.children.push(step.header_clone());
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }
        current.children.push(child.clone());
    }

    merged
}

/// Remove every `Action` whose name is disabled, at any depth.
pub fn remove_disabled<S: AsRef<str>>(tree: &mut LayoutNode, disabled: &[S]) {
    if disabled.is_empty() {
        return;
    }

    tree.children.retain(|child| {
        !(child.is(TAG_ACTION)
            && child
                .name()
                .is_some_and(|name| disabled.iter().any(|d| d.as_ref() == name)))
    });

    for child in &mut tree.children {
        remove_disabled(child, disabled);
    }
}

/// Combine a client layout into a copy of the host layout.
///
/// Containers with the same tag and name merge recursively, named leaves
/// already present are not duplicated, and `text` labels of the client
/// never replace the host's.
pub fn overlay(host: &LayoutNode, client: &LayoutNode) -> LayoutNode {
    let mut combined = host.clone();
    overlay_into(&mut combined, client);
    combined
}

fn overlay_into(target: &mut LayoutNode, client: &LayoutNode) {
    for child in &client.children {
        if child.is(TAG_TEXT) {
            if !target.children.iter().any(|c| c.is(TAG_TEXT)) {
                target.children.insert(0, child.clone());
            }
            continue;
        }

        let existing = target
            .children
            .iter()
            .position(|c| c.tag == child.tag && c.name() == child.name());

        match existing {
            Some(idx) if is_container(child) => overlay_into(&mut target.children[idx], child),
            Some(_) if child.name().is_some() => {}
            _ => target.children.push(child.clone()),
        }
    }
}

fn is_container(node: &LayoutNode) -> bool {
    [TAG_MENU_BAR, TAG_MENU, TAG_TOOL_BAR, TAG_ACTION_PROPERTIES]
        .iter()
        .any(|tag| node.is(tag))
}
