//! Merging a plugin's default layout against the host and persisting it.

use std::fs;
use std::path::Path;

use crate::error::{PluginError, Result};
use crate::layout::{LayoutDocument, LayoutNode, TAG_MENU_BAR};
use crate::merge::{merge, remove_disabled, resolve_paths};

/// Merge the plugin layout at `descriptor_path` into the shape of
/// `host_layout` and write the result to `override_path`.
///
/// The menu bar always comes from the plugin defaults. Tool bar and action
/// properties are taken from a readable existing override so that user
/// customizations survive, and from the defaults otherwise.
pub fn merge_and_persist<S: AsRef<str>>(
    descriptor_path: &Path,
    host_layout: &LayoutDocument,
    override_path: &Path,
    disabled: &[S],
) -> Result<LayoutDocument> {
    let mut defaults =
        LayoutDocument::from_file(descriptor_path).map_err(|e| PluginError::Load {
            path: descriptor_path.to_path_buf(),
            reason: e.to_string(),
        })?;
    remove_disabled(&mut defaults.root, disabled);

    let plugin_menu_bar = defaults
        .menu_bar()
        .cloned()
        .unwrap_or_else(|| LayoutNode::new(TAG_MENU_BAR));
    let merged_menu_bar = match host_layout.menu_bar() {
        Some(host_menu_bar) => {
            let paths = resolve_paths(host_menu_bar, &plugin_menu_bar.children);
            merge(&plugin_menu_bar, &paths)
        }
        None => merge(&plugin_menu_bar, &Default::default()),
    };

    let (tool_bar, action_properties) = match load_local_override(override_path, disabled) {
        Ok(Some(local)) => (local.tool_bar().cloned(), local.action_properties().cloned()),
        Ok(None) => (
            defaults.tool_bar().cloned(),
            defaults.action_properties().cloned(),
        ),
        Err(e) => {
            tracing::warn!("{}; falling back to plugin defaults", e);
            (
                defaults.tool_bar().cloned(),
                defaults.action_properties().cloned(),
            )
        }
    };

    let mut root = defaults.root.bare_clone();
    root.children.push(merged_menu_bar);
    root.children.extend(tool_bar);
    root.children.extend(action_properties);

    let merged = LayoutDocument {
        doctype: defaults.doctype.clone(),
        root,
    };
    write_layout(&merged, override_path)?;

    tracing::debug!(
        "Merged layout {:?} into {:?}",
        descriptor_path,
        override_path
    );
    Ok(merged)
}

/// Read a previously persisted layout, with disabled actions stripped.
///
/// Returns `Ok(None)` when no override exists yet.
pub fn load_local_override<S: AsRef<str>>(
    override_path: &Path,
    disabled: &[S],
) -> Result<Option<LayoutDocument>> {
    if !override_path.exists() {
        return Ok(None);
    }

    let mut local =
        LayoutDocument::from_file(override_path).map_err(|e| PluginError::LocalOverride {
            path: override_path.to_path_buf(),
            reason: e.to_string(),
        })?;
    remove_disabled(&mut local.root, disabled);
    Ok(Some(local))
}

/// Write a layout atomically, creating parent directories as needed.
///
/// On failure the file at `path` keeps its previous content.
pub fn write_layout(layout: &LayoutDocument, path: &Path) -> Result<()> {
    let write_err = |reason: String| PluginError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let xml = layout.to_xml().map_err(|e| write_err(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }

    let tmp = path.with_extension("rc.tmp");
    fs::write(&tmp, xml).map_err(|e| write_err(e.to_string()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }
    Ok(())
}
