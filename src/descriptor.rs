//! Plugin descriptors found during discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::actions::Category;
use crate::error::{PluginError, Result};

/// File name of a descriptor inside a plugin directory.
pub const DESCRIPTOR_FILE: &str = "plugin.toml";

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    plugin: DescriptorSection,
}

#[derive(Debug, Deserialize)]
struct DescriptorSection {
    name: String,
    generic_name: String,
    #[serde(default)]
    comment: String,
    icon: Option<String>,
    library: String,
    ui_file: String,
    abi_version: u32,
    #[serde(default)]
    required_capabilities: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
}

/// Metadata of an installed plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Display name
    pub name: String,
    /// Stable identifier, used as the enable/disable key
    pub generic_name: String,
    /// Short description
    pub comment: String,
    /// Icon name
    pub icon: Option<String>,
    /// Library implementing the plugin
    pub library: String,
    /// Default layout file, relative to the plugin directory
    pub ui_file: String,
    /// ABI version the plugin was built against
    pub abi_version: u32,
    /// Host capabilities the plugin requires
    pub required_capabilities: Vec<String>,
    /// Menu categories the plugin contributes to
    pub categories: Vec<Category>,
    /// Directory the descriptor was found in
    pub dir: PathBuf,
}

impl PluginDescriptor {
    /// Parse a descriptor file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let discovery_err = |reason: String| PluginError::Discovery {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| discovery_err(e.to_string()))?;
        let file: DescriptorFile =
            toml::from_str(&content).map_err(|e| discovery_err(e.to_string()))?;
        let section = file.plugin;

        if section.generic_name.trim().is_empty() {
            return Err(discovery_err("empty generic_name".into()));
        }

        let categories = section
            .categories
            .iter()
            .filter_map(|c| match c.parse::<Category>() {
                Ok(category) => Some(category),
                Err(e) => {
                    tracing::warn!("Plugin {}: {}", section.generic_name, e);
                    None
                }
            })
            .collect();

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            name: section.name,
            generic_name: section.generic_name,
            comment: section.comment,
            icon: section.icon,
            library: section.library,
            ui_file: section.ui_file,
            abi_version: section.abi_version,
            required_capabilities: section.required_capabilities,
            categories,
            dir,
        })
    }

    /// Path of the plugin's default layout.
    pub fn ui_path(&self) -> PathBuf {
        self.dir.join(&self.ui_file)
    }

    /// File name of the layout, used for the local override.
    pub fn ui_base_name(&self) -> &str {
        Path::new(&self.ui_file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.ui_file)
    }

    /// Whether an ignore-list entry refers to this plugin.
    pub fn matches(&self, identifier: &str) -> bool {
        self.generic_name == identifier || self.library == identifier
    }
}

/// Scan directories for descriptors.
///
/// Each immediate subdirectory holding a `plugin.toml` is one plugin.
/// Malformed descriptors are logged and skipped.
pub fn discover(dirs: &[PathBuf]) -> Vec<PluginDescriptor> {
    let mut found = Vec::new();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping plugin directory {:?}: {}", dir, e);
                continue;
            }
        };

        let mut plugin_dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        // read_dir order is platform dependent
        plugin_dirs.sort();

        for plugin_dir in plugin_dirs {
            let descriptor_path = plugin_dir.join(DESCRIPTOR_FILE);
            if !descriptor_path.exists() {
                continue;
            }

            match PluginDescriptor::from_file(&descriptor_path) {
                Ok(descriptor) => found.push(descriptor),
                Err(e) => tracing::warn!("Skipping plugin: {}", e),
            }
        }
    }

    found
}
