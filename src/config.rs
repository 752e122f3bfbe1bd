//! Plugin registry configuration.

use std::path::PathBuf;

/// ABI version this crate was built for. Descriptors must match it exactly.
pub const PLUGIN_ABI_VERSION: u32 = 6;

/// Configuration for the plugin registry and layout merging.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Directories searched for plugin descriptors
    pub plugin_dirs: Vec<PathBuf>,

    /// Application data root; merged layouts land under `<data_dir>/<component_name>/`
    pub data_dir: PathBuf,

    /// Directory holding the enable/disable store
    pub config_dir: PathBuf,

    /// Host component name
    pub component_name: String,

    /// Namespace of the enable/disable group
    pub namespace: String,

    /// Plugins never loaded (matched against generic name or library)
    pub ignored_plugins: Vec<String>,

    /// Action identifiers stripped from every plugin
    pub disabled_actions: Vec<String>,
}

impl PluginConfig {
    /// Create a new configuration with required paths.
    pub fn new(data_dir: PathBuf, config_dir: PathBuf, component_name: impl Into<String>) -> Self {
        Self {
            plugin_dirs: vec![data_dir.join("plugins")],
            data_dir,
            config_dir,
            component_name: component_name.into(),
            namespace: "KIPI".to_string(),
            ignored_plugins: Vec::new(),
            disabled_actions: Vec::new(),
        }
    }

    /// Replace the descriptor search paths.
    pub fn with_plugin_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.plugin_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Add a descriptor search path.
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dirs.push(dir.into());
        self
    }

    /// Set the enable/disable namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Add plugins to ignore.
    pub fn with_ignored_plugins(
        mut self,
        plugins: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.ignored_plugins.extend(plugins.into_iter().map(Into::into));
        self
    }

    /// Add disabled action identifiers.
    pub fn with_disabled_actions(
        mut self,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.disabled_actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Group under which enable flags are stored.
    pub fn enabled_group(&self) -> String {
        format!("{}/EnabledPlugin", self.namespace)
    }

    /// Path of the enable/disable store.
    pub fn enabled_store_path(&self) -> PathBuf {
        self.config_dir.join(&self.component_name).join("plugins.json")
    }

    /// Path the merged layout of a plugin is written to.
    pub fn override_path(&self, ui_base_name: &str) -> PathBuf {
        self.data_dir.join(&self.component_name).join(ui_base_name)
    }

    /// Ensure directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.data_dir.join(&self.component_name))?;
        std::fs::create_dir_all(self.config_dir.join(&self.component_name))?;
        Ok(())
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        // Use platform-appropriate default directories
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));

        Self::new(data_dir, config_dir, "kipi-host")
    }
}
