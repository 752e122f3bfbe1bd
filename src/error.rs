//! Error types for plugin registry and layout merge operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering plugins or merging their layouts.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plugin descriptor could not be read or parsed
    #[error("Malformed plugin descriptor {path:?}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    /// Descriptor was built against a different ABI
    #[error("Incompatible ABI version for {plugin}: expected {expected}, got {actual}")]
    AbiMismatch {
        plugin: String,
        expected: u32,
        actual: u32,
    },

    /// Host does not provide a capability the plugin requires
    #[error("Plugin {plugin} requires unsupported host capability: {capability}")]
    CapabilityUnmet { plugin: String, capability: String },

    /// Default layout of a plugin could not be loaded
    #[error("Failed to load plugin layout {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Previously persisted layout could not be used
    #[error("Local layout override {path:?} unusable: {reason}")]
    LocalOverride { path: PathBuf, reason: String },

    /// Merged layout could not be written
    #[error("Failed to write merged layout {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Action scope was never issued or has been cleared
    #[error("Unknown action scope: {0}")]
    UnknownScope(u64),

    /// Action has no usable category
    #[error("Invalid category for action: {0}")]
    InvalidCategory(String),

    /// Plugin not found
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    /// Failed to instantiate plugin
    #[error("Failed to load plugin: {0}")]
    LoadFailed(String),

    /// Plugin entry symbol not found
    #[error("Plugin entry symbol not found: {0}")]
    SymbolNotFound(String),

    /// Another registry is still alive on this thread
    #[error("A plugin registry is already live")]
    RegistryAlreadyLive,

    /// Layout document does not follow the expected schema
    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<quick_xml::events::attributes::AttrError> for PluginError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        PluginError::Xml(err.into())
    }
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
