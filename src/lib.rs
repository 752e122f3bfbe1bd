//! Plugin registry and menu/toolbar layout merging.
//!
//! This crate lets a host application discover plugins, gate them on ABI
//! version and host capabilities, remember which ones the user enabled, and
//! merge each plugin's declared menu layout into the host's existing one.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lib_plugin_xmlgui::{LayoutDocument, LifecycleEvent, PluginConfig, PluginRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PluginConfig::default()
//!         .with_ignored_plugins(["kipiplugin_legacy"])
//!         .with_disabled_actions(["facebookexport"]);
//!
//!     let mut registry = PluginRegistry::init(config, Arc::new(MyHost))?;
//!     registry.subscribe(|event| {
//!         if let LifecycleEvent::Replug = event {
//!             // remove plugin clients, then set them up again
//!         }
//!     });
//!     registry.load_plugins();
//!
//!     let host_layout = LayoutDocument::from_file("hostui.rc".as_ref())?;
//!     let names: Vec<String> = registry
//!         .plugin_list()
//!         .iter()
//!         .map(|p| p.generic_name().to_string())
//!         .collect();
//!     for name in names {
//!         registry.setup_plugin(&name, "main window", &host_layout);
//!     }
//!     let combined = registry.combined_layout(&host_layout);
//!
//!     Ok(())
//! }
//! ```

mod actions;
mod capability;
mod config;
mod descriptor;
mod enabled;
mod error;
mod events;
mod layout;
mod loader;
mod merge;
mod persist;
mod registry;

pub use actions::*;
pub use capability::*;
pub use config::*;
pub use descriptor::*;
pub use enabled::*;
pub use error::*;
pub use events::*;
pub use layout::*;
pub use loader::*;
pub use merge::*;
pub use persist::*;
pub use registry::*;
