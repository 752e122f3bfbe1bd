//! Plugin instantiation, including dynamic loading with libloading.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::actions::ActionRegistry;
use crate::capability::HostInterface;
use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, Result};

/// Symbol every plugin library exports to create its instance.
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"plugin_create";

/// An instantiated plugin.
pub trait Plugin {
    /// Register the plugin's actions. The registry has just been set up
    /// with a fresh scope and holds no actions.
    fn setup(&mut self, actions: &mut ActionRegistry);

    /// Run one of the plugin's registered actions.
    fn trigger(&mut self, _action: &str, _host: &dyn HostInterface) {}
}

/// Creates plugin instances from descriptors.
pub trait PluginFactory {
    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn Plugin>>;
}

impl<F> PluginFactory for F
where
    F: Fn(&PluginDescriptor) -> Result<Box<dyn Plugin>>,
{
    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn Plugin>> {
        self(descriptor)
    }
}

/// Shared library suffix of the current platform.
const LIBRARY_SUFFIX: &str = if cfg!(target_os = "macos") {
    "dylib"
} else if cfg!(target_os = "windows") {
    "dll"
} else {
    "so"
};

/// File names a plugin library may be installed under, most specific first.
fn library_file_names(library: &str) -> [String; 3] {
    let bare = library.strip_prefix("lib").unwrap_or(library);
    [
        format!("{library}.{LIBRARY_SUFFIX}"),
        format!("lib{bare}.{LIBRARY_SUFFIX}"),
        format!("{bare}.{LIBRARY_SUFFIX}"),
    ]
}

/// Locate `library` in `dir`. When no candidate exists the plain file name
/// is returned so load errors name a concrete path.
fn find_library_path(dir: &Path, library: &str) -> PathBuf {
    let [plain, prefixed, bare] = library_file_names(library);
    let found = [&plain, &prefixed, &bare]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| dir.join(&plain));
    found
}

/// A plugin whose code lives in a dynamically loaded library.
struct LibraryPlugin {
    // Declared before the library so it is dropped first.
    plugin: Box<dyn Plugin>,
    _library: Library,
}

impl Plugin for LibraryPlugin {
    fn setup(&mut self, actions: &mut ActionRegistry) {
        self.plugin.setup(actions);
    }

    fn trigger(&mut self, action: &str, host: &dyn HostInterface) {
        self.plugin.trigger(action, host);
    }
}

/// Loads plugins from shared libraries next to their descriptors.
#[derive(Debug, Default)]
pub struct LibraryLoader {
    search_dirs: Vec<PathBuf>,
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also look for libraries in `dir` when not found next to the descriptor.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Resolve the library file for a descriptor.
    pub fn library_path(&self, descriptor: &PluginDescriptor) -> PathBuf {
        let local = find_library_path(&descriptor.dir, &descriptor.library);
        if local.exists() {
            return local;
        }
        self.search_dirs
            .iter()
            .map(|dir| find_library_path(dir, &descriptor.library))
            .find(|path| path.exists())
            .unwrap_or(local)
    }
}

impl PluginFactory for LibraryLoader {
    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn Plugin>> {
        let path = self.library_path(descriptor);
        if !path.exists() {
            return Err(PluginError::LoadFailed(format!(
                "Plugin library not found: {:?}",
                path
            )));
        }

        // Safety: loading a plugin runs its initializers; plugins are trusted
        // once installed in a plugin directory.
        let library = unsafe { Library::new(&path) }
            .map_err(|e| PluginError::LoadFailed(format!("{:?}: {}", path, e)))?;

        let create_fn: Symbol<fn() -> Box<dyn Plugin>> = unsafe { library.get(PLUGIN_ENTRY_SYMBOL) }
            .map_err(|e| PluginError::SymbolNotFound(format!("{:?}: {}", path, e)))?;

        let plugin = create_fn();
        drop(create_fn);

        Ok(Box::new(LibraryPlugin {
            plugin,
            _library: library,
        }))
    }
}
