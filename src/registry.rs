//! Plugin registry: discovery, enable state and lazy instantiation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::actions::ActionRegistry;
use crate::capability::HostInterface;
use crate::config::{PluginConfig, PLUGIN_ABI_VERSION};
use crate::descriptor::{discover, PluginDescriptor};
use crate::enabled::EnabledStore;
use crate::error::{PluginError, Result};
use crate::events::{EventBus, LifecycleEvent};
use crate::layout::LayoutDocument;
use crate::loader::{LibraryLoader, Plugin, PluginFactory};
use crate::merge::overlay;
use crate::persist::merge_and_persist;

// At most one registry is live in the process.
static REGISTRY_LIVE: AtomicBool = AtomicBool::new(false);

/// Marks the process registry as live until dropped.
#[derive(Debug)]
struct LiveToken;

impl LiveToken {
    fn acquire() -> Result<Self> {
        REGISTRY_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| LiveToken)
            .map_err(|_| PluginError::RegistryAlreadyLive)
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        REGISTRY_LIVE.store(false, Ordering::Release);
    }
}

/// Lifecycle state of a discovered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Descriptor accepted, enable flag not yet read
    Discovered,
    /// Will be instantiated on first access
    Enabled,
    /// Switched off by the user
    Disabled,
    /// Instance created, not set up yet
    Instantiated,
    /// Actions registered and layout merged
    Active,
    /// Instance destroyed; next access instantiates again
    Reloaded,
}

impl PluginState {
    /// Check if an instance exists.
    pub fn is_live(&self) -> bool {
        matches!(self, PluginState::Instantiated | PluginState::Active)
    }
}

/// A live plugin with its registered actions and installed layout.
pub struct PluginInstance {
    plugin: Box<dyn Plugin>,
    actions: ActionRegistry,
    layout: Option<LayoutDocument>,
}

impl PluginInstance {
    fn new(plugin: Box<dyn Plugin>, disabled_actions: &[String]) -> Self {
        Self {
            plugin,
            actions: ActionRegistry::new(disabled_actions.iter().cloned()),
            layout: None,
        }
    }

    /// Actions registered during the last setup.
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Mutable access to the actions, e.g. to set the default category.
    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    /// Merged layout installed by the last setup.
    pub fn layout(&self) -> Option<&LayoutDocument> {
        self.layout.as_ref()
    }

    /// The plugin object.
    pub fn plugin_mut(&mut self) -> &mut dyn Plugin {
        self.plugin.as_mut()
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("actions", &self.actions)
            .field("layout", &self.layout.is_some())
            .finish()
    }
}

/// A discovered plugin.
#[derive(Debug)]
pub struct PluginInfo {
    descriptor: PluginDescriptor,
    should_load: bool,
    state: PluginState,
    instance: Option<PluginInstance>,
    load_failed: bool,
}

impl PluginInfo {
    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Get the stable identifier.
    pub fn generic_name(&self) -> &str {
        &self.descriptor.generic_name
    }

    /// Get the description.
    pub fn comment(&self) -> &str {
        &self.descriptor.comment
    }

    /// Get the library name.
    pub fn library(&self) -> &str {
        &self.descriptor.library
    }

    /// Get the descriptor.
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Whether the plugin is enabled.
    pub fn should_load(&self) -> bool {
        self.should_load
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Check if the plugin is instantiated.
    pub fn is_instantiated(&self) -> bool {
        self.instance.is_some()
    }

    /// Get the live instance, if any.
    pub fn instance(&self) -> Option<&PluginInstance> {
        self.instance.as_ref()
    }

    /// Leave `Discovered` according to the enable flag.
    fn apply_enable_flag(&mut self, should_load: bool) {
        debug_assert_eq!(self.state, PluginState::Discovered);
        self.should_load = should_load;
        self.state = if should_load {
            PluginState::Enabled
        } else {
            PluginState::Disabled
        };
    }
}

/// Registry of discovered plugins.
///
/// Only one registry may be live in the process. The registry never touches the
/// host's menus: it emits [`LifecycleEvent::Replug`] and the host sets each
/// plugin up again through [`setup_plugin`](Self::setup_plugin).
pub struct PluginRegistry {
    config: PluginConfig,
    host: Arc<dyn HostInterface>,
    factory: Box<dyn PluginFactory>,
    enabled: EnabledStore,
    plugins: Vec<PluginInfo>,
    events: EventBus,
    // Dropped last so the slot frees only after all plugins are gone.
    _live: LiveToken,
}

impl PluginRegistry {
    /// Discover plugins, loading them from shared libraries.
    pub fn init(config: PluginConfig, host: Arc<dyn HostInterface>) -> Result<Self> {
        Self::with_factory(config, host, LibraryLoader::new())
    }

    /// Discover plugins, instantiating them with a custom factory.
    pub fn with_factory(
        config: PluginConfig,
        host: Arc<dyn HostInterface>,
        factory: impl PluginFactory + 'static,
    ) -> Result<Self> {
        let live = LiveToken::acquire()?;
        config.ensure_dirs()?;

        let enabled = EnabledStore::open(config.enabled_store_path(), config.enabled_group());
        let mut registry = Self {
            config,
            host,
            factory: Box::new(factory),
            enabled,
            plugins: Vec::new(),
            events: EventBus::new(),
            _live: live,
        };

        for descriptor in discover(&registry.config.plugin_dirs) {
            match registry.admit(descriptor) {
                Ok(Some(info)) => registry.plugins.push(info),
                Ok(None) => {}
                Err(e) => tracing::warn!("Excluding plugin: {}", e),
            }
        }

        tracing::debug!("Registry initialized with {} plugins", registry.plugins.len());
        Ok(registry)
    }

    /// Gate a discovered descriptor. `Ok(None)` means silently skipped.
    fn admit(&self, descriptor: PluginDescriptor) -> Result<Option<PluginInfo>> {
        if let Some(ignored) = self
            .config
            .ignored_plugins
            .iter()
            .find(|i| descriptor.matches(i))
        {
            tracing::debug!("Ignoring plugin {} ({})", descriptor.generic_name, ignored);
            return Ok(None);
        }

        if self.index_of(&descriptor.generic_name).is_some() {
            tracing::warn!(
                "Duplicate plugin {} in {:?}, keeping the first one",
                descriptor.generic_name,
                descriptor.dir
            );
            return Ok(None);
        }

        if descriptor.abi_version != PLUGIN_ABI_VERSION {
            return Err(PluginError::AbiMismatch {
                plugin: descriptor.generic_name,
                expected: PLUGIN_ABI_VERSION,
                actual: descriptor.abi_version,
            });
        }

        if let Some(missing) = descriptor
            .required_capabilities
            .iter()
            .find(|c| !self.host.has_feature(c))
        {
            return Err(PluginError::CapabilityUnmet {
                plugin: descriptor.generic_name.clone(),
                capability: missing.clone(),
            });
        }

        let should_load = self.enabled.is_enabled(&descriptor.generic_name);
        let mut info = PluginInfo {
            descriptor,
            should_load: false,
            state: PluginState::Discovered,
            instance: None,
            load_failed: false,
        };
        info.apply_enable_flag(should_load);
        Ok(Some(info))
    }

    fn index_of(&self, generic_name: &str) -> Option<usize> {
        self.plugins
            .iter()
            .position(|p| p.descriptor.generic_name == generic_name)
    }

    // === Queries ===

    /// Get the configuration.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Get the host interface.
    pub fn host(&self) -> &Arc<dyn HostInterface> {
        &self.host
    }

    /// All admitted plugins, in discovery order.
    pub fn plugin_list(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// Get a plugin by generic name.
    pub fn info(&self, generic_name: &str) -> Option<&PluginInfo> {
        self.index_of(generic_name).map(|idx| &self.plugins[idx])
    }

    /// ABI version descriptors must declare.
    pub fn abi_version(&self) -> u32 {
        PLUGIN_ABI_VERSION
    }

    pub fn ignored_plugins(&self) -> &[String] {
        &self.config.ignored_plugins
    }

    pub fn disabled_actions(&self) -> &[String] {
        &self.config.disabled_actions
    }

    // === Lifecycle ===

    /// Register a lifecycle listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&LifecycleEvent) + 'static) {
        self.events.subscribe(listener);
    }

    /// Ask the host to set up all plugins again.
    pub fn load_plugins(&mut self) {
        self.events.emit(LifecycleEvent::Replug);
    }

    /// Get the plugin instance, creating it on first access.
    ///
    /// Returns `None` for disabled plugins and for plugins whose
    /// instantiation failed since the last reload.
    pub fn plugin(&mut self, generic_name: &str) -> Option<&mut PluginInstance> {
        let idx = self.index_of(generic_name)?;
        if !self.instantiate(idx) {
            return None;
        }
        self.plugins[idx].instance.as_mut()
    }

    fn instantiate(&mut self, idx: usize) -> bool {
        let info = &mut self.plugins[idx];
        if info.instance.is_some() {
            return true;
        }
        if !info.should_load || info.load_failed {
            return false;
        }

        match self.factory.create(&info.descriptor) {
            Ok(plugin) => {
                info.instance = Some(PluginInstance::new(plugin, &self.config.disabled_actions));
                info.state = PluginState::Instantiated;
                let descriptor = info.descriptor.clone();
                self.events.emit(LifecycleEvent::Plug(descriptor));
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to instantiate plugin {}: {}",
                    info.descriptor.generic_name,
                    e
                );
                info.load_failed = true;
                false
            }
        }
    }

    /// Register the plugin's actions under a fresh scope and merge its
    /// layout against `host_layout`.
    ///
    /// Returns the installed layout. A failed merge is logged; the plugin
    /// stays registered but contributes no menu entries.
    pub fn setup_plugin(
        &mut self,
        generic_name: &str,
        scope_label: &str,
        host_layout: &LayoutDocument,
    ) -> Option<&LayoutDocument> {
        let idx = self.index_of(generic_name)?;
        if !self.instantiate(idx) {
            return None;
        }

        let info = &mut self.plugins[idx];
        let descriptor = &info.descriptor;
        let instance = info.instance.as_mut()?;

        instance.layout = None;
        instance.actions.setup(scope_label);
        instance.plugin.setup(&mut instance.actions);

        let override_path = self.config.override_path(descriptor.ui_base_name());
        match merge_and_persist(
            &descriptor.ui_path(),
            host_layout,
            &override_path,
            self.config.disabled_actions.as_slice(),
        ) {
            Ok(layout) => instance.layout = Some(layout),
            Err(e) => tracing::error!("Layout merge failed for {}: {}", generic_name, e),
        }
        info.state = PluginState::Active;

        info.instance.as_ref().and_then(|i| i.layout.as_ref())
    }

    /// Installed layout of a plugin, if its last setup merged successfully.
    pub fn installed_layout(&self, generic_name: &str) -> Option<&LayoutDocument> {
        self.info(generic_name)?.instance.as_ref()?.layout.as_ref()
    }

    /// The host layout with every installed plugin layout combined into it.
    pub fn combined_layout(&self, host_layout: &LayoutDocument) -> LayoutDocument {
        let mut combined = host_layout.clone();
        for layout in self
            .plugins
            .iter()
            .filter_map(|p| p.instance.as_ref()?.layout.as_ref())
        {
            combined.root = overlay(&combined.root, &layout.root);
        }
        combined
    }

    /// Run an action of a live plugin. Returns whether it was dispatched.
    pub fn trigger(&mut self, generic_name: &str, action: &str) -> bool {
        let Some(idx) = self.index_of(generic_name) else {
            return false;
        };
        let Some(instance) = self.plugins[idx].instance.as_mut() else {
            tracing::warn!("Action {} triggered on inactive plugin {}", action, generic_name);
            return false;
        };
        if instance.actions.action(action).is_none() {
            tracing::warn!("Plugin {} has no action {}", generic_name, action);
            return false;
        }

        instance.plugin.trigger(action, self.host.as_ref());
        true
    }

    /// Destroy the plugin instance and detach its layout.
    ///
    /// Returns whether an instance existed. Next access instantiates again.
    pub fn reload(&mut self, generic_name: &str) -> bool {
        match self.index_of(generic_name) {
            Some(idx) => self.reload_at(idx),
            None => false,
        }
    }

    fn reload_at(&mut self, idx: usize) -> bool {
        let info = &mut self.plugins[idx];
        info.load_failed = false;

        let Some(instance) = info.instance.take() else {
            return false;
        };
        drop(instance);
        info.state = PluginState::Reloaded;

        let descriptor = info.descriptor.clone();
        self.events.emit(LifecycleEvent::Unplug(descriptor));
        true
    }

    /// Persist a new enable flag and reload the plugin.
    pub fn set_should_load(&mut self, generic_name: &str, should_load: bool) -> Result<()> {
        let idx = self
            .index_of(generic_name)
            .ok_or_else(|| PluginError::PluginNotFound(generic_name.to_string()))?;
        if self.plugins[idx].should_load == should_load {
            return Ok(());
        }

        self.enabled.set_enabled(generic_name, should_load)?;
        self.reload_at(idx);
        let info = &mut self.plugins[idx];
        info.state = PluginState::Discovered;
        info.apply_enable_flag(should_load);
        Ok(())
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, Category};
    use crate::capability::{Capabilities, Capability};
    use crate::descriptor::DESCRIPTOR_FILE;
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::{tempdir, TempDir};

    static SERIAL: Mutex<()> = Mutex::new(());

    /// Registries are process-wide, so tests creating them run one at a time.
    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|e| e.into_inner())
    }

    struct TestHost;

    impl HostInterface for TestHost {
        fn features(&self) -> Capabilities {
            Capabilities::empty().with(Capability::HostSupportsThumbnails)
        }
    }

    struct DoThing {
        triggered: Rc<RefCell<Vec<String>>>,
    }

    impl Plugin for DoThing {
        fn setup(&mut self, actions: &mut ActionRegistry) {
            actions.add_action("doThing", Action::new("Do Thing"), Category::Tools);
        }

        fn trigger(&mut self, action: &str, _host: &dyn HostInterface) {
            self.triggered.borrow_mut().push(action.to_string());
        }
    }

    const UI: &str = r#"<gui name="demo"><MenuBar><Menu name="Tools"><Action name="doThing"/></Menu></MenuBar></gui>"#;

    fn write_plugin(root: &Path, generic_name: &str, abi: u32, caps: &[&str]) {
        let dir = root.join(generic_name);
        std::fs::create_dir_all(&dir).unwrap();
        let caps = caps
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(
            dir.join(DESCRIPTOR_FILE),
            format!(
                "[plugin]\nname = \"{0}\"\ngeneric_name = \"{0}\"\nlibrary = \"kipiplugin_{0}\"\n\
                 ui_file = \"{0}ui.rc\"\nabi_version = {1}\nrequired_capabilities = [{2}]\n",
                generic_name, abi, caps
            ),
        )
        .unwrap();
        std::fs::write(dir.join(format!("{}ui.rc", generic_name)), UI).unwrap();
    }

    struct Fixture {
        _serial: MutexGuard<'static, ()>,
        _dir: TempDir,
        config: PluginConfig,
        created: Rc<Cell<usize>>,
        triggered: Rc<RefCell<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let serial = serial();
            let dir = tempdir().unwrap();
            let config = PluginConfig::new(
                dir.path().join("data"),
                dir.path().join("config"),
                "testhost",
            );
            std::fs::create_dir_all(&config.plugin_dirs[0]).unwrap();
            Self {
                _serial: serial,
                _dir: dir,
                config,
                created: Rc::new(Cell::new(0)),
                triggered: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn plugins_dir(&self) -> &Path {
            &self.config.plugin_dirs[0]
        }

        fn registry(&self) -> PluginRegistry {
            let created = self.created.clone();
            let triggered = self.triggered.clone();
            let factory = move |_: &PluginDescriptor| -> Result<Box<dyn Plugin>> {
                created.set(created.get() + 1);
                Ok(Box::new(DoThing {
                    triggered: triggered.clone(),
                }))
            };
            PluginRegistry::with_factory(self.config.clone(), Arc::new(TestHost), factory)
                .unwrap()
        }
    }

    fn record_events(registry: &mut PluginRegistry) -> Rc<RefCell<Vec<LifecycleEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        registry.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    fn host_layout() -> LayoutDocument {
        LayoutDocument::parse(r#"<kpartgui name="host"><MenuBar><Menu name="Tools"/></MenuBar></kpartgui>"#)
            .unwrap()
    }

    #[test]
    fn test_only_one_live_registry() {
        let fixture = Fixture::new();
        let first = fixture.registry();

        let second =
            PluginRegistry::with_factory(fixture.config.clone(), Arc::new(TestHost), LibraryLoader::new());
        assert!(matches!(second, Err(PluginError::RegistryAlreadyLive)));

        drop(first);
        let _third = fixture.registry();
    }

    #[test]
    fn test_second_registry_rejected_from_other_thread() {
        let fixture = Fixture::new();
        let first = fixture.registry();

        let config = fixture.config.clone();
        let rejected = std::thread::spawn(move || {
            matches!(
                PluginRegistry::with_factory(config, Arc::new(TestHost), LibraryLoader::new()),
                Err(PluginError::RegistryAlreadyLive)
            )
        })
        .join()
        .unwrap();
        assert!(rejected);

        drop(first);
        let config = fixture.config.clone();
        let accepted = std::thread::spawn(move || {
            PluginRegistry::with_factory(config, Arc::new(TestHost), LibraryLoader::new()).is_ok()
        })
        .join()
        .unwrap();
        assert!(accepted);
    }

    #[test]
    fn test_abi_mismatch_is_excluded() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "old", PLUGIN_ABI_VERSION - 1, &[]);
        write_plugin(fixture.plugins_dir(), "current", PLUGIN_ABI_VERSION, &[]);

        let registry = fixture.registry();

        let names: Vec<_> = registry.plugin_list().iter().map(PluginInfo::generic_name).collect();
        assert_eq!(names, vec!["current"]);
    }

    #[test]
    fn test_capability_and_ignore_gates() {
        let mut fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "tags", PLUGIN_ABI_VERSION, &["HostSupportsTags"]);
        write_plugin(fixture.plugins_dir(), "thumbs", PLUGIN_ABI_VERSION, &["HostSupportsThumbnails"]);
        write_plugin(fixture.plugins_dir(), "skipped", PLUGIN_ABI_VERSION, &[]);
        fixture.config = fixture.config.clone().with_ignored_plugins(["kipiplugin_skipped"]);

        let registry = fixture.registry();

        let names: Vec<_> = registry.plugin_list().iter().map(PluginInfo::generic_name).collect();
        assert_eq!(names, vec!["thumbs"]);
        assert_eq!(registry.ignored_plugins(), &["kipiplugin_skipped".to_string()]);
    }

    #[test]
    fn test_lazy_instantiation_emits_plug_once() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        let mut registry = fixture.registry();
        let events = record_events(&mut registry);

        assert_eq!(registry.info("demo").unwrap().state(), PluginState::Enabled);
        assert_eq!(fixture.created.get(), 0);

        assert!(registry.plugin("demo").is_some());
        assert!(registry.plugin("demo").is_some());

        assert_eq!(fixture.created.get(), 1);
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(events.borrow()[0].plugin(), Some("demo"));
    }

    #[test]
    fn test_reload_reinstantiates_with_fresh_plug() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        let mut registry = fixture.registry();
        registry.plugin("demo");
        let events = record_events(&mut registry);

        assert!(registry.reload("demo"));
        assert_eq!(registry.info("demo").unwrap().state(), PluginState::Reloaded);
        assert!(registry.plugin("demo").is_some());

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LifecycleEvent::Unplug(_)));
        assert!(matches!(events[1], LifecycleEvent::Plug(_)));
        assert_eq!(fixture.created.get(), 2);
    }

    #[test]
    fn test_failed_instantiation_waits_for_reload() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        let factory = move |_: &PluginDescriptor| -> Result<Box<dyn Plugin>> {
            counter.set(counter.get() + 1);
            Err(PluginError::LoadFailed("broken".into()))
        };
        let mut registry =
            PluginRegistry::with_factory(fixture.config.clone(), Arc::new(TestHost), factory)
                .unwrap();

        assert!(registry.plugin("demo").is_none());
        assert!(registry.plugin("demo").is_none());
        assert_eq!(attempts.get(), 1);

        assert!(!registry.reload("demo"));
        assert!(registry.plugin("demo").is_none());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_disable_persists_and_unplugs() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        {
            let mut registry = fixture.registry();
            registry.plugin("demo");
            let events = record_events(&mut registry);

            registry.set_should_load("demo", false).unwrap();

            let info = registry.info("demo").unwrap();
            assert!(!info.should_load());
            assert!(!info.is_instantiated());
            assert_eq!(info.state(), PluginState::Disabled);
            assert!(matches!(events.borrow()[0], LifecycleEvent::Unplug(_)));
            assert!(registry.plugin("demo").is_none());
        }

        let mut registry = fixture.registry();
        assert!(!registry.info("demo").unwrap().should_load());
        assert!(registry.plugin("demo").is_none());
        assert!(matches!(
            registry.set_should_load("missing", true),
            Err(PluginError::PluginNotFound(_))
        ));

        registry.set_should_load("demo", true).unwrap();
        assert_eq!(registry.info("demo").unwrap().state(), PluginState::Enabled);
        assert!(registry.plugin("demo").is_some());
    }

    #[test]
    fn test_load_plugins_only_emits_replug() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        let mut registry = fixture.registry();
        let events = record_events(&mut registry);

        registry.load_plugins();

        assert_eq!(*events.borrow(), vec![LifecycleEvent::Replug]);
        assert_eq!(fixture.created.get(), 0);
    }

    #[test]
    fn test_setup_registers_actions_and_installs_layout() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        let mut registry = fixture.registry();

        let layout = registry
            .setup_plugin("demo", "main window", &host_layout())
            .cloned()
            .unwrap();

        assert_eq!(layout.menu_bar().unwrap().children.len(), 1);
        assert!(fixture.config.override_path("demoui.rc").exists());

        let instance = registry.plugin("demo").unwrap();
        assert_eq!(instance.actions().len(), 1);
        assert_eq!(instance.actions().category("doThing"), Category::Tools);
        assert_eq!(registry.info("demo").unwrap().state(), PluginState::Active);

        assert!(registry.trigger("demo", "doThing"));
        assert!(!registry.trigger("demo", "unknown"));
        assert_eq!(*fixture.triggered.borrow(), vec!["doThing".to_string()]);

        registry.reload("demo");
        assert!(registry.installed_layout("demo").is_none());
        assert!(!registry.trigger("demo", "doThing"));
    }

    #[test]
    fn test_disabled_actions_are_filtered_everywhere() {
        let mut fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        fixture.config = fixture.config.clone().with_disabled_actions(["doThing"]);
        let mut registry = fixture.registry();

        let layout = registry
            .setup_plugin("demo", "main window", &host_layout())
            .cloned()
            .unwrap();

        let tools = &layout.menu_bar().unwrap().children[0];
        assert_eq!(tools.name(), Some("Tools"));
        assert!(tools.children.is_empty());
        assert!(registry.plugin("demo").unwrap().actions().is_empty());
    }

    #[test]
    fn test_missing_ui_file_keeps_plugin_registered() {
        let fixture = Fixture::new();
        write_plugin(fixture.plugins_dir(), "demo", PLUGIN_ABI_VERSION, &[]);
        std::fs::remove_file(fixture.plugins_dir().join("demo").join("demoui.rc")).unwrap();
        let mut registry = fixture.registry();

        assert!(registry.setup_plugin("demo", "w", &host_layout()).is_none());
        assert!(registry.info("demo").is_some());
        assert_eq!(registry.plugin("demo").unwrap().actions().len(), 1);

        let combined = registry.combined_layout(&host_layout());
        assert_eq!(combined, host_layout());
    }
}
