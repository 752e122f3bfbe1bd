//! Registered plugin actions, grouped by scope and category.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PluginError;

/// Menu group an action is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Images,
    Tools,
    Import,
    Export,
    Batch,
    Collections,
    Invalid,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Tools => "Tools",
            Category::Import => "Import",
            Category::Export => "Export",
            Category::Batch => "Batch",
            Category::Collections => "Collections",
            Category::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Images" => Ok(Category::Images),
            "Tools" => Ok(Category::Tools),
            "Import" => Ok(Category::Import),
            "Export" => Ok(Category::Export),
            "Batch" => Ok(Category::Batch),
            "Collections" => Ok(Category::Collections),
            other => Err(PluginError::InvalidCategory(other.to_string())),
        }
    }
}

/// Handle for the widget scope actions are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope(u64);

impl Scope {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A user-visible action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub text: String,
    pub icon: Option<String>,
    pub shortcut: Option<String>,
}

impl Action {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: None,
            shortcut: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }
}

/// An action registered by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub identifier: String,
    pub action: Action,
    pub category: Category,
    pub scope: Scope,
}

/// Actions a plugin registered during its last setup.
#[derive(Debug)]
pub struct ActionRegistry {
    disabled: HashSet<String>,
    default_category: Category,
    current: Option<(Scope, String)>,
    next_scope: u64,
    records: Vec<ActionRecord>,
}

impl ActionRegistry {
    /// Create a registry rejecting the given identifiers.
    pub fn new(disabled: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            disabled: disabled.into_iter().map(Into::into).collect(),
            default_category: Category::Invalid,
            current: None,
            next_scope: 1,
            records: Vec::new(),
        }
    }

    /// Forget all registered actions and open a new default scope.
    pub fn setup(&mut self, label: impl Into<String>) -> Scope {
        self.records.clear();
        let scope = Scope(self.next_scope);
        self.next_scope += 1;
        let label = label.into();
        tracing::debug!("Action scope {} opened for {}", scope.0, label);
        self.current = Some((scope, label));
        scope
    }

    /// The default scope, if setup has run.
    pub fn default_scope(&self) -> Option<Scope> {
        self.current.as_ref().map(|(scope, _)| *scope)
    }

    /// Label given to the scope at setup.
    pub fn scope_label(&self, scope: Scope) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|(current, _)| *current == scope)
            .map(|(_, label)| label.as_str())
    }

    /// Register an action under the default scope.
    ///
    /// Disabled identifiers are skipped. Returns whether the action was added.
    pub fn add_action(
        &mut self,
        identifier: impl Into<String>,
        action: Action,
        category: Category,
    ) -> bool {
        let identifier = identifier.into();
        if self.disabled.contains(&identifier) {
            tracing::debug!("Action {} is disabled, not registering it", identifier);
            return false;
        }

        let Some(scope) = self.default_scope() else {
            tracing::warn!(
                "Action {} registered before setup; no scope to add it to",
                identifier
            );
            return false;
        };

        if category == Category::Invalid {
            tracing::warn!("{}", PluginError::InvalidCategory(identifier.clone()));
        }

        self.records.retain(|r| r.identifier != identifier);
        self.records.push(ActionRecord {
            identifier,
            action,
            category,
            scope,
        });
        true
    }

    /// Actions registered under `scope`, or the default scope when `None`.
    pub fn actions(&self, scope: Option<Scope>) -> Vec<&ActionRecord> {
        let Some(scope) = scope.or_else(|| self.default_scope()) else {
            tracing::warn!("Actions queried before setup");
            return Vec::new();
        };

        if self.default_scope() != Some(scope) {
            tracing::warn!("{}", PluginError::UnknownScope(scope.0));
            return Vec::new();
        }

        self.records.iter().filter(|r| r.scope == scope).collect()
    }

    /// Look up a registered action.
    pub fn action(&self, identifier: &str) -> Option<&ActionRecord> {
        self.records.iter().find(|r| r.identifier == identifier)
    }

    /// Category of an action, falling back to the default category.
    pub fn category(&self, identifier: &str) -> Category {
        if let Some(record) = self.action(identifier) {
            return record.category;
        }

        if self.default_category == Category::Invalid {
            tracing::warn!("{}", PluginError::InvalidCategory(identifier.to_string()));
        }
        self.default_category
    }

    pub fn set_default_category(&mut self, category: Category) {
        self.default_category = category;
    }

    pub fn default_category(&self) -> Category {
        self.default_category
    }

    /// Whether an identifier is rejected.
    pub fn is_disabled(&self, identifier: &str) -> bool {
        self.disabled.contains(identifier)
    }

    /// Drop every registered action and the default scope.
    pub fn clear(&mut self) {
        self.records.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[&ActionRecord]) -> Vec<String> {
        records.iter().map(|r| r.identifier.clone()).collect()
    }

    #[test]
    fn test_actions_are_ordered_per_scope() {
        let mut registry = ActionRegistry::default();
        let scope = registry.setup("main window");

        registry.add_action("b", Action::new("B"), Category::Tools);
        registry.add_action("a", Action::new("A"), Category::Export);

        assert_eq!(ids(&registry.actions(None)), vec!["b", "a"]);
        assert_eq!(ids(&registry.actions(Some(scope))), vec!["b", "a"]);
        assert_eq!(registry.scope_label(scope), Some("main window"));
    }

    #[test]
    fn test_setup_clears_previous_actions() {
        let mut registry = ActionRegistry::default();
        let old = registry.setup("first");
        registry.add_action("a", Action::new("A"), Category::Tools);

        let new = registry.setup("second");

        assert_ne!(old, new);
        assert!(registry.is_empty());
        assert!(registry.actions(Some(old)).is_empty());
    }

    #[test]
    fn test_disabled_identifiers_are_rejected() {
        let mut registry = ActionRegistry::new(["doThing"]);
        registry.setup("w");

        assert!(!registry.add_action("doThing", Action::new("Do"), Category::Tools));
        assert!(registry.add_action("other", Action::new("Other"), Category::Tools));
        assert_eq!(registry.len(), 1);
        assert!(registry.is_disabled("doThing"));
    }

    #[test]
    fn test_queries_before_setup_are_empty() {
        let mut registry = ActionRegistry::default();

        assert!(registry.actions(None).is_empty());
        assert!(!registry.add_action("a", Action::new("A"), Category::Tools));
    }

    #[test]
    fn test_category_falls_back_to_default() {
        let mut registry = ActionRegistry::default();
        registry.setup("w");
        registry.add_action("send", Action::new("Send"), Category::Export);

        assert_eq!(registry.category("send"), Category::Export);
        assert_eq!(registry.category("unknown"), Category::Invalid);

        registry.set_default_category(Category::Tools);
        assert_eq!(registry.category("unknown"), Category::Tools);
    }

    #[test]
    fn test_clear_drops_scope() {
        let mut registry = ActionRegistry::default();
        let scope = registry.setup("w");
        registry.add_action("a", Action::new("A").with_icon("document-export"), Category::Export);
        assert_eq!(registry.action("a").unwrap().action.icon.as_deref(), Some("document-export"));

        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.actions(Some(scope)).is_empty());
        assert!(!registry.add_action("b", Action::new("B"), Category::Tools));
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut registry = ActionRegistry::default();
        registry.setup("w");
        registry.add_action("a", Action::new("A"), Category::Tools);
        registry.add_action("a", Action::new("A2").with_shortcut("Ctrl+A"), Category::Batch);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.category("a"), Category::Batch);
        assert_eq!(registry.action("a").unwrap().action.text, "A2");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Export".parse::<Category>().unwrap(), Category::Export);
        assert!("Printing".parse::<Category>().is_err());
        assert_eq!(Category::Collections.to_string(), "Collections");
    }
}
