//! Capability model - (module, action) pairs granted to roles.

use serde::Serialize;

/// Backend modules a capability can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Clients,
    Applications,
    Users,
    Content,
    Products,
    Orders,
    Audit,
    Dashboard,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Clients => "clients",
            Module::Applications => "applications",
            Module::Users => "users",
            Module::Content => "content",
            Module::Products => "products",
            Module::Orders => "orders",
            Module::Audit => "audit",
            Module::Dashboard => "dashboard",
        }
    }

    pub fn parse(s: &str) -> Option<Module> {
        match s {
            "clients" => Some(Module::Clients),
            "applications" => Some(Module::Applications),
            "users" => Some(Module::Users),
            "content" => Some(Module::Content),
            "products" => Some(Module::Products),
            "orders" => Some(Module::Orders),
            "audit" => Some(Module::Audit),
            "dashboard" => Some(Module::Dashboard),
            _ => None,
        }
    }
}

/// Actions a capability can grant on a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Process,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Process => "process",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "view" => Some(Action::View),
            "create" => Some(Action::Create),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            "process" => Some(Action::Process),
            _ => None,
        }
    }
}

/// A permitted (module, action) pair, e.g. `clients.view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Capability {
    pub module: Module,
    pub action: Action,
}

impl Capability {
    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Render the `{module}.{action}` key used in config and API responses.
    pub fn key(&self) -> String {
        format!("{}.{}", self.module.as_str(), self.action.as_str())
    }

    /// Parse a `{module}.{action}` key.
    pub fn parse_key(key: &str) -> Option<Capability> {
        let (module, action) = key.split_once('.')?;
        Some(Capability {
            module: Module::parse(module)?,
            action: Action::parse(action)?,
        })
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module.as_str(), self.action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips() {
        let cap = Capability::new(Module::Applications, Action::Process);
        assert_eq!(cap.key(), "applications.process");
        assert_eq!(Capability::parse_key("applications.process"), Some(cap));
    }

    #[test]
    fn parse_key_rejects_malformed_input() {
        assert_eq!(Capability::parse_key("applications"), None);
        assert_eq!(Capability::parse_key("applications.fly"), None);
        assert_eq!(Capability::parse_key("ships.view"), None);
        assert_eq!(Capability::parse_key(""), None);
    }
}
