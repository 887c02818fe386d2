//! Static permission matrix.
//!
//! The role → capability mapping is fixed at compile time and loaded nowhere
//! else; a principal's effective capabilities are exactly its role's slice.
//! Unknown role codes resolve to the empty set, so lookups deny by default.

use crate::models::{Action, Capability, Module, Role};

const fn cap(module: Module, action: Action) -> Capability {
    Capability::new(module, action)
}

/// Every capability the backend knows about.
pub const ALL_CAPABILITIES: &[Capability] = &[
    cap(Module::Clients, Action::View),
    cap(Module::Clients, Action::Create),
    cap(Module::Clients, Action::Edit),
    cap(Module::Clients, Action::Delete),
    cap(Module::Applications, Action::View),
    cap(Module::Applications, Action::Create),
    cap(Module::Applications, Action::Edit),
    cap(Module::Applications, Action::Process),
    cap(Module::Users, Action::View),
    cap(Module::Users, Action::Create),
    cap(Module::Users, Action::Edit),
    cap(Module::Users, Action::Delete),
    cap(Module::Content, Action::View),
    cap(Module::Content, Action::Create),
    cap(Module::Content, Action::Edit),
    cap(Module::Content, Action::Delete),
    cap(Module::Products, Action::View),
    cap(Module::Products, Action::Create),
    cap(Module::Products, Action::Edit),
    cap(Module::Products, Action::Delete),
    cap(Module::Orders, Action::View),
    cap(Module::Orders, Action::Create),
    cap(Module::Orders, Action::Edit),
    cap(Module::Audit, Action::View),
    cap(Module::Dashboard, Action::View),
];

/// Admin holds everything except admin-account management.
const ADMIN_CAPABILITIES: &[Capability] = &[
    cap(Module::Clients, Action::View),
    cap(Module::Clients, Action::Create),
    cap(Module::Clients, Action::Edit),
    cap(Module::Clients, Action::Delete),
    cap(Module::Applications, Action::View),
    cap(Module::Applications, Action::Create),
    cap(Module::Applications, Action::Edit),
    cap(Module::Applications, Action::Process),
    cap(Module::Users, Action::View),
    cap(Module::Content, Action::View),
    cap(Module::Content, Action::Create),
    cap(Module::Content, Action::Edit),
    cap(Module::Content, Action::Delete),
    cap(Module::Products, Action::View),
    cap(Module::Products, Action::Create),
    cap(Module::Products, Action::Edit),
    cap(Module::Products, Action::Delete),
    cap(Module::Orders, Action::View),
    cap(Module::Orders, Action::Create),
    cap(Module::Orders, Action::Edit),
    cap(Module::Audit, Action::View),
    cap(Module::Dashboard, Action::View),
];

/// Editor works on content and the catalog, read-only elsewhere.
const EDITOR_CAPABILITIES: &[Capability] = &[
    cap(Module::Clients, Action::View),
    cap(Module::Applications, Action::View),
    cap(Module::Content, Action::View),
    cap(Module::Content, Action::Create),
    cap(Module::Content, Action::Edit),
    cap(Module::Content, Action::Delete),
    cap(Module::Products, Action::View),
    cap(Module::Products, Action::Create),
    cap(Module::Products, Action::Edit),
    cap(Module::Orders, Action::View),
    cap(Module::Dashboard, Action::View),
];

/// Viewer is read-only and cannot read the audit trail.
const VIEWER_CAPABILITIES: &[Capability] = &[
    cap(Module::Clients, Action::View),
    cap(Module::Applications, Action::View),
    cap(Module::Content, Action::View),
    cap(Module::Products, Action::View),
    cap(Module::Orders, Action::View),
    cap(Module::Dashboard, Action::View),
];

/// Capabilities granted to a role.
pub fn capabilities_for(role: Role) -> &'static [Capability] {
    match role {
        Role::SuperAdmin => ALL_CAPABILITIES,
        Role::Admin => ADMIN_CAPABILITIES,
        Role::Editor => EDITOR_CAPABILITIES,
        Role::Viewer => VIEWER_CAPABILITIES,
    }
}

/// Whether a role holds a capability.
pub fn role_has(role: Role, capability: Capability) -> bool {
    capabilities_for(role).contains(&capability)
}

/// Capabilities for a stored role code; unknown codes get the empty set.
pub fn capabilities_for_code(code: &str) -> &'static [Capability] {
    match Role::parse(code) {
        Some(role) => capabilities_for(role),
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_holds_every_capability() {
        for capability in ALL_CAPABILITIES {
            assert!(role_has(Role::SuperAdmin, *capability), "{}", capability);
        }
    }

    #[test]
    fn admin_cannot_manage_admin_accounts() {
        assert!(role_has(Role::Admin, cap(Module::Users, Action::View)));
        assert!(!role_has(Role::Admin, cap(Module::Users, Action::Create)));
        assert!(!role_has(Role::Admin, cap(Module::Users, Action::Edit)));
        assert!(!role_has(Role::Admin, cap(Module::Users, Action::Delete)));
    }

    #[test]
    fn only_top_roles_see_audit_or_process_applications() {
        for role in [Role::SuperAdmin, Role::Admin] {
            assert!(role_has(role, cap(Module::Audit, Action::View)));
            assert!(role_has(role, cap(Module::Applications, Action::Process)));
        }
        for role in [Role::Editor, Role::Viewer] {
            assert!(!role_has(role, cap(Module::Audit, Action::View)));
            assert!(!role_has(role, cap(Module::Applications, Action::Process)));
        }
    }

    #[test]
    fn viewer_is_read_only() {
        for capability in capabilities_for(Role::Viewer) {
            assert_eq!(capability.action, Action::View);
        }
        assert!(role_has(Role::Viewer, cap(Module::Clients, Action::View)));
        assert!(!role_has(Role::Viewer, cap(Module::Clients, Action::Edit)));
    }

    #[test]
    fn lookups_are_deterministic() {
        for role in Role::ALL {
            for capability in ALL_CAPABILITIES {
                let first = role_has(role, *capability);
                let second = role_has(role, *capability);
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn unknown_role_code_has_no_capabilities() {
        assert!(capabilities_for_code("intern").is_empty());
        assert!(capabilities_for_code("").is_empty());
    }

    #[test]
    fn every_role_slice_is_a_subset_of_the_registry() {
        for role in Role::ALL {
            for capability in capabilities_for(role) {
                assert!(ALL_CAPABILITIES.contains(capability));
            }
        }
    }
}
