/// Unit tests for the capability table and share-link tokens
use fichapro_api::ficha::share_token;
use fichapro_api::policy::{can_perform, Action, Role};
use uuid::Uuid;

#[cfg(test)]
mod role_parsing_tests {
    use super::*;

    #[test]
    fn metadata_role_names_parse() {
        assert_eq!(Role::from_header(Some("admin")), Role::Admin);
        assert_eq!(Role::from_header(Some("Manager")), Role::Manager);
        assert_eq!(Role::from_header(Some("USER")), Role::User);
    }

    #[test]
    fn portuguese_display_names_parse() {
        assert_eq!(Role::from_header(Some("Administrador")), Role::Admin);
        assert_eq!(Role::from_header(Some("Gestor")), Role::Manager);
        assert_eq!(Role::from_header(Some("Usuário")), Role::User);
        assert_eq!(Role::from_header(Some("Usuario")), Role::User);
    }

    #[test]
    fn everything_else_is_a_visitor() {
        assert_eq!(Role::from_header(None), Role::Visitor);
        assert_eq!(Role::from_header(Some("")), Role::Visitor);
        assert_eq!(Role::from_header(Some("root")), Role::Visitor);
    }
}

#[cfg(test)]
mod capability_tests {
    use super::*;

    #[test]
    fn users_edit_but_never_delete() {
        assert!(can_perform(Role::User, Action::CreateProperty));
        assert!(can_perform(Role::User, Action::EditProperty));
        assert!(!can_perform(Role::User, Action::DeleteProperty));
        assert!(!can_perform(Role::User, Action::DeleteLead));
    }

    #[test]
    fn managers_and_admins_delete() {
        for role in [Role::Admin, Role::Manager] {
            assert!(can_perform(role, Action::DeleteProperty));
            assert!(can_perform(role, Action::DeleteLead));
        }
    }

    #[test]
    fn audit_trail_is_management_only() {
        assert!(can_perform(Role::Admin, Action::ViewLogs));
        assert!(can_perform(Role::Manager, Action::ViewLogs));
        assert!(!can_perform(Role::User, Action::ViewLogs));
        assert!(!can_perform(Role::Visitor, Action::ViewLogs));
    }

    #[test]
    fn visitors_can_do_nothing() {
        for action in [
            Action::CreateProperty,
            Action::EditProperty,
            Action::DeleteProperty,
            Action::ShareFicha,
            Action::ViewLeads,
            Action::ManageLeads,
            Action::DeleteLead,
            Action::ManageNegotiations,
            Action::ViewLogs,
        ] {
            assert!(
                !can_perform(Role::Visitor, action),
                "visitor unexpectedly allowed {:?}",
                action
            );
        }
    }
}

#[cfg(test)]
mod share_token_tests {
    use super::*;

    #[test]
    fn tokens_are_deterministic() {
        let id = Uuid::new_v4();
        assert_eq!(share_token("secret", &id), share_token("secret", &id));
    }

    #[test]
    fn tokens_are_hex_sha256() {
        let token = share_token("secret", &Uuid::new_v4());
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_properties_get_distinct_tokens() {
        let a = share_token("secret", &Uuid::new_v4());
        let b = share_token("secret", &Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn token_depends_on_the_secret() {
        let id = Uuid::new_v4();
        assert_ne!(share_token("secret-a", &id), share_token("secret-b", &id));
    }
}
