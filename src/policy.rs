//! Centralized capability checks for mutating operations.
//!
//! Role checks used to live inline at every call site as string-array
//! membership tests; they are collected here into one table so every
//! handler asks the same question the same way.

use std::fmt;

/// Caller role, parsed from the role header injected by the fronting auth
/// layer. Both the metadata role names and the Portuguese display names are
/// accepted; anything else is a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    User,
    Visitor,
}

impl Role {
    pub fn from_header(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or("") {
            r if r.eq_ignore_ascii_case("admin") || r == "Administrador" => Role::Admin,
            r if r.eq_ignore_ascii_case("manager") || r == "Gestor" => Role::Manager,
            r if r.eq_ignore_ascii_case("user") || r == "Usuário" || r == "Usuario" => Role::User,
            _ => Role::Visitor,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Visitor => "visitor",
        };
        f.write_str(label)
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProperty,
    EditProperty,
    DeleteProperty,
    ShareFicha,
    ViewLeads,
    ManageLeads,
    DeleteLead,
    ManageNegotiations,
    ViewLogs,
}

/// The single authorization table. Every mutating handler calls this before
/// touching storage.
pub fn can_perform(role: Role, action: Action) -> bool {
    use Action::*;
    use Role::*;

    match action {
        CreateProperty | EditProperty => matches!(role, Admin | Manager | User),
        DeleteProperty => matches!(role, Admin | Manager),
        ShareFicha => matches!(role, Admin | Manager | User),
        ViewLeads | ManageLeads => matches!(role, Admin | Manager | User),
        DeleteLead => matches!(role, Admin | Manager),
        ManageNegotiations => matches!(role, Admin | Manager | User),
        ViewLogs => matches!(role, Admin | Manager),
    }
}
