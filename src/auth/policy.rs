//! Role-scoped access policy.
//!
//! Every visibility or approval decision goes through this module; nothing
//! else interprets the raw role column.

use thiserror::Error;
use tracing::warn;

use crate::error::AppError;
use crate::model::{employee::Employee, role::Role, user::User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

/// The set of records an actor may see.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Records of employees placed in this division.
    Division(u64),
    /// Records owned by this user id.
    SelfOnly(u64),
}

impl Scope {
    /// Whether a record owned by `owner_user_id`, whose employee sits in
    /// `division_id`, falls inside this scope.
    pub fn covers(&self, owner_user_id: u64, division_id: u64) -> bool {
        match *self {
            Scope::All => true,
            Scope::Division(id) => id == division_id,
            Scope::SelfOnly(user_id) => user_id == owner_user_id,
        }
    }
}

pub fn role_of(user: &User) -> Result<Role, PolicyError> {
    Role::from_name(&user.role).ok_or_else(|| PolicyError::InvalidRole(user.role.clone()))
}

pub fn resolve_scope(actor: &User) -> Result<Scope, PolicyError> {
    let scope = match role_of(actor)? {
        Role::Admin => Scope::All,
        Role::Manager => match actor.division_id {
            Some(division_id) => Scope::Division(division_id),
            None => {
                warn!(
                    user_id = actor.id,
                    username = %actor.username,
                    "Manager without a division resolves to unrestricted visibility"
                );
                Scope::All
            }
        },
        Role::Employee => Scope::SelfOnly(actor.id),
    };

    Ok(scope)
}

/// Admins approve anything; managers only within their own division.
pub fn can_approve(actor: &User, target: &Employee) -> Result<bool, PolicyError> {
    let allowed = match role_of(actor)? {
        Role::Admin => true,
        Role::Manager => actor.division_id == Some(target.division_id),
        Role::Employee => false,
    };

    Ok(allowed)
}

/// Employee detail. Unlike listings, a manager without a division sees
/// nobody's record.
pub fn can_view_employee(actor: &User, target: &Employee) -> Result<bool, PolicyError> {
    let allowed = match role_of(actor)? {
        Role::Admin => true,
        Role::Manager => actor.division_id == Some(target.division_id),
        Role::Employee => actor.id == target.user_id,
    };

    Ok(allowed)
}

/// Gate for the employee directory and the dashboard, and the first check
/// of a request decision.
pub fn require_approver(actor: &User) -> Result<Role, AppError> {
    let role = role_of(actor)?;
    if role.is_approver() {
        Ok(role)
    } else {
        Err(AppError::forbidden("Only admins and managers can do this"))
    }
}
