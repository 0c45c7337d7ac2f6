use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation;

// =============================================================================
// Role & Permission
// =============================================================================

/// Access level of a dashboard user, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Staff,
    #[default]
    Guest,
}

/// Something a role may or may not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Permission {
    View,
    /// Sales and POS checkout.
    RecordSales,
    /// Products, purchases, returns, vouchers and companies.
    ManageInventory,
    ExportReports,
    DeleteRecords,
    ManageUsers,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::RecordSales => "record sales",
            Permission::ManageInventory => "manage inventory",
            Permission::ExportReports => "export reports",
            Permission::DeleteRecords => "delete records",
            Permission::ManageUsers => "manage users",
        }
    }
}

impl Role {
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Staff => 1,
            Role::Guest => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Guest => "guest",
        }
    }

    /// Each role inherits everything the role below it may do.
    pub fn can(&self, permission: Permission) -> bool {
        let required = match permission {
            Permission::View => Role::Guest,
            Permission::RecordSales => Role::Staff,
            Permission::ManageInventory | Permission::ExportReports => Role::Manager,
            Permission::DeleteRecords | Permission::ManageUsers => Role::Admin,
        };
        self.rank() >= required.rank()
    }

    /// Like [`Role::can`] but as an error.
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: self.as_str().to_string(),
                action: permission.as_str().to_string(),
            })
        }
    }

    /// Whether a user with this role may create or edit a user holding
    /// `other`. Admins only manage roles ranked below admin.
    pub fn can_manage(&self, other: Role) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::Admin => other.rank() < Role::Admin.rank(),
            _ => false,
        }
    }
}

// =============================================================================
// User Profile
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip, default)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Payload creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserInput {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    pub password: String,
}

/// Edit payload: role, active flag and display name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl UserInput {
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_email(&self.email)?;
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::required("full name").into());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::invalid(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            )
            .into());
        }
        Ok(())
    }
}

impl UserProfile {
    /// Builds a profile from validated input and a precomputed hash.
    pub fn from_input(
        id: String,
        input: &UserInput,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        input.validate()?;
        Ok(UserProfile {
            id,
            email: input.email.trim().to_lowercase(),
            full_name: input.full_name.trim().to_string(),
            role: input.role,
            is_active: true,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: &UserUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(name) = &update.full_name {
            if name.trim().is_empty() {
                return Err(ValidationError::required("full name").into());
            }
            self.full_name = name.trim().to_string();
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Guest.can(Permission::View));
        assert!(!Role::Guest.can(Permission::RecordSales));

        assert!(Role::Staff.can(Permission::RecordSales));
        assert!(!Role::Staff.can(Permission::ManageInventory));

        assert!(Role::Manager.can(Permission::ManageInventory));
        assert!(Role::Manager.can(Permission::ExportReports));
        assert!(!Role::Manager.can(Permission::DeleteRecords));

        assert!(Role::Admin.can(Permission::DeleteRecords));
        assert!(Role::Admin.can(Permission::ManageUsers));
        assert!(Role::SuperAdmin.can(Permission::ManageUsers));
    }

    #[test]
    fn test_require_reports_role_and_action() {
        let err = Role::Staff.require(Permission::DeleteRecords).unwrap_err();
        assert_eq!(err.to_string(), "Role staff is not permitted to delete records");
    }

    #[test]
    fn test_can_manage() {
        assert!(Role::SuperAdmin.can_manage(Role::Admin));
        assert!(Role::SuperAdmin.can_manage(Role::SuperAdmin));
        assert!(Role::Admin.can_manage(Role::Manager));
        assert!(!Role::Admin.can_manage(Role::Admin));
        assert!(!Role::Admin.can_manage(Role::SuperAdmin));
        assert!(!Role::Manager.can_manage(Role::Staff));
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let input = UserInput {
            email: " Owner@Shop.Example ".to_string(),
            full_name: "Shop Owner".to_string(),
            role: Role::Admin,
            password: "long-enough".to_string(),
        };
        let user =
            UserProfile::from_input("u1".to_string(), &input, "$argon2id$...".to_string(), Utc::now())
                .unwrap();
        assert_eq!(user.email, "owner@shop.example");

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_short_password_rejected() {
        let input = UserInput {
            email: "owner@shop.example".to_string(),
            full_name: "Shop Owner".to_string(),
            role: Role::Staff,
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
