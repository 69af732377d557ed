//! User and Admin Account Types
//!
//! Users and admins are persisted separately but resolve through a single
//! polymorphic [`Account`] so token verification has one lookup path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blood::BloodType;
use super::geo::{Coordinates, LocationInput};

/// Account role carried in signed tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A registered platform user, donor or recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub blood_type: BloodType,
    pub is_donor: bool,
    pub location: Option<Coordinates>,
    pub wilaya_code: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        full_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            full_name,
            phone: None,
            blood_type: BloodType::Unknown,
            is_donor: false,
            location: None,
            wilaya_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An administrator account (admin or superadmin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(username: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

/// Polymorphic account resolved from a token subject.
#[derive(Debug, Clone)]
pub enum Account {
    User(User),
    Admin(Admin),
}

impl Account {
    pub fn id(&self) -> Uuid {
        match self {
            Account::User(user) => user.id,
            Account::Admin(admin) => admin.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::User(_) => Role::User,
            Account::Admin(admin) => admin.role,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Account::User(user) => &user.username,
            Account::Admin(admin) => &admin.username,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::User(user) => &user.password_hash,
            Account::Admin(admin) => &admin.password_hash,
        }
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /auth/register
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub is_donor: Option<bool>,
    pub location: Option<LocationInput>,
    pub wilaya_code: Option<u32>,
}

/// POST /auth/login
///
/// Accepts `identifier`, or `email`/`username` from older clients.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

/// Response to POST /auth/login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: AccountResponse,
}

/// PUT /user/:id
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub is_donor: Option<bool>,
    pub location: Option<LocationInput>,
    pub wilaya_code: Option<u32>,
}

/// Public view of a user, never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub blood_type: BloodType,
    pub is_donor: bool,
    pub location: Option<Coordinates>,
    pub wilaya_code: Option<u32>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            blood_type: user.blood_type,
            is_donor: user.is_donor,
            location: user.location,
            wilaya_code: user.wilaya_code,
            role: Role::User,
            created_at: user.created_at,
        }
    }
}

/// Public view of an admin account.
#[derive(Debug, Clone, Serialize)]
pub struct AdminResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Admin> for AdminResponse {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            email: admin.email.clone(),
            role: admin.role,
            created_at: admin.created_at,
        }
    }
}

/// POST /admin/accounts
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Either account shape, serialized flat.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AccountResponse {
    User(UserResponse),
    Admin(AdminResponse),
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        match account {
            Account::User(user) => AccountResponse::User(user.into()),
            Account::Admin(admin) => AccountResponse::Admin(admin.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Admin, Role::Superadmin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_roles_are_admin() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::Superadmin.is_admin());
    }

    #[test]
    fn test_account_polymorphism() {
        let user = User::new(
            "amine".to_string(),
            "amine@example.com".to_string(),
            "hash".to_string(),
            "Amine B".to_string(),
        );
        let admin = Admin::new(
            "root".to_string(),
            "root@example.com".to_string(),
            "hash".to_string(),
            Role::Superadmin,
        );

        let user_account = Account::User(user.clone());
        assert_eq!(user_account.id(), user.id);
        assert_eq!(user_account.role(), Role::User);

        let admin_account = Account::Admin(admin.clone());
        assert_eq!(admin_account.id(), admin.id);
        assert_eq!(admin_account.role(), Role::Superadmin);
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User::new(
            "amine".to_string(),
            "amine@example.com".to_string(),
            "secret-hash".to_string(),
            "Amine B".to_string(),
        );
        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("amine@example.com"));
    }

    #[test]
    fn test_login_request_aliases() {
        let body: LoginRequest =
            serde_json::from_str(r#"{"email": "a@b.dz", "password": "pw"}"#).unwrap();
        assert_eq!(body.identifier, "a@b.dz");
    }
}
