use serde::{Deserialize, Serialize};

use crate::schema::roles::{self, RoleDescriptor};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Client];
    /// Wire names of [`Role::ALL`], in the same order.
    pub const NAMES: [&'static str; 2] = [Role::ALL[0].as_str(), Role::ALL[1].as_str()];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }

    pub fn descriptor(&self) -> &'static RoleDescriptor {
        match self {
            Role::Admin => &roles::ADMIN,
            Role::Client => &roles::CLIENT,
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub expire_at: u64,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_string_roundtrip() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Client.as_str(), "client");

        assert_eq!(Role::try_from("admin"), Ok(Role::Admin));
        assert_eq!(Role::try_from("client"), Ok(Role::Client));
        assert!(Role::try_from("manager").is_err());
    }

    #[test]
    fn role_names_follow_all() {
        let names: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
        assert_eq!(names, Role::NAMES);
    }

    #[test]
    fn role_resolves_its_descriptor() {
        assert_eq!(Role::Admin.descriptor().name, "admin");
        assert_eq!(Role::Client.descriptor().name, "client");
    }
}
