use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Restricts a role to rows whose `column` points at a row of `table`
/// carrying the caller's user id in `user_column`.
#[derive(Debug, Clone, Copy)]
pub struct OwnerScope {
    pub column: &'static str,
    pub table: &'static str,
    pub user_column: &'static str,
}

#[derive(Debug)]
pub struct ModelPermission {
    pub table: &'static str,
    pub operations: &'static [Operation],
    /// Never returned to this role and rejected when sent by it.
    pub blacklist: &'static [&'static str],
    pub owner: Option<OwnerScope>,
}

impl ModelPermission {
    pub fn allows(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn is_blacklisted(&self, field: &str) -> bool {
        self.blacklist.contains(&field)
    }

    pub fn strip(&self, row: &mut Map<String, JsonValue>) {
        for field in self.blacklist {
            row.remove(*field);
        }
    }
}

#[derive(Debug)]
pub struct RoleDescriptor {
    pub name: &'static str,
    pub routes: &'static [&'static str],
    pub models: &'static [ModelPermission],
}

impl RoleDescriptor {
    pub fn allows_route(&self, action: &str) -> bool {
        self.routes.contains(&action)
    }

    pub fn permission(&self, table: &str) -> Option<&'static ModelPermission> {
        self.models.iter().find(|model| model.table == table)
    }

    pub fn allows(&self, table: &str, operation: Operation) -> bool {
        self.models
            .iter()
            .any(|model| model.table == table && model.allows(operation))
    }
}

const READ_ONLY: &[Operation] = &[Operation::List, Operation::Get];

pub static ADMIN: RoleDescriptor = RoleDescriptor {
    name: "admin",
    routes: &["login", "profile", "refresh", "logout"],
    models: &[
        ModelPermission {
            table: "user",
            operations: &[
                Operation::List,
                Operation::Get,
                Operation::Update,
                Operation::Delete,
            ],
            blacklist: &["password"],
            owner: None,
        },
        ModelPermission {
            table: "token",
            operations: &[Operation::List, Operation::Get, Operation::Delete],
            blacklist: &["token"],
            owner: None,
        },
        ModelPermission {
            table: "category",
            operations: &Operation::ALL,
            blacklist: &[],
            owner: None,
        },
        ModelPermission {
            table: "equipment",
            operations: &Operation::ALL,
            blacklist: &[],
            owner: None,
        },
        ModelPermission {
            table: "client",
            operations: &Operation::ALL,
            blacklist: &[],
            owner: None,
        },
        ModelPermission {
            table: "hire_request",
            operations: &Operation::ALL,
            blacklist: &[],
            owner: None,
        },
    ],
};

pub static CLIENT: RoleDescriptor = RoleDescriptor {
    name: "client",
    routes: &["login", "register", "profile", "refresh", "logout"],
    models: &[
        ModelPermission {
            table: "category",
            operations: READ_ONLY,
            blacklist: &[],
            owner: None,
        },
        ModelPermission {
            table: "equipment",
            operations: READ_ONLY,
            blacklist: &["purchase_cost"],
            owner: None,
        },
        ModelPermission {
            table: "hire_request",
            operations: &[Operation::Create, Operation::List, Operation::Get],
            blacklist: &["quoted_rate"],
            owner: Some(OwnerScope {
                column: "client_id",
                table: "client",
                user_column: "user_id",
            }),
        },
    ],
};

static ROLES: [&RoleDescriptor; 2] = [&ADMIN, &CLIENT];

pub fn roles() -> &'static [&'static RoleDescriptor] {
    &ROLES
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::{ADMIN, CLIENT, Operation};

    #[test]
    fn client_cannot_write_catalogue_tables() {
        assert!(CLIENT.allows("equipment", Operation::List));
        assert!(!CLIENT.allows("equipment", Operation::Create));
        assert!(!CLIENT.allows("user", Operation::List));
        assert!(CLIENT.allows("hire_request", Operation::Create));
        assert!(!CLIENT.allows("hire_request", Operation::Delete));
    }

    #[test]
    fn admin_cannot_create_users_through_crud() {
        assert!(ADMIN.allows("user", Operation::Update));
        assert!(!ADMIN.allows("user", Operation::Create));
        assert!(ADMIN.allows("hire_request", Operation::Delete));
    }

    #[test]
    fn client_hire_requests_are_scoped_to_owned_clients() {
        let scope = CLIENT
            .permission("hire_request")
            .and_then(|permission| permission.owner)
            .expect("client hire requests are owner scoped");
        assert_eq!(scope.column, "client_id");
        assert_eq!(scope.table, "client");
        assert!(ADMIN.models.iter().all(|model| model.owner.is_none()));
    }

    #[test]
    fn register_is_client_only() {
        assert!(CLIENT.allows_route("register"));
        assert!(!ADMIN.allows_route("register"));
        assert!(ADMIN.allows_route("login"));
    }

    #[test]
    fn strip_removes_blacklisted_fields() {
        let permission = CLIENT.permission("equipment").expect("equipment permission");
        let mut row = Map::new();
        row.insert("name".to_string(), json!("Crane"));
        row.insert("purchase_cost".to_string(), json!(1000.0));

        permission.strip(&mut row);

        assert!(row.contains_key("name"));
        assert!(!row.contains_key("purchase_cost"));
    }
}
