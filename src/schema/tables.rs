use crate::auth::Role;

use super::{
    CREATED_AT, DefaultValue, EnumMapping, FieldDescriptor, FieldType, ID, Rule, TableSchema,
    UPDATED_AT,
};

pub static USER_STATUS: EnumMapping =
    EnumMapping::new(&[(0, "Inactive"), (1, "Active"), (2, "Suspended")]);

pub static USER_VERIFY: EnumMapping = EnumMapping::new(&[(0, "Not Verified"), (1, "Verified")]);

pub static TOKEN_STATUS: EnumMapping = EnumMapping::new(&[(0, "Revoked"), (1, "Active")]);

pub static CATEGORY_STATUS: EnumMapping = EnumMapping::new(&[(0, "Hidden"), (1, "Visible")]);

pub static EQUIPMENT_AVAILABILITY: EnumMapping = EnumMapping::new(&[
    (0, "Available"),
    (1, "On Hire"),
    (2, "In Maintenance"),
    (3, "Retired"),
]);

pub static CLIENT_STATUS: EnumMapping =
    EnumMapping::new(&[(0, "Pending"), (1, "Active"), (2, "Suspended")]);

pub static HIRE_REQUEST_STATUS: EnumMapping = EnumMapping::new(&[
    (0, "Pending"),
    (1, "Failed"),
    (2, "Approved"),
    (3, "On Hire"),
    (4, "Completed"),
    (5, "Cancelled"),
]);

pub static USER: TableSchema = TableSchema {
    name: "user",
    label: "User",
    fields: &[
        ID,
        FieldDescriptor::new("email", "Email", FieldType::String)
            .rules(&[Rule::Required, Rule::Email, Rule::MaxLength(255)])
            .unique(),
        FieldDescriptor::new("password", "Password", FieldType::String)
            .rules(&[Rule::Required]),
        FieldDescriptor::new("role", "Role", FieldType::String)
            .rules(&[Rule::Required, Rule::OneOf(&Role::NAMES)])
            .default_value(DefaultValue::Text("client")),
        FieldDescriptor::new("first_name", "First Name", FieldType::String)
            .rules(&[Rule::MaxLength(100)]),
        FieldDescriptor::new("last_name", "Last Name", FieldType::String)
            .rules(&[Rule::MaxLength(100)]),
        FieldDescriptor::new("phone", "Phone", FieldType::String).rules(&[Rule::MaxLength(32)]),
        FieldDescriptor::new("status", "Status", FieldType::Integer)
            .mapping(&USER_STATUS)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(1)),
        FieldDescriptor::new("verify", "Verified", FieldType::Integer)
            .mapping(&USER_VERIFY)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(0)),
        FieldDescriptor::new("last_login_at", "Last Login", FieldType::Timestamp),
        CREATED_AT,
        UPDATED_AT,
    ],
};

pub static TOKEN: TableSchema = TableSchema {
    name: "token",
    label: "Token",
    fields: &[
        ID,
        FieldDescriptor::new("user_id", "User", FieldType::ForeignKey("user"))
            .rules(&[Rule::Required]),
        FieldDescriptor::new("token", "Token", FieldType::String)
            .rules(&[Rule::Required])
            .unique(),
        FieldDescriptor::new("expire_at", "Expires At", FieldType::Timestamp)
            .rules(&[Rule::Required]),
        FieldDescriptor::new("status", "Status", FieldType::Integer)
            .mapping(&TOKEN_STATUS)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(1)),
        CREATED_AT,
        UPDATED_AT,
    ],
};

pub static CATEGORY: TableSchema = TableSchema {
    name: "category",
    label: "Category",
    fields: &[
        ID,
        FieldDescriptor::new("name", "Name", FieldType::String)
            .rules(&[Rule::Required, Rule::MinLength(1), Rule::MaxLength(120)]),
        FieldDescriptor::new("description", "Description", FieldType::Text),
        FieldDescriptor::new("status", "Status", FieldType::Integer)
            .mapping(&CATEGORY_STATUS)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(1)),
        CREATED_AT,
        UPDATED_AT,
    ],
};

pub static EQUIPMENT: TableSchema = TableSchema {
    name: "equipment",
    label: "Equipment",
    fields: &[
        ID,
        FieldDescriptor::new("category_id", "Category", FieldType::ForeignKey("category"))
            .rules(&[Rule::Required]),
        FieldDescriptor::new("name", "Name", FieldType::String)
            .rules(&[Rule::Required, Rule::MinLength(1), Rule::MaxLength(160)]),
        FieldDescriptor::new("description", "Description", FieldType::Text),
        FieldDescriptor::new("daily_rate", "Daily Rate", FieldType::Decimal)
            .rules(&[Rule::Required, Rule::Min(0.0)]),
        FieldDescriptor::new("weekly_rate", "Weekly Rate", FieldType::Decimal)
            .rules(&[Rule::Required, Rule::Min(0.0)]),
        FieldDescriptor::new("purchase_cost", "Purchase Cost", FieldType::Decimal)
            .rules(&[Rule::Min(0.0)]),
        FieldDescriptor::new("availability", "Availability", FieldType::Integer)
            .mapping(&EQUIPMENT_AVAILABILITY)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(0)),
        FieldDescriptor::new("specs", "Specifications", FieldType::Json),
        CREATED_AT,
        UPDATED_AT,
    ],
};

pub static CLIENT: TableSchema = TableSchema {
    name: "client",
    label: "Client",
    fields: &[
        ID,
        FieldDescriptor::new("user_id", "User", FieldType::ForeignKey("user")),
        FieldDescriptor::new("company_name", "Company", FieldType::String)
            .rules(&[Rule::Required, Rule::MaxLength(200)]),
        FieldDescriptor::new("contact_name", "Contact", FieldType::String)
            .rules(&[Rule::Required, Rule::MaxLength(200)]),
        FieldDescriptor::new("email", "Email", FieldType::String)
            .rules(&[Rule::Required, Rule::Email]),
        FieldDescriptor::new("phone", "Phone", FieldType::String).rules(&[Rule::MaxLength(32)]),
        FieldDescriptor::new("address", "Address", FieldType::Text),
        FieldDescriptor::new("status", "Status", FieldType::Integer)
            .mapping(&CLIENT_STATUS)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(0)),
        CREATED_AT,
        UPDATED_AT,
    ],
};

pub static HIRE_REQUEST: TableSchema = TableSchema {
    name: "hire_request",
    label: "Hire Request",
    fields: &[
        ID,
        FieldDescriptor::new("client_id", "Client", FieldType::ForeignKey("client"))
            .rules(&[Rule::Required]),
        FieldDescriptor::new("equipment_id", "Equipment", FieldType::ForeignKey("equipment"))
            .rules(&[Rule::Required]),
        FieldDescriptor::new("start_date", "Start Date", FieldType::Timestamp)
            .rules(&[Rule::Required]),
        FieldDescriptor::new("end_date", "End Date", FieldType::Timestamp),
        FieldDescriptor::new("duration_weeks", "Duration (weeks)", FieldType::Integer)
            .rules(&[Rule::Required, Rule::Min(1.0), Rule::Max(520.0)]),
        FieldDescriptor::new("quoted_rate", "Quoted Rate", FieldType::Decimal)
            .rules(&[Rule::Min(0.0)]),
        FieldDescriptor::new("status", "Status", FieldType::Integer)
            .mapping(&HIRE_REQUEST_STATUS)
            .rules(&[Rule::Required])
            .default_value(DefaultValue::Integer(0)),
        FieldDescriptor::new("notes", "Notes", FieldType::Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};
