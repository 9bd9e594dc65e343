//! Declarative table descriptors.
//!
//! Every table is a `'static` [`TableSchema`]: an ordered list of
//! [`FieldDescriptor`]s, some of which carry an [`EnumMapping`] from small
//! integer codes to display labels. The repository, the CRUD service, the DDL
//! sync and the admin record view are all driven from these values.

pub mod ddl;
pub mod registry;
pub mod roles;
pub mod tables;

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    PrimaryKey,
    /// Holds the id of a row in the named table.
    ForeignKey(&'static str),
    Integer,
    String,
    Text,
    Boolean,
    Timestamp,
    Json,
    Decimal,
    Mapping,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    /// Text must equal one of the listed values.
    OneOf(&'static [&'static str]),
    Min(f64),
    Max(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Boolean(bool),
    Text(&'static str),
    Now,
}

/// Fixed `code -> label` table. Codes are dense and start at 0.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumMapping {
    pub entries: &'static [(i64, &'static str)],
}

impl EnumMapping {
    pub const fn new(entries: &'static [(i64, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(_, label)| *label)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.label(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(code, _)| *code)
    }

    /// Label for a known integer code; any other value is returned unchanged.
    pub fn transform(&self, value: &JsonValue) -> JsonValue {
        match value.as_i64().and_then(|code| self.label(code)) {
            Some(label) => JsonValue::String(label.to_string()),
            None => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub field_type: FieldType,
    pub rules: &'static [Rule],
    pub default: Option<DefaultValue>,
    pub mapping: Option<&'static EnumMapping>,
    pub unique: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            label,
            field_type,
            rules: &[],
            default: None,
            mapping: None,
            unique: false,
        }
    }

    pub const fn rules(self, rules: &'static [Rule]) -> Self {
        Self { rules, ..self }
    }

    pub const fn default_value(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn mapping(self, mapping: &'static EnumMapping) -> Self {
        Self {
            field_type: FieldType::Mapping,
            mapping: Some(mapping),
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Managed by the repository; clients never write these.
    pub fn is_read_only(&self) -> bool {
        matches!(self.field_type, FieldType::PrimaryKey)
            || self.name == CREATED_AT.name
            || self.name == UPDATED_AT.name
    }
}

pub const ID: FieldDescriptor =
    FieldDescriptor::new("id", "ID", FieldType::PrimaryKey).rules(&[Rule::Required]);

pub const CREATED_AT: FieldDescriptor = FieldDescriptor::new(
    "created_at",
    "Created At",
    FieldType::Timestamp,
)
.rules(&[Rule::Required])
.default_value(DefaultValue::Now);

pub const UPDATED_AT: FieldDescriptor = FieldDescriptor::new(
    "updated_at",
    "Updated At",
    FieldType::Timestamp,
)
.rules(&[Rule::Required])
.default_value(DefaultValue::Now);

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl TableSchema {
    pub fn schema(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn mapping(&self) -> BTreeMap<&'static str, &'static EnumMapping> {
        self.fields
            .iter()
            .filter_map(|field| field.mapping.map(|mapping| (field.name, mapping)))
            .collect()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.name)
    }

    /// Replaces every mapping code in `row` with its label.
    pub fn transform_row(&self, row: &mut Map<String, JsonValue>) {
        for (name, mapping) in self.mapping() {
            if let Some(value) = row.get_mut(name) {
                *value = mapping.transform(value);
            }
        }
    }
}
