use std::collections::HashSet;

use anyhow::{Result, bail};

use super::{DefaultValue, FieldType, TableSchema, roles, tables};

/// Tables in dependency order: a table only references tables listed before it.
static TABLES: [&TableSchema; 6] = [
    &tables::USER,
    &tables::TOKEN,
    &tables::CATEGORY,
    &tables::EQUIPMENT,
    &tables::CLIENT,
    &tables::HIRE_REQUEST,
];

pub fn tables() -> &'static [&'static TableSchema] {
    &TABLES
}

pub fn table(name: &str) -> Option<&'static TableSchema> {
    TABLES.iter().copied().find(|table| table.name == name)
}

/// Checks the structural invariants every descriptor must hold.
pub fn validate() -> Result<()> {
    let mut errors: Vec<String> = Vec::new();
    let mut seen_tables: HashSet<&str> = HashSet::new();

    for table in tables() {
        if !seen_tables.insert(table.name) {
            errors.push(format!("table {} is declared twice", table.name));
        }

        match table.fields.first() {
            Some(field) if field.field_type == FieldType::PrimaryKey && field.name == "id" => {}
            _ => errors.push(format!("{}: first field must be the `id` primary key", table.name)),
        }

        let mut seen_fields: HashSet<&str> = HashSet::new();
        for field in table.fields {
            let at = format!("{}.{}", table.name, field.name);
            if !seen_fields.insert(field.name) {
                errors.push(format!("{at} is declared twice"));
            }

            if let FieldType::ForeignKey(target) = field.field_type
                && !seen_tables.contains(target)
            {
                errors.push(format!("{at} references {target}, which is not declared before it"));
            }

            match (field.field_type, field.mapping) {
                (FieldType::Mapping, None) => errors.push(format!("{at} has no enum mapping")),
                (FieldType::Mapping, Some(mapping)) => {
                    if mapping.entries.is_empty() {
                        errors.push(format!("{at} has an empty enum mapping"));
                    }
                    for (expected, code) in mapping.codes().enumerate() {
                        if code != expected as i64 {
                            errors.push(format!(
                                "{at} codes must be dense from 0 (found {code} at position {expected})"
                            ));
                            break;
                        }
                    }
                    if let Some(DefaultValue::Integer(code)) = field.default
                        && !mapping.contains(code)
                    {
                        errors.push(format!("{at} default {code} is not a known code"));
                    }
                }
                (_, Some(_)) => errors.push(format!("{at} has a mapping but is not a mapping field")),
                _ => {}
            }
        }
    }

    for role in roles::roles() {
        for model in role.models {
            let Some(target) = table(model.table) else {
                errors.push(format!("role {} grants access to unknown table {}", role.name, model.table));
                continue;
            };
            for field in model.blacklist {
                if target.field(field).is_none() {
                    errors.push(format!("role {} blacklists unknown field {}.{field}", role.name, model.table));
                }
            }
            if let Some(scope) = model.owner {
                let owner_ok = target.field(scope.column).is_some()
                    && table(scope.table).is_some_and(|owner| owner.field(scope.user_column).is_some());
                if !owner_ok {
                    errors.push(format!(
                        "role {} scopes {} by {}.{} through an unknown column",
                        role.name, model.table, scope.table, scope.user_column
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid table descriptors:\n- {}", errors.join("\n- "))
}
