//! Type schema storage, logically inside the heap (§4.1).

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub mandatory: bool,
}

#[derive(Debug, Clone)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl TypeSchema {
    fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeSchema>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self { types: HashMap::new() }
    }

    /// Registers a schema. Redefinition replaces the prior schema; existing
    /// objects are unaffected, but subsequent mandatoriness checks use the
    /// latest schema (§4.1).
    pub fn define_type(&mut self, name: impl Into<String>, fields: Vec<(String, bool)>) {
        let name = name.into();
        let schema = TypeSchema {
            name: name.clone(),
            fields: fields.into_iter().map(|(name, mandatory)| FieldSchema { name, mandatory }).collect(),
        };
        self.types.insert(name, schema);
    }

    pub fn schema(&self, type_name: &str) -> Option<&TypeSchema> {
        self.types.get(type_name)
    }

    /// True iff `type_name` is registered, `field` exists on it, and its
    /// optional flag is false. An untyped object (`type_name` absent) has no
    /// mandatory fields.
    pub fn is_field_mandatory(&self, type_name: Option<&str>, field: &str) -> bool {
        type_name
            .and_then(|name| self.types.get(name))
            .and_then(|schema| schema.field(field))
            .map(|f| f.mandatory)
            .unwrap_or(false)
    }
}
