use std::collections::HashMap;

use super::{HeapValue, ObjectId};

/// A live heap record (§3 "Object"). Field insertion order is irrelevant;
/// the spec only requires that keys be unique, which `HashMap` gives us.
#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub type_name: Option<String>,
    pub fields: HashMap<String, HeapValue>,
}

impl Object {
    pub fn new(id: ObjectId, type_name: Option<String>) -> Self {
        Self { id, type_name, fields: HashMap::new() }
    }

    /// Out-of-range / absent field reads yield null (§3 "Array").
    pub fn field(&self, name: &str) -> HeapValue {
        self.fields.get(name).cloned().unwrap_or(HeapValue::Null)
    }

    pub fn is_array(&self) -> bool {
        self.type_name.as_deref() == Some(super::ARRAY_TYPE)
    }

    pub fn length(&self) -> u64 {
        match self.field("length") {
            HeapValue::Number(n) => n as u64,
            _ => 0,
        }
    }
}
