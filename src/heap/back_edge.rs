use super::ObjectId;

/// A single reverse reference: object `parent` holds `child`'s id in field
/// `field` (§3 "Reverse-reference index").
///
/// `Ord` is derived field-order (parent, then field), which is exactly the
/// deterministic enumeration order §9's open question recommends for cascade
/// processing: sorted by parent id, then field name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackEdge {
    pub parent: ObjectId,
    pub field: String,
}

impl BackEdge {
    pub fn new(parent: ObjectId, field: impl Into<String>) -> Self {
        Self { parent, field: field.into() }
    }
}
