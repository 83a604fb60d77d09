//! The heap: sole owner of every object and array, the reverse-reference
//! index, and the cascade-delete algorithm (§2, §4.2–§4.4).

mod back_edge;
mod object;

pub use back_edge::BackEdge;
pub use object::Object;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use crate::registry::TypeRegistry;

/// The reserved type name for array objects (§3 "Array").
pub const ARRAY_TYPE: &str = "__array__";

/// A dense, monotonically-allocated, never-reused object identifier (§3).
/// Zero is reserved as "none" and is never handed out by [`Heap::alloc_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The restricted value a heap field or array slot may hold (§3, §9). Unlike
/// [`crate::Value`], this has no `Callable` variant — the heap never stores
/// functions.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapValue {
    Number(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Object(ObjectId),
}

impl HeapValue {
    fn object_id(&self) -> Option<ObjectId> {
        match self {
            HeapValue::Object(id) => Some(*id),
            _ => None,
        }
    }
}

pub struct Heap {
    objects: HashMap<ObjectId, Object>,
    reverse: HashMap<ObjectId, BTreeSet<BackEdge>>,
    registry: TypeRegistry,
    next_id: u64,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self { objects: HashMap::new(), reverse: HashMap::new(), registry: TypeRegistry::new(), next_id: 1 }
    }

    fn alloc_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    // ---- Type registry passthrough (§4.1) ----------------------------------

    pub fn define_type(&mut self, name: impl Into<String>, fields: Vec<(String, bool)>) {
        let name = name.into();
        log::debug!("define_type {}", name);
        self.registry.define_type(name, fields);
    }

    pub fn is_field_mandatory(&self, type_name: Option<&str>, field: &str) -> bool {
        self.registry.is_field_mandatory(type_name, field)
    }

    // ---- Allocation (§4.2) --------------------------------------------------

    pub fn create_object(&mut self, type_name: Option<String>, initial_fields: Vec<(String, HeapValue)>) -> ObjectId {
        let id = self.alloc_id();
        let mut object = Object::new(id, type_name);
        for (name, value) in initial_fields {
            if let Some(target) = value.object_id() {
                self.link(id, name.clone(), target);
            }
            object.fields.insert(name, value);
        }
        self.objects.insert(id, object);
        id
    }

    pub fn create_array(&mut self, elements: Vec<HeapValue>) -> ObjectId {
        let id = self.alloc_id();
        let mut object = Object::new(id, Some(ARRAY_TYPE.to_string()));
        let count = elements.len();
        for (index, value) in elements.into_iter().enumerate() {
            let name = index.to_string();
            if let Some(target) = value.object_id() {
                self.link(id, name.clone(), target);
            }
            object.fields.insert(name, value);
        }
        object.fields.insert("length".to_string(), HeapValue::Number(count as f64));
        self.objects.insert(id, object);
        id
    }

    pub fn get_field(&self, id: ObjectId, name: &str) -> HeapValue {
        match self.objects.get(&id) {
            Some(obj) => obj.field(name),
            None => HeapValue::Null,
        }
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Number of back-edges currently recorded against `id` (§3 "Reverse-reference index").
    /// Exposed for invariant checking (P1) rather than everyday interpreter use.
    pub fn back_edge_count(&self, id: ObjectId) -> usize {
        self.reverse.get(&id).map(BTreeSet::len).unwrap_or(0)
    }

    // ---- Mutation (§4.3) ------------------------------------------------

    /// The single mutating entry point for field writes (§4.3).
    pub fn set_field(&mut self, parent_id: ObjectId, name: &str, value: HeapValue, is_mandatory: bool) {
        if !self.objects.contains_key(&parent_id) {
            return;
        }

        let prev = self.objects.get(&parent_id).and_then(|o| o.fields.get(name).cloned());
        if let Some(prev_id) = prev.as_ref().and_then(HeapValue::object_id) {
            self.unlink(prev_id, parent_id, name);
        }

        if matches!(value, HeapValue::Null) && is_mandatory {
            log::debug!("cascade trigger: {:?}.{} set to null", parent_id, name);
            self.delete_cascade(parent_id);
            return;
        }

        if let Some(target) = value.object_id() {
            self.link(parent_id, name.to_string(), target);
        }
        if let Some(obj) = self.objects.get_mut(&parent_id) {
            obj.fields.insert(name.to_string(), value);
        }
    }

    // ---- Array mutation (§4.4) -------------------------------------------

    pub fn array_push(&mut self, id: ObjectId, value: HeapValue) {
        let index = match self.objects.get(&id) {
            Some(obj) => obj.length(),
            None => return,
        };
        self.array_set_index(id, index, value);
    }

    /// Backs index-assignment `arr[i] = v` (§4.4): writes the slot and, if
    /// `i` reaches or exceeds the current length, extends `length` to
    /// `i + 1` without filling any intermediate slots (§9 open question).
    pub fn array_set_index(&mut self, id: ObjectId, index: u64, value: HeapValue) {
        if !self.objects.contains_key(&id) {
            return;
        }
        // Arrays carry no registered type, so element writes are never mandatory.
        self.set_field(id, &index.to_string(), value, false);
        let current_len = self.objects.get(&id).map(Object::length).unwrap_or(0);
        if index + 1 > current_len {
            self.set_field(id, "length", HeapValue::Number((index + 1) as f64), false);
        }
    }

    // ---- Reverse index bookkeeping ----------------------------------------

    fn link(&mut self, parent: ObjectId, field: String, target: ObjectId) {
        self.reverse.entry(target).or_default().insert(BackEdge::new(parent, field));
    }

    fn unlink(&mut self, target: ObjectId, parent: ObjectId, field: &str) {
        if let Some(set) = self.reverse.get_mut(&target) {
            set.remove(&BackEdge::new(parent, field.to_string()));
        }
    }

    // ---- Cascade delete (§4.3 central algorithm) ---------------------------

    fn delete_cascade(&mut self, root: ObjectId) {
        let mut stack = vec![root];
        let mut visited = HashSet::new();

        while let Some(cur) = stack.pop() {
            if !visited.insert(cur) {
                continue;
            }
            if !self.objects.contains_key(&cur) {
                continue;
            }

            // 1. Propagate to parents through the reverse index.
            if let Some(edges) = self.reverse.remove(&cur) {
                for edge in edges {
                    let BackEdge { parent, field } = edge;
                    if let Some(parent_obj) = self.objects.get_mut(&parent) {
                        parent_obj.fields.insert(field.clone(), HeapValue::Null);
                    }
                    let mandatory = {
                        let type_name = self.objects.get(&parent).and_then(|o| o.type_name.as_deref());
                        self.registry.is_field_mandatory(type_name, &field)
                    };
                    if mandatory {
                        stack.push(parent);
                    }
                }
            }

            // 2. Sever outgoing links from `cur`.
            if let Some(obj) = self.objects.get(&cur) {
                let outgoing: Vec<(String, ObjectId)> =
                    obj.fields.iter().filter_map(|(f, v)| v.object_id().map(|c| (f.clone(), c))).collect();
                for (field, child) in outgoing {
                    self.unlink(child, cur, &field);
                }
            }

            // 3. Destroy `cur`.
            log::trace!("cascade delete {:?}", cur);
            self.objects.remove(&cur);
            self.reverse.remove(&cur);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(heap: &mut Heap, ty: &str, fields: &[(&str, HeapValue)]) -> ObjectId {
        let fields = fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        heap.create_object(Some(ty.to_string()), fields)
    }

    #[test]
    fn optional_cascade_scenario_1() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("id".into(), true), ("next".into(), false)]);
        let a = obj(&mut heap, "N", &[("id", HeapValue::Number(1.0))]);
        let b = obj(&mut heap, "N", &[("id", HeapValue::Number(2.0))]);
        heap.set_field(a, "next", HeapValue::Object(b), heap.is_field_mandatory(Some("N"), "next"));
        heap.set_field(b, "id", HeapValue::Null, heap.is_field_mandatory(Some("N"), "id"));

        assert!(heap.is_live(a));
        assert_eq!(heap.get_field(a, "next"), HeapValue::Null);
        assert!(!heap.is_live(b));
    }

    #[test]
    fn mandatory_cascade_scenario_3() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("id".into(), true), ("next".into(), true)]);
        let a = obj(&mut heap, "N", &[("id", HeapValue::Number(1.0))]);
        let b = obj(&mut heap, "N", &[("id", HeapValue::Number(2.0))]);
        heap.set_field(a, "next", HeapValue::Object(b), true);
        heap.set_field(b, "id", HeapValue::Null, true);

        assert!(!heap.is_live(b));
        assert!(!heap.is_live(a));
    }

    #[test]
    fn mandatory_cycle_scenario_4() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("link".into(), true)]);
        let x = obj(&mut heap, "N", &[]);
        let y = obj(&mut heap, "N", &[]);
        heap.set_field(x, "link", HeapValue::Object(y), true);
        heap.set_field(y, "link", HeapValue::Object(x), true);

        heap.set_field(x, "link", HeapValue::Null, true);

        assert!(!heap.is_live(x));
        assert!(!heap.is_live(y));
    }

    #[test]
    fn array_element_cascade_scenario_5() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("id".into(), true)]);
        let a = obj(&mut heap, "N", &[("id", HeapValue::Number(1.0))]);
        let b = obj(&mut heap, "N", &[("id", HeapValue::Number(2.0))]);
        let arr = heap.create_array(vec![HeapValue::Object(a), HeapValue::Object(b)]);

        heap.set_field(a, "id", HeapValue::Null, true);

        assert!(!heap.is_live(a));
        assert!(heap.is_live(arr));
        assert_eq!(heap.get_field(arr, "0"), HeapValue::Null);
        assert_eq!(heap.get_field(arr, "length"), HeapValue::Number(2.0));
    }

    #[test]
    fn untyped_literal_never_cascades_scenario_6() {
        let mut heap = Heap::new();
        let o = heap.create_object(None, vec![("x".to_string(), HeapValue::Number(1.0))]);
        heap.set_field(o, "x", HeapValue::Null, heap.is_field_mandatory(None, "x"));
        assert!(heap.is_live(o));
        assert_eq!(heap.get_field(o, "x"), HeapValue::Null);
    }

    #[test]
    fn dead_parent_write_is_noop() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("id".into(), true)]);
        let a = obj(&mut heap, "N", &[("id", HeapValue::Number(1.0))]);
        heap.set_field(a, "id", HeapValue::Null, true);
        assert!(!heap.is_live(a));
        // Writing to a dead id must not panic and must remain a no-op.
        heap.set_field(a, "id", HeapValue::Number(5.0), true);
        assert!(!heap.is_live(a));
    }

    #[test]
    fn array_push_and_out_of_range_read() {
        let mut heap = Heap::new();
        let arr = heap.create_array(vec![]);
        heap.array_push(arr, HeapValue::Number(10.0));
        heap.array_push(arr, HeapValue::Number(20.0));
        assert_eq!(heap.get_field(arr, "0"), HeapValue::Number(10.0));
        assert_eq!(heap.get_field(arr, "1"), HeapValue::Number(20.0));
        assert_eq!(heap.get_field(arr, "length"), HeapValue::Number(2.0));
        assert_eq!(heap.get_field(arr, "5"), HeapValue::Null);
    }

    #[test]
    fn array_index_write_extends_length_without_filling_gaps() {
        let mut heap = Heap::new();
        let arr = heap.create_array(vec![]);
        heap.array_set_index(arr, 3, HeapValue::Number(1.0));
        assert_eq!(heap.get_field(arr, "length"), HeapValue::Number(4.0));
        assert_eq!(heap.get_field(arr, "0"), HeapValue::Null);
        assert_eq!(heap.get_field(arr, "3"), HeapValue::Number(1.0));
    }

    #[test]
    fn construction_with_missing_mandatory_field_does_not_cascade() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("id".into(), true)]);
        let a = heap.create_object(Some("N".to_string()), vec![]);
        assert!(heap.is_live(a));
        assert_eq!(heap.get_field(a, "id"), HeapValue::Null);
    }

    #[test]
    fn forward_reverse_symmetry_after_rewrite() {
        let mut heap = Heap::new();
        heap.define_type("N", vec![("ref".into(), false)]);
        let a = obj(&mut heap, "N", &[]);
        let b = obj(&mut heap, "N", &[]);
        let c = obj(&mut heap, "N", &[]);
        heap.set_field(a, "ref", HeapValue::Object(b), false);
        heap.set_field(a, "ref", HeapValue::Object(c), false);

        // b's back-edge from a must be gone; c's must be the sole entry.
        assert_eq!(heap.reverse.get(&b).map(|s| s.len()).unwrap_or(0), 0);
        let c_edges = heap.reverse.get(&c).expect("c has a back-edge");
        assert_eq!(c_edges.len(), 1);
        assert!(c_edges.contains(&BackEdge::new(a, "ref")));
    }
}
