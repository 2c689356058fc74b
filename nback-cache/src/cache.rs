use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
pub use string_cache::DefaultAtom as Atom;

struct Registry {
    ids: HashMap<Atom, usize>,
    atoms: Vec<Atom>,
}

lazy_static! {
    static ref REGISTRY: RwLock<Registry> = RwLock::new(Registry {
        ids: HashMap::new(),
        atoms: Vec::new(),
    });
}

/// Intern a label and return its stable id
pub fn intern_text(s: &str) -> usize {
    let atom = Atom::from(s);
    if let Some(&id) = REGISTRY.read().unwrap().ids.get(&atom) {
        return id;
    }
    let mut registry = REGISTRY.write().unwrap();
    // Another thread may have interned it between the two locks.
    if let Some(&id) = registry.ids.get(&atom) {
        return id;
    }
    let id = registry.atoms.len();
    registry.atoms.push(atom.clone());
    registry.ids.insert(atom, id);
    id
}

/// Look a label up by id
pub fn get_text(id: usize) -> Option<Atom> {
    REGISTRY.read().unwrap().atoms.get(id).cloned()
}

/// Current count of unique labels
pub fn text_count() -> usize {
    REGISTRY.read().unwrap().atoms.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let first = intern_text("Score: 1000001");
        let second = intern_text("Score: 1000001");
        assert_eq!(first, second);
    }

    #[test]
    fn ids_resolve_back_to_their_label() {
        let id = intern_text("interning-roundtrip-label");
        assert_eq!(get_text(id).as_deref(), Some("interning-roundtrip-label"));
    }

    #[test]
    fn unknown_ids_resolve_to_nothing() {
        assert_eq!(get_text(usize::MAX), None);
    }

    #[test]
    fn distinct_labels_get_distinct_ids() {
        let before = text_count();
        let a = intern_text("distinct-label-a");
        let b = intern_text("distinct-label-b");
        assert_ne!(a, b);
        assert!(text_count() >= before);
    }
}
