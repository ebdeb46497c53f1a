use crate::{DocId, Package};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

/// Authoritative copy of every record, keyed by import path.
#[derive(Debug, Default)]
pub struct DocumentStore {
    ids: BTreeMap<String, DocId>,
    docs: HashMap<DocId, Arc<Package>>,
    next_id: DocId,
}

impl DocumentStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Stores `package`, reusing the id of its path if the path is already
    /// present. Returns the id and the record it replaced, if any.
    pub fn insert(&mut self, package: Arc<Package>) -> (DocId, Option<Arc<Package>>) {
        if let Some(&id) = self.ids.get(&package.import_path) {
            let old = self.docs.insert(id, package);
            return (id, old);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(package.import_path.clone(), id);
        self.docs.insert(id, package);
        (id, None)
    }

    pub fn id(&self, path: &str) -> Option<DocId> { self.ids.get(path).copied() }

    pub fn get(&self, path: &str) -> Option<&Arc<Package>> {
        self.ids.get(path).and_then(|id| self.docs.get(id))
    }

    pub fn doc(&self, id: DocId) -> Option<&Arc<Package>> { self.docs.get(&id) }

    pub fn remove(&mut self, path: &str) -> Option<(DocId, Arc<Package>)> {
        let id = self.ids.remove(path)?;
        self.docs.remove(&id).map(|pkg| (id, pkg))
    }

    /// Records whose import path starts with `prefix`, in path order.
    pub fn scan_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a Arc<Package>)> + 'a {
        self.ids
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(path, _)| path.starts_with(prefix))
            .filter_map(move |(path, id)| self.docs.get(id).map(|pkg| (path.as_str(), pkg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(path: &str, name: &str) -> Arc<Package> {
        Arc::new(Package { import_path: path.into(), name: name.into(), ..Default::default() })
    }

    #[test]
    fn replace_reuses_id() {
        let mut store = DocumentStore::new();
        let (a, old) = store.insert(pkg("a", "a"));
        assert!(old.is_none());
        let (b, old) = store.insert(pkg("a", "renamed"));
        assert_eq!(a, b);
        assert_eq!(old.unwrap().name, "a");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().name, "renamed");
    }

    #[test]
    fn ids_are_not_recycled() {
        let mut store = DocumentStore::new();
        let (a, _) = store.insert(pkg("a", "a"));
        assert_eq!(store.remove("a").map(|(id, _)| id), Some(a));
        assert!(store.remove("a").is_none());
        let (b, _) = store.insert(pkg("b", "b"));
        let (a2, _) = store.insert(pkg("a", "a"));
        assert_ne!(a, b);
        assert_ne!(a, a2);
        assert!(store.doc(a).is_none());
    }

    #[test]
    fn prefix_scan_is_bounded() {
        let mut store = DocumentStore::new();
        for path in ["example.com/src", "example.com/src/a", "example.com-x/b", "example.org/c", "example.com/src-b"] {
            store.insert(pkg(path, "p"));
        }
        let paths: Vec<&str> = store.scan_prefix("example.com/").map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["example.com/src", "example.com/src-b", "example.com/src/a"]);
    }
}
