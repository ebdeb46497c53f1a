use crate::{DocId, Package, PostingList, Tokenizer};
use std::collections::{BTreeSet, HashMap};

/// Index keys one record contributes. Derived outside the index lock and
/// remembered per document so that retraction removes exactly these postings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldKeys {
    pub name: Option<String>,
    pub terms: BTreeSet<String>,
    pub imports: BTreeSet<String>,
    pub project: Option<String>,
}

impl FieldKeys {
    /// Directory placeholders yield no keys at all.
    pub fn derive(package: &Package, tokenizer: &dyn Tokenizer) -> Self {
        if package.is_directory() {
            return Self::default();
        }
        let mut terms = BTreeSet::new();
        for text in [&package.name, &package.synopsis, &package.doc] {
            terms.extend(tokenizer.tokenize(text));
        }
        Self {
            name: Some(package.name.to_lowercase()),
            terms,
            imports: package.imports.iter().cloned().collect(),
            project: Some(package.project_root.clone()),
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.project.is_none() && self.terms.is_empty() && self.imports.is_empty()
    }
}

/// The inverted indexes over stored records.
#[derive(Debug, Default)]
pub struct FieldIndexes {
    terms: HashMap<String, PostingList>,
    names: HashMap<String, PostingList>,
    imports: HashMap<String, PostingList>,
    projects: HashMap<String, PostingList>,
    all: PostingList,
    keys: HashMap<DocId, FieldKeys>,
}

fn post(map: &mut HashMap<String, PostingList>, key: &str, id: DocId) {
    match map.get_mut(key) {
        Some(list) => {
            list.add(id);
        }
        None => {
            let mut list = PostingList::new();
            list.add(id);
            map.insert(key.to_string(), list);
        }
    }
}

fn unpost(map: &mut HashMap<String, PostingList>, key: &str, id: DocId) {
    if let Some(list) = map.get_mut(key) {
        list.remove(id);
        if list.is_empty() {
            map.remove(key);
        }
    }
}

impl FieldIndexes {
    pub fn new() -> Self { Self::default() }

    /// Adds `keys` for `id`. Any keys previously recorded for `id` are retracted first.
    pub fn add(&mut self, id: DocId, keys: FieldKeys) {
        self.retract(id);
        if keys.is_empty() {
            return;
        }
        for term in &keys.terms {
            post(&mut self.terms, term, id);
        }
        for import in &keys.imports {
            post(&mut self.imports, import, id);
        }
        if let Some(name) = &keys.name {
            post(&mut self.names, name, id);
        }
        if let Some(project) = &keys.project {
            post(&mut self.projects, project, id);
        }
        self.all.add(id);
        self.keys.insert(id, keys);
    }

    /// Removes every posting recorded for `id`. No-op for unknown ids.
    pub fn retract(&mut self, id: DocId) {
        let Some(keys) = self.keys.remove(&id) else { return };
        for term in &keys.terms {
            unpost(&mut self.terms, term, id);
        }
        for import in &keys.imports {
            unpost(&mut self.imports, import, id);
        }
        if let Some(name) = &keys.name {
            unpost(&mut self.names, name, id);
        }
        if let Some(project) = &keys.project {
            unpost(&mut self.projects, project, id);
        }
        self.all.remove(id);
    }

    pub fn term(&self, term: &str) -> Option<&PostingList> { self.terms.get(term) }

    pub fn name(&self, name: &str) -> Option<&PostingList> { self.names.get(name) }

    pub fn import(&self, path: &str) -> Option<&PostingList> { self.imports.get(path) }

    pub fn project(&self, root: &str) -> Option<&PostingList> { self.projects.get(root) }

    pub fn all(&self) -> &PostingList { &self.all }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn num_imports(&self) -> usize { self.imports.len() }

    pub fn num_projects(&self) -> usize { self.projects.len() }
}
