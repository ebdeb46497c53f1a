use crate::fields::{FieldIndexes, FieldKeys};
use crate::query::{self, Query, SortMode};
use crate::store::DocumentStore;
use crate::{hierarchy, IndexError, Package, Result, Tokenizer, WordTokenizer};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    store: DocumentStore,
    fields: FieldIndexes,
}

/// The package index. Store and field indexes sit behind one readers-writer
/// lock, so every read sees either all or none of a write.
///
/// Build one at startup and share it as `Arc<Index>`.
pub struct Index {
    tokenizer: Box<dyn Tokenizer>,
    inner: RwLock<Inner>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Stored records, directory placeholders included.
    pub documents: usize,
    /// Records listed by `all:`.
    pub packages: usize,
    pub terms: usize,
    pub imports: usize,
    pub projects: usize,
}

impl Default for Index {
    fn default() -> Self { Self::new() }
}

impl Index {
    pub fn new() -> Self { Self::with_tokenizer(WordTokenizer) }

    pub fn with_tokenizer<T: Tokenizer + 'static>(tokenizer: T) -> Self {
        Self { tokenizer: Box::new(tokenizer), inner: RwLock::new(Inner::default()) }
    }

    /// Stores `package`, replacing any record with the same import path.
    pub fn put(&self, package: Package) -> Result<()> {
        if package.import_path.is_empty() {
            return Err(IndexError::InvalidArgument("empty import path".into()));
        }
        let keys = FieldKeys::derive(&package, self.tokenizer.as_ref());
        let package = Arc::new(package);

        let mut inner = self.inner.write();
        let (id, old) = inner.store.insert(Arc::clone(&package));
        inner.fields.add(id, keys);
        drop(inner);

        tracing::debug!(import_path = %package.import_path, doc_id = id, replaced = old.is_some(), "put package");
        Ok(())
    }

    /// Stores every package under one write lock. If any record has an empty
    /// import path nothing is stored. Returns how many were put.
    pub fn put_all(&self, packages: Vec<Package>) -> Result<usize> {
        if let Some(pos) = packages.iter().position(|p| p.import_path.is_empty()) {
            return Err(IndexError::InvalidArgument(format!("empty import path in record {pos}")));
        }
        let prepared: Vec<(FieldKeys, Arc<Package>)> = packages
            .into_iter()
            .map(|pkg| (FieldKeys::derive(&pkg, self.tokenizer.as_ref()), Arc::new(pkg)))
            .collect();
        let count = prepared.len();

        let mut inner = self.inner.write();
        for (keys, package) in prepared {
            let (id, _) = inner.store.insert(package);
            inner.fields.add(id, keys);
        }
        drop(inner);

        tracing::debug!(count, "put batch");
        Ok(count)
    }

    /// Removes the record for `path`. Returns whether one was stored.
    pub fn remove(&self, path: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some((id, _)) = inner.store.remove(path) else { return Ok(false) };
        inner.fields.retract(id);
        drop(inner);

        tracing::debug!(import_path = path, doc_id = id, "removed package");
        Ok(true)
    }

    pub fn get(&self, path: &str) -> Result<Arc<Package>> {
        self.inner
            .read()
            .store
            .get(path)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(path.to_string()))
    }

    /// Runs `q` (`all:`, `project:<root>`, `import:<path>` or free text).
    pub fn query(&self, q: &str, sort: SortMode) -> Result<Vec<Arc<Package>>> {
        let parsed = Query::parse(q);
        let inner = self.inner.read();
        let matches = query::evaluate(&parsed, &inner.fields, self.tokenizer.as_ref());
        let mut hits: Vec<(usize, Arc<Package>)> = matches
            .ids
            .iter()
            .filter_map(|id| {
                let pkg = inner.store.doc(id)?;
                Some((matches.name_hits.get(&id).copied().unwrap_or(0), Arc::clone(pkg)))
            })
            .collect();
        drop(inner);

        match sort {
            SortMode::Path => hits.sort_by(|a, b| a.1.import_path.cmp(&b.1.import_path)),
            SortMode::Relevance => {
                hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.import_path.cmp(&b.1.import_path)))
            }
        }
        tracing::trace!(query = q, hits = hits.len(), "query evaluated");
        Ok(hits.into_iter().map(|(_, pkg)| pkg).collect())
    }

    /// Like [`Index::query`], for query text taken straight off a transport.
    pub fn query_bytes(&self, q: &[u8], sort: SortMode) -> Result<Vec<Arc<Package>>> {
        let q = std::str::from_utf8(q).map_err(|e| IndexError::InvalidQuery(e.to_string()))?;
        self.query(q, sort)
    }

    /// Nearest packages below `path`, sorted by path. Empty for unknown paths.
    pub fn subdirs(&self, path: &str) -> Result<Vec<Arc<Package>>> {
        Ok(hierarchy::subdirs(&self.inner.read().store, path))
    }

    pub fn len(&self) -> usize { self.inner.read().store.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        IndexStats {
            documents: inner.store.len(),
            packages: inner.fields.all().len(),
            terms: inner.fields.num_terms(),
            imports: inner.fields.num_imports(),
            projects: inner.fields.num_projects(),
        }
    }
}
