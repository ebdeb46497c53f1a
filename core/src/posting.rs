use crate::DocId;
use std::cmp::Ordering;

/// Sorted, duplicate-free list of document ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    ids: Vec<DocId>,
}

impl PostingList {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn as_slice(&self) -> &[DocId] { &self.ids }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ { self.ids.iter().copied() }

    pub fn contains(&self, id: DocId) -> bool { self.ids.binary_search(&id).is_ok() }

    pub fn clear(&mut self) { self.ids.clear() }

    /// Inserts `id` at its sorted position. Returns false if it was already present.
    pub fn add(&mut self, id: DocId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            }
        }
    }

    /// Removes `id`. Returns false if it was absent.
    pub fn remove(&mut self, id: DocId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                self.ids.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Writes `self ∩ other` into `dst`, replacing its contents. Single merge pass.
    pub fn intersect_into(&self, other: &PostingList, dst: &mut PostingList) {
        dst.ids.clear();
        let (a, b) = (&self.ids, &other.ids);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    dst.ids.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
    }

    /// Writes `self ∪ other` into `dst`, replacing its contents.
    pub fn union_into(&self, other: &PostingList, dst: &mut PostingList) {
        dst.ids.clear();
        dst.ids.reserve(self.ids.len().max(other.ids.len()));
        let (a, b) = (&self.ids, &other.ids);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    dst.ids.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    dst.ids.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    dst.ids.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        dst.ids.extend_from_slice(&a[i..]);
        dst.ids.extend_from_slice(&b[j..]);
    }
}

impl FromIterator<DocId> for PostingList {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        let mut ids: Vec<DocId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = DocId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, DocId>>;

    fn into_iter(self) -> Self::IntoIter { self.ids.iter().copied() }
}
