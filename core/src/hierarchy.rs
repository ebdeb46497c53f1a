use crate::store::DocumentStore;
use crate::Package;
use std::sync::Arc;

/// Immediate child packages of `parent`, in path order.
///
/// Directory placeholders are never returned. A package below a placeholder
/// counts as a child when every path between it and `parent` is a stored
/// placeholder.
pub(crate) fn subdirs(store: &DocumentStore, parent: &str) -> Vec<Arc<Package>> {
    let prefix = format!("{parent}/");
    store
        .scan_prefix(&prefix)
        .filter(|(path, pkg)| {
            let rest = &path[prefix.len()..];
            !rest.is_empty() && !pkg.is_directory() && only_placeholders_between(store, path, prefix.len(), rest)
        })
        .map(|(_, pkg)| Arc::clone(pkg))
        .collect()
}

fn only_placeholders_between(store: &DocumentStore, path: &str, base: usize, rest: &str) -> bool {
    rest.match_indices('/')
        .map(|(i, _)| &path[..base + i])
        .all(|ancestor| store.get(ancestor).is_some_and(|pkg| pkg.is_directory()))
}
