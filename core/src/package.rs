use serde::{Deserialize, Serialize};

/// One crawled package, as produced by the documentation extractor.
///
/// Only the flat fields are indexed. `payload` holds the nested structural
/// data (functions, types, examples) and is stored and returned untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub import_path: String,
    pub project_root: String,
    pub project_name: String,
    pub project_url: String,
    pub name: String,
    pub synopsis: String,
    pub doc: String,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
    pub is_cmd: bool,
    pub payload: serde_json::Value,
}

impl Package {
    /// A record with no package name marks a directory that holds no package.
    pub fn is_directory(&self) -> bool {
        self.name.is_empty()
    }
}
