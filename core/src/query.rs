use crate::fields::FieldIndexes;
use crate::{DocId, IndexError, PostingList, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// A parsed query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `all:` matches every package.
    All,
    /// `project:<root>`; the root may be empty.
    Project(String),
    /// `import:<path>`
    Import(String),
    /// Lower-cased free-text words, matched conjunctively.
    Terms(Vec<String>),
}

impl Query {
    pub fn parse(q: &str) -> Self {
        if q.starts_with("all:") {
            Query::All
        } else if let Some(root) = q.strip_prefix("project:") {
            Query::Project(root.to_string())
        } else if let Some(path) = q.strip_prefix("import:") {
            Query::Import(path.to_string())
        } else {
            Query::Terms(q.split_whitespace().map(str::to_lowercase).collect())
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Ascending import path.
    #[default]
    Path,
    /// Packages whose name equals more of the query words first, then by path.
    Relevance,
}

impl FromStr for SortMode {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(SortMode::Path),
            "relevance" => Ok(SortMode::Relevance),
            other => Err(IndexError::InvalidQuery(format!("unknown sort mode {other:?}"))),
        }
    }
}

/// Documents matched by a query, plus how many query words matched each by name.
#[derive(Debug, Default)]
pub struct Matches {
    pub ids: PostingList,
    pub name_hits: HashMap<DocId, usize>,
}

/// Evaluates `query` against the field indexes. Never fails.
pub fn evaluate(query: &Query, fields: &FieldIndexes, tokenizer: &dyn Tokenizer) -> Matches {
    let verbatim = |list: Option<&PostingList>| Matches { ids: list.cloned().unwrap_or_default(), ..Default::default() };
    match query {
        Query::All => verbatim(Some(fields.all())),
        Query::Project(root) => verbatim(fields.project(root)),
        Query::Import(path) => verbatim(fields.import(path)),
        Query::Terms(words) => evaluate_terms(words, fields, tokenizer),
    }
}

fn evaluate_terms(words: &[String], fields: &FieldIndexes, tokenizer: &dyn Tokenizer) -> Matches {
    let mut matches = Matches::default();
    if words.is_empty() {
        return matches;
    }

    let mut sets: Vec<PostingList> = Vec::with_capacity(words.len());
    for word in words {
        let set = word_matches(word, fields, tokenizer);
        if set.is_empty() {
            return matches;
        }
        sets.push(set);
    }
    sets.sort_by_key(PostingList::len);

    let mut sets = sets.into_iter();
    let mut acc = sets.next().unwrap_or_default();
    let mut scratch = PostingList::new();
    for set in sets {
        acc.intersect_into(&set, &mut scratch);
        std::mem::swap(&mut acc, &mut scratch);
        if acc.is_empty() {
            break;
        }
    }

    for word in words {
        if let Some(named) = fields.name(word) {
            for id in named {
                if acc.contains(id) {
                    *matches.name_hits.entry(id).or_insert(0) += 1;
                }
            }
        }
    }
    matches.ids = acc;
    matches
}

/// Name equality unioned with containment of every token the word yields.
fn word_matches(word: &str, fields: &FieldIndexes, tokenizer: &dyn Tokenizer) -> PostingList {
    let tokens = tokenizer.tokenize(word);
    let mut contained = PostingList::new();
    let mut scratch = PostingList::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(list) = fields.term(token) else {
            contained.clear();
            break;
        };
        if i == 0 {
            contained = list.clone();
        } else {
            contained.intersect_into(list, &mut scratch);
            std::mem::swap(&mut contained, &mut scratch);
        }
    }
    match fields.name(word) {
        Some(named) => {
            named.union_into(&contained, &mut scratch);
            scratch
        }
        None => contained,
    }
}
