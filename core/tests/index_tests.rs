use docdex_core::{Index, Package, SortMode};
use serde_json::json;
use std::sync::Arc;

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn test_packages() -> Vec<Package> {
    vec![
        Package {
            import_path: "strconv".into(),
            project_name: "Go".into(),
            name: "strconv".into(),
            synopsis: "Package strconv implements conversions to and from string representations of basic data types.".into(),
            doc: "Package strconv implements conversions to and from string representations\nof basic data types.".into(),
            imports: strings(&["errors", "math", "unicode/utf8"]),
            payload: json!({"funcs": [{}]}),
            ..Default::default()
        },
        Package {
            import_path: "github.com/garyburd/go-oauth/oauth".into(),
            project_root: "github.com/garyburd/go-oauth".into(),
            project_name: "go-oauth".into(),
            project_url: "https://github.com/garyburd/go-oauth/".into(),
            name: "oauth".into(),
            synopsis: "Package oauth implements a subset of the OAuth client interface as defined in RFC 5849.".into(),
            doc: "Package oauth implements a subset of the OAuth client interface as defined in RFC 5849.\n\n\
                  This package assumes that the application writes request URL paths to the\nnetwork using \
                  the encoding implemented by the net/url URL RequestURI method.\n\
                  The HTTP client in the standard net/http package uses this encoding."
                .into(),
            imports: strings(&[
                "bytes", "crypto/hmac", "crypto/rand", "crypto/sha1", "encoding/base64", "encoding/binary",
                "errors", "fmt", "io", "io/ioutil", "net/http", "net/url", "regexp", "sort", "strconv",
                "strings", "sync", "time",
            ]),
            test_imports: strings(&["bytes", "net/url", "testing"]),
            payload: json!({"funcs": [{}]}),
            ..Default::default()
        },
        Package {
            // empty directory
            import_path: "example.com/src".into(),
            project_root: "example.com".into(),
            project_name: "example".into(),
            ..Default::default()
        },
        Package {
            import_path: "example.com/src/a".into(),
            project_root: "example.com".into(),
            project_name: "example".into(),
            name: "a".into(),
            payload: json!({"funcs": [{}]}),
            ..Default::default()
        },
        Package {
            import_path: "example.com/src/b".into(),
            project_root: "example.com".into(),
            project_name: "example".into(),
            name: "b".into(),
            payload: json!({"funcs": [{}]}),
            ..Default::default()
        },
        Package {
            import_path: "github.com/example/noexports".into(),
            project_root: "github.com/exmaple/noexports".into(),
            project_name: "noexports".into(),
            name: "noexports".into(),
            ..Default::default()
        },
    ]
}

fn loaded() -> Index {
    let idx = Index::new();
    for pkg in test_packages() {
        idx.put(pkg).unwrap();
    }
    idx
}

fn paths(pkgs: &[Arc<Package>]) -> Vec<String> {
    pkgs.iter().map(|p| p.import_path.clone()).collect()
}

#[test]
fn get_returns_stored_record() {
    let idx = loaded();
    for pkg in test_packages() {
        let got = idx.get(&pkg.import_path).unwrap();
        assert_eq!(*got, pkg, "get({:?})", pkg.import_path);
    }
}

#[test]
fn queries() {
    let idx = loaded();
    let cases: &[(&str, &[&str])] = &[
        ("strconv", &["strconv"]),
        ("project:", &["strconv"]),
        ("project:github.com/garyburd/go-oauth", &["github.com/garyburd/go-oauth/oauth"]),
        ("import:bytes", &["github.com/garyburd/go-oauth/oauth"]),
        ("oauth", &["github.com/garyburd/go-oauth/oauth"]),
        (
            "all:",
            &[
                "example.com/src/a",
                "example.com/src/b",
                "github.com/example/noexports",
                "github.com/garyburd/go-oauth/oauth",
                "strconv",
            ],
        ),
        ("", &[]),
        ("import:testing", &[]),
        ("project:nowhere", &[]),
    ];
    for (q, want) in cases {
        let got = idx.query(q, SortMode::Path).unwrap();
        assert_eq!(paths(&got), strings(want), "query({q:?})");
    }
}

#[test]
fn two_terms_intersect() {
    let idx = loaded();
    let implements = paths(&idx.query("implements", SortMode::Path).unwrap());
    assert_eq!(implements, strings(&["github.com/garyburd/go-oauth/oauth", "strconv"]));
    let rfc = paths(&idx.query("rfc", SortMode::Path).unwrap());
    assert_eq!(rfc, strings(&["github.com/garyburd/go-oauth/oauth"]));
    let both = paths(&idx.query("implements RFC", SortMode::Path).unwrap());
    assert_eq!(both, rfc);
    assert!(idx.query("strconv oauth", SortMode::Path).unwrap().is_empty());
}

#[test]
fn subdirs() {
    let idx = loaded();
    let cases: &[(&str, &[&str])] = &[
        ("example.com", &["example.com/src/a", "example.com/src/b"]),
        ("notfound.com", &[]),
        ("notfound.com/path", &[]),
    ];
    for (path, want) in cases {
        assert_eq!(paths(&idx.subdirs(path).unwrap()), strings(want), "subdirs({path:?})");
    }
}

#[test]
fn replace_moves_every_field() {
    let idx = loaded();
    let mut moved = test_packages().remove(1);
    moved.project_root = "github.com/other/oauth".into();
    moved.name = "oauth2".into();
    moved.synopsis = "Package oauth2 provides tokens.".into();
    moved.doc = String::new();
    moved.imports = strings(&["context"]);
    idx.put(moved.clone()).unwrap();

    assert!(idx.query("import:bytes", SortMode::Path).unwrap().is_empty());
    assert!(idx.query("project:github.com/garyburd/go-oauth", SortMode::Path).unwrap().is_empty());
    assert!(idx.query("rfc", SortMode::Path).unwrap().is_empty());
    assert!(idx.query("oauth", SortMode::Path).unwrap().is_empty());

    let want = strings(&[moved.import_path.as_str()]);
    assert_eq!(paths(&idx.query("import:context", SortMode::Path).unwrap()), want);
    assert_eq!(paths(&idx.query("project:github.com/other/oauth", SortMode::Path).unwrap()), want);
    assert_eq!(paths(&idx.query("tokens", SortMode::Path).unwrap()), want);
    assert_eq!(paths(&idx.query("OAuth2", SortMode::Path).unwrap()), want);
    assert_eq!(*idx.get(&moved.import_path).unwrap(), moved);
    assert_eq!(idx.query("all:", SortMode::Path).unwrap().len(), 5);
}

#[test]
fn package_replaced_by_directory_leaves_listings() {
    let idx = loaded();
    idx.put(Package { import_path: "example.com/src/a".into(), project_root: "example.com".into(), ..Default::default() })
        .unwrap();
    assert_eq!(paths(&idx.subdirs("example.com").unwrap()), strings(&["example.com/src/b"]));
    assert!(!paths(&idx.query("all:", SortMode::Path).unwrap()).contains(&"example.com/src/a".to_string()));
    assert!(idx.get("example.com/src/a").unwrap().is_directory());
}

#[test]
fn empty_index_answers_empty() {
    let idx = Index::new();
    assert!(idx.query("all:", SortMode::Path).unwrap().is_empty());
    assert!(idx.query("anything", SortMode::Relevance).unwrap().is_empty());
    assert!(idx.subdirs("example.com").unwrap().is_empty());
}
