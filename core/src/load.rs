use crate::{Index, Package};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reads package records from a `.json` file (one object or an array), a
/// `.jsonl` file (one object per line), or every such file under a directory.
pub fn load_packages<P: AsRef<Path>>(path: P) -> Result<Vec<Package>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        anyhow::bail!("no such corpus: {}", path.display());
    }

    let mut packages = Vec::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            read_jsonl(&file, &mut packages)?;
        } else {
            read_json(&file, &mut packages)?;
        }
    }
    Ok(packages)
}

/// Loads every record under `path` into `index`. Returns how many were put.
pub fn load_into<P: AsRef<Path>>(index: &Index, path: P) -> Result<usize> {
    let packages = load_packages(path)?;
    let count = packages.len();
    for pkg in packages {
        let import_path = pkg.import_path.clone();
        index.put(pkg).with_context(|| format!("put {import_path:?}"))?;
    }
    tracing::info!(count, "loaded corpus");
    Ok(count)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, out: &mut Vec<Package>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("open {}", file.display()))?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let pkg: Package = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(pkg);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<Package>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("open {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parse {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => anyhow::bail!("{}: expected an object or an array of objects", file.display()),
    }
    Ok(())
}
