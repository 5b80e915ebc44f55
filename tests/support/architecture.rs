use std::fs;
use std::path::{Path, PathBuf};

/// One source line matching a pattern.
#[derive(Debug)]
pub struct Hit {
    pub file: String,
    pub line: usize,
    pub text: String,
}

fn crate_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Every `.rs` file below `dir`, sorted, walked without recursion.
fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    let mut pending = vec![dir.to_path_buf()];
    let mut sources = Vec::new();

    while let Some(next) = pending.pop() {
        let listing = fs::read_dir(&next)
            .unwrap_or_else(|e| panic!("cannot list {}: {e}", next.display()));
        for entry in listing.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                sources.push(path);
            }
        }
    }

    sources.sort();
    sources
}

/// Lines under `relative_dir` containing any of `patterns`.
pub fn find_lines_containing(relative_dir: &str, patterns: &[&str]) -> Vec<Hit> {
    let root = crate_root();
    rust_sources(&root.join(relative_dir))
        .into_iter()
        .flat_map(|path| {
            let source = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
            let file = path
                .strip_prefix(&root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            source
                .lines()
                .enumerate()
                .filter(|(_, text)| patterns.iter().any(|p| text.contains(p)))
                .map(|(idx, text)| Hit {
                    file: file.clone(),
                    line: idx + 1,
                    text: text.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn path_exists(relative_path: &str) -> bool {
    crate_root().join(relative_path).exists()
}
