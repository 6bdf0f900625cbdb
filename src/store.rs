use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

/// Replaces `path` with `contents` through a temp file in the same directory,
/// so readers see either the old or the new file, never a partial one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("write temp file for: {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("flush temp file for: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("rename temp file to final: {}", path.display()))?;
    Ok(())
}

pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut data = serde_json::to_vec_pretty(value).context("serialize json")?;
    data.push(b'\n');
    write_atomic(path, &data)
}

/// Lists the regular files of `dir` with the given extension, sorted by path.
pub fn list_files(dir: &Path, extension: Option<&str>) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let mut paths = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read dir: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("read dir entry: {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(extension) = extension
            && path.extension().and_then(|e| e.to_str()) != Some(extension)
        {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}
