//! Path-table normalization and on-disk resolution.

use std::path::{Path, PathBuf};

use crate::catalog::FilePath;
use crate::codec::ChunkType;
use crate::config::LoaderConfig;

/// Forward slashes, surrounding whitespace trimmed, `default_extension`
/// appended when the final component has none.
pub fn normalize(path: &str, default_extension: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    let file_name = normalized.rsplit('/').next().unwrap_or_default();
    let needs_extension = !file_name.is_empty() && !file_name.contains('.');
    if needs_extension && !default_extension.is_empty() {
        normalized.push('.');
        normalized.push_str(default_extension);
    }
    normalized
}

/// The level's path table, normalized, plus the default effect catalogs when
/// no globals file is listed and injection is enabled.
pub fn effective_paths(listed: &[FilePath], config: &LoaderConfig) -> Vec<FilePath> {
    let mut paths: Vec<FilePath> = listed
        .iter()
        .map(|entry| FilePath {
            path: normalize(&entry.path, &config.default_extension),
            ..entry.clone()
        })
        .collect();

    let has_globals = paths.iter().any(|p| p.chunk_type == Some(ChunkType::Globals));
    if config.inject_default_paths && !has_globals {
        let defaults = [
            (ChunkType::Effects, &config.effects_path),
            (ChunkType::EffectElements, &config.effect_elements_path),
        ];
        for (chunk_type, path) in defaults {
            let path = normalize(path, &config.default_extension);
            if !paths.iter().any(|p| p.path.eq_ignore_ascii_case(&path)) {
                paths.push(FilePath::new(chunk_type, path));
            }
        }
    }
    paths
}

/// Locate a normalized relative path under `base_dir`.
///
/// With `case_insensitive`, a component that does not exist as written is
/// matched against the directory listing ignoring ASCII case.
pub fn resolve(base_dir: &Path, relative: &str, case_insensitive: bool) -> Option<PathBuf> {
    let exact = base_dir.join(relative);
    if exact.is_file() {
        return Some(exact);
    }
    if !case_insensitive {
        return None;
    }

    let mut current = base_dir.to_path_buf();
    for component in relative.split('/').filter(|c| !c.is_empty() && *c != ".") {
        let candidate = current.join(component);
        if candidate.exists() {
            current = candidate;
            continue;
        }
        let entry = std::fs::read_dir(&current).ok()?.flatten().find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(component))
        })?;
        current = entry.path();
    }
    current.is_file().then_some(current)
}
