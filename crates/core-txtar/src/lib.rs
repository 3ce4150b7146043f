//! Txtar packer with minimal-depth disambiguation.
//!
//! Packages a set of absolute file paths into a single archival stream,
//! choosing for each file the shortest path suffix that makes every name
//! unique within its basename collision group.

use core_errors::ShellError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// An unordered collection of absolute file paths, tracked in insertion
/// order so `list_paths` and archive emission are deterministic.
#[derive(Debug, Default)]
pub struct TxtarPacker {
    paths: Vec<PathBuf>,
}

impl TxtarPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an absolute file path. Duplicates are idempotent. Fails if
    /// `p` is not readable as a file.
    pub fn add_path(&mut self, p: PathBuf) -> Result<(), ShellError> {
        let meta = std::fs::metadata(&p)
            .map_err(|e| ShellError::io_failure(format!("stat {}", p.display()), e))?;
        if !meta.is_file() {
            return Err(ShellError::io_failure(
                format!("stat {}", p.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            ));
        }
        if !self.paths.contains(&p) {
            self.paths.push(p);
        }
        Ok(())
    }

    pub fn remove_path(&mut self, p: &Path) {
        self.paths.retain(|existing| existing != p);
    }

    /// Returns paths in insertion order.
    pub fn list_paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    /// Produce a txtar archive whose entries have unique, minimal-depth
    /// names (see module docs for the disambiguation algorithm).
    pub fn get_txtar_string(&self) -> Result<String, ShellError> {
        let names = unique_names(&self.paths);
        let mut out = String::new();
        for path in &self.paths {
            let name = names
                .get(path)
                .expect("unique_names covers every input path");
            let bytes = std::fs::read(path)
                .map_err(|e| ShellError::io_failure(format!("read {}", path.display()), e))?;
            out.push_str("-- ");
            out.push_str(name);
            out.push_str(" --\n");
            out.push_str(&String::from_utf8_lossy(&bytes));
            out.push('\n');
        }
        Ok(out)
    }
}

fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn suffix(comps: &[String], depth: usize) -> String {
    let depth = depth.min(comps.len());
    comps[comps.len() - depth..].join("/")
}

/// Assign every path the shortest `/`-joined suffix that disambiguates it
/// within its basename-collision group.
fn unique_names(paths: &[PathBuf]) -> HashMap<PathBuf, String> {
    let mut groups: HashMap<String, Vec<&PathBuf>> = HashMap::new();
    for p in paths {
        let base = p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        groups.entry(base).or_default().push(p);
    }

    let mut result = HashMap::with_capacity(paths.len());
    for group in groups.into_values() {
        if group.len() == 1 {
            let p = group[0];
            result.insert(p.clone(), segments(p).join("/"));
            continue;
        }

        let member_segments: Vec<Vec<String>> = group.iter().map(|p| segments(p)).collect();
        let mut chosen_depth = 0usize;
        for (idx, comps) in member_segments.iter().enumerate() {
            let max_d = comps.len().max(1);
            let mut depth = max_d; // full path is always unique among distinct paths
            if max_d >= 2 {
                for d in 2..=max_d {
                    let candidate = suffix(comps, d);
                    let collides = member_segments
                        .iter()
                        .enumerate()
                        .any(|(j, other)| j != idx && suffix(other, d) == candidate);
                    if !collides {
                        depth = d;
                        break;
                    }
                }
            }
            chosen_depth = chosen_depth.max(depth);
        }

        for (p, comps) in group.into_iter().zip(member_segments.into_iter()) {
            result.insert(p.clone(), suffix(&comps, chosen_depth));
        }
    }
    result
}
