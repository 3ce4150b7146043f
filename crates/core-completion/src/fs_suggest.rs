//! Filesystem path completion. Scanning happens against the
//! tilde-expanded path; the text handed back to the prompt is built by
//! substituting the matched entry name into the user's original, unexpanded
//! fragment so a typed `~/proj` stays `~/proj...` rather than leaking the
//! absolute home directory into the line.

use crate::Suggestion;
use core_collab::FsProvider;
use std::path::{Path, PathBuf};

fn expand_tilde(p: &str) -> String {
    match p.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => format!("{}/{}", home.display(), rest),
            None => p.to_string(),
        },
        None => p.to_string(),
    }
}

fn scan_target(p: &str, expanded: &str, fs: &dyn FsProvider) -> (PathBuf, String) {
    if expanded == "/" {
        return (PathBuf::from("/"), String::new());
    }
    let expanded_path = Path::new(expanded);
    if fs.is_dir(expanded_path) && p.ends_with('/') {
        return (expanded_path.to_path_buf(), String::new());
    }
    let parent = expanded_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = expanded_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (parent.to_path_buf(), prefix)
}

pub(crate) fn fs_suggest(p: &str, fs: &dyn FsProvider) -> Vec<Suggestion> {
    if p == "~" {
        return vec![Suggestion {
            text: "~/".to_string(),
            description: String::new(),
        }];
    }

    let expanded = expand_tilde(p);
    let (dir_to_scan, prefix) = scan_target(p, &expanded, fs);
    let replacement_prefix = match p.rfind('/') {
        Some(idx) => &p[..=idx],
        None => "",
    };

    let entries = match fs.read_dir(&dir_to_scan) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut out = Vec::new();
    for entry in entries {
        let name = match entry.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if !prefix.is_empty() && !name.starts_with(&prefix) {
            continue;
        }
        let mut text = format!("{replacement_prefix}{name}");
        if fs.is_dir(&entry) {
            text.push('/');
        }
        out.push(Suggestion {
            text,
            description: String::new(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_fragment_lists_cwd_with_trailing_slashes_on_dirs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let fs = core_collab::StdFsProvider::new();

        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let mut got: Vec<String> = fs_suggest("", &fs).into_iter().map(|s| s.text).collect();
        std::env::set_current_dir(original).unwrap();

        got.sort();
        assert_eq!(got, vec!["a.txt".to_string(), "sub/".to_string()]);
    }

    #[test]
    fn bare_tilde_suggests_home_slash() {
        let fs = core_collab::StdFsProvider::new();
        let got = fs_suggest("~", &fs);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "~/");
    }

    #[test]
    fn directory_without_trailing_slash_suggests_itself() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foobar.txt"), "x").unwrap();
        let fs = core_collab::StdFsProvider::new();

        let fragment = dir.path().join("foo").to_string_lossy().into_owned();
        let got: Vec<String> = fs_suggest(&fragment, &fs).into_iter().map(|s| s.text).collect();
        assert!(got.iter().any(|t| t == &format!("{fragment}/")));
    }

    #[test]
    fn trailing_slash_descends_into_directory() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foo/inner.txt"), "x").unwrap();
        let fs = core_collab::StdFsProvider::new();

        let fragment = format!("{}/", dir.path().join("foo").to_string_lossy());
        let got: Vec<String> = fs_suggest(&fragment, &fs).into_iter().map(|s| s.text).collect();
        assert_eq!(got, vec![format!("{fragment}inner.txt")]);
    }
}
