//! Git-ref collaborator, used by the `gitref` arg completer.
//! Failure of either subcommand is silent — an empty vector, never an error —
//! since an uncompletable prompt is worse than an unhelpful one.

use std::process::Command;

pub trait GitProvider: Send + Sync {
    fn branches(&self) -> Vec<String>;
    fn tags(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct SystemGitProvider;

impl SystemGitProvider {
    pub fn new() -> Self {
        Self
    }

    fn run(args: &[&str]) -> Vec<String> {
        Command::new("git")
            .args(args)
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| {
                String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GitProvider for SystemGitProvider {
    fn branches(&self) -> Vec<String> {
        Self::run(&["branch", "--format=%(refname:short)"])
    }

    fn tags(&self) -> Vec<String> {
        Self::run(&["tag", "--list"])
    }
}
