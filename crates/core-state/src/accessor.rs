//! Script-facing accessor: a declared set of symbols with defaults, scoped
//! under one key prefix. The manager never stores defaults — they live here,
//! which is what makes `clear_all` followed by a read through a fresh
//! accessor correctly observe the declared default again.

use crate::{StateManager, Value};
use core_errors::ShellError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AccessorDecl {
    pub description: String,
    pub default: Value,
}

pub struct StateAccessor {
    scope: String,
    manager: Arc<StateManager>,
    declared: BTreeMap<String, AccessorDecl>,
}

impl StateAccessor {
    pub fn new(manager: Arc<StateManager>, scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            manager,
            declared: BTreeMap::new(),
        }
    }

    pub fn declare(&mut self, symbol: impl Into<String>, description: impl Into<String>, default: Value) {
        self.declared.insert(
            symbol.into(),
            AccessorDecl {
                description: description.into(),
                default,
            },
        );
    }

    fn key(&self, symbol: &str) -> String {
        format!("{}:{}", self.scope, symbol)
    }

    pub fn get(&self, symbol: &str) -> Value {
        match self.manager.get(&self.key(symbol)) {
            Some(value) => value,
            None => self
                .declared
                .get(symbol)
                .map(|decl| decl.default.clone())
                .unwrap_or(Value::Null),
        }
    }

    pub fn set(&self, symbol: &str, value: Value) -> Result<(), ShellError> {
        self.manager.set(&self.key(symbol), value)
    }

    pub fn declarations(&self) -> &BTreeMap<String, AccessorDecl> {
        &self.declared
    }
}
