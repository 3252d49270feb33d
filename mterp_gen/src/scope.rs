// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered substitution scopes for fragment expansion.
//!
//! Each `%include` gets a child [`Scope`] that sees every binding of its ancestors but writes only
//! to its own layer, so parameters passed to one include never leak into a sibling.

use core::fmt;
use std::collections::BTreeMap;

/// A substitution value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Text, substituted verbatim.
    Str(String),
    /// An integer, substituted in decimal.
    Int(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

/// One layer of placeholder bindings, chained to its parent.
#[derive(Clone, Debug, Default)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    local: BTreeMap<String, Value>,
}

impl Scope<'static> {
    /// Creates a scope with no parent.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }
}

impl<'p> Scope<'p> {
    /// Creates an empty layer on top of `self`.
    #[must_use]
    pub fn child(&self) -> Scope<'_> {
        Scope {
            parent: Some(self),
            local: BTreeMap::new(),
        }
    }

    /// Binds `key` in this layer, shadowing any ancestor binding.
    pub fn bind(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.local.insert(key.into(), value.into());
    }

    /// Builder form of [`Scope::bind`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(key, value);
        self
    }

    /// Binds `key` in this layer only if no layer binds it yet.
    ///
    /// Returns `true` if the default was inserted.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.local.insert(key, value.into());
        true
    }

    /// Looks `key` up through this layer and its ancestors.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut layer: Option<&Scope<'_>> = Some(self);
        while let Some(s) = layer {
            if let Some(v) = s.local.get(key) {
                return Some(v);
            }
            layer = s.parent;
        }
        None
    }

    /// Returns `true` if any layer binds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
