// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-opcode source directory overrides.

use hashbrown::HashMap;

/// Maps opcode names to the directory their fragment is loaded from.
///
/// Opcodes without an entry fall back to a default directory chosen by the caller.
#[derive(Clone, Debug, Default)]
pub struct LocationMap {
    dirs: HashMap<String, String>,
}

impl LocationMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `dir` for `opcode`, returning the directory it replaces.
    pub fn set(&mut self, opcode: &str, dir: &str) -> Option<String> {
        self.dirs.insert(opcode.to_owned(), dir.to_owned())
    }

    /// The override for `opcode`, if any.
    #[must_use]
    pub fn get(&self, opcode: &str) -> Option<&str> {
        self.dirs.get(opcode).map(String::as_str)
    }

    /// The override for `opcode`, or `default`.
    #[must_use]
    pub fn resolve<'a>(&'a self, opcode: &str, default: &'a str) -> &'a str {
        self.get(opcode).unwrap_or(default)
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Returns `true` if no override was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::LocationMap;

    #[test]
    fn later_entry_overrides_earlier() {
        let mut m = LocationMap::new();
        assert_eq!(m.set("OP_NOP", "armv5te"), None);
        assert_eq!(m.set("OP_NOP", "armv6t2").as_deref(), Some("armv5te"));
        assert_eq!(m.get("OP_NOP"), Some("armv6t2"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let mut m = LocationMap::new();
        m.set("OP_MOVE", "c");
        assert_eq!(m.resolve("OP_MOVE", "armv5te"), "c");
        assert_eq!(m.resolve("OP_NOP", "armv5te"), "armv5te");
    }
}
