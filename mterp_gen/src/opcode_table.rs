// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed, index-ordered opcode sequence a dispatch table is built for.

use core::fmt;

use hashbrown::HashMap;

/// One opcode of an [`OpcodeTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Opcode<'a> {
    /// Position in the table; this is the value a running interpreter dispatches on.
    pub index: usize,
    /// Symbolic name, e.g. `OP_NOP`.
    pub name: &'a str,
}

/// Ordered, deduplicated opcode names indexed `0..len`.
///
/// Never empty.
#[derive(Clone, Debug)]
pub struct OpcodeTable {
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl OpcodeTable {
    /// Builds a table from `names` in index order.
    ///
    /// If `expected` is `Some(n)`, the table must hold exactly `n` opcodes.
    pub fn new(names: Vec<String>, expected: Option<usize>) -> Result<Self, OpcodeTableError> {
        if let Some(expected) = expected {
            if names.len() != expected {
                return Err(OpcodeTableError::Cardinality {
                    found: names.len(),
                    expected,
                });
            }
        }
        if names.is_empty() {
            return Err(OpcodeTableError::Empty);
        }

        let mut by_name = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if let Some(first) = by_name.insert(name.clone(), index) {
                return Err(OpcodeTableError::Duplicate {
                    name: name.clone(),
                    first,
                    second: index,
                });
            }
        }
        Ok(Self { names, by_name })
    }

    /// Number of opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the table has no opcodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the opcode at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Opcode<'_>> {
        self.names.get(index).map(|name| Opcode { index, name })
    }

    /// The opcode at index 0.
    #[must_use]
    pub fn first(&self) -> Opcode<'_> {
        // Non-empty by construction.
        Opcode {
            index: 0,
            name: &self.names[0],
        }
    }

    /// Looks up an opcode's index by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns `true` if `name` is one of the table's opcodes.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates opcodes in ascending index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Opcode<'_>> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| Opcode { index, name })
    }
}

/// Errors when building an [`OpcodeTable`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpcodeTableError {
    /// No opcodes were supplied.
    Empty,
    /// The supplied count differs from the fixed cardinality.
    Cardinality {
        /// Number of names supplied.
        found: usize,
        /// Required number of names.
        expected: usize,
    },
    /// A name appeared twice.
    Duplicate {
        /// The repeated name.
        name: String,
        /// Index of the first occurrence.
        first: usize,
        /// Index of the second occurrence.
        second: usize,
    },
}

impl fmt::Display for OpcodeTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "opcode list is empty"),
            Self::Cardinality { found, expected } => {
                write!(f, "found {found} opcodes (expected {expected})")
            }
            Self::Duplicate {
                name,
                first,
                second,
            } => write!(
                f,
                "duplicate opcode {name} at indices 0x{first:02x} and 0x{second:02x}"
            ),
        }
    }
}

impl core::error::Error for OpcodeTableError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn preserves_supplied_order() {
        let t = OpcodeTable::new(names(&["OP_NOP", "OP_MOVE", "OP_RETURN"]), Some(3)).unwrap();
        let got: Vec<_> = t.iter().map(|op| (op.index, op.name)).collect();
        assert_eq!(got, vec![(0, "OP_NOP"), (1, "OP_MOVE"), (2, "OP_RETURN")]);
        assert_eq!(t.first().name, "OP_NOP");
        assert_eq!(t.index_of("OP_RETURN"), Some(2));
        assert!(!t.contains("OP_GOTO"));
        assert_eq!(t.get(3), None);
    }

    #[test]
    fn rejects_wrong_cardinality() {
        let err = OpcodeTable::new(names(&["OP_NOP", "OP_MOVE"]), Some(256)).unwrap_err();
        assert_eq!(
            err,
            OpcodeTableError::Cardinality {
                found: 2,
                expected: 256
            }
        );
    }

    #[test]
    fn rejects_duplicates() {
        let err = OpcodeTable::new(names(&["OP_NOP", "OP_MOVE", "OP_NOP"]), None).unwrap_err();
        assert_eq!(
            err,
            OpcodeTableError::Duplicate {
                name: "OP_NOP".into(),
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            OpcodeTable::new(Vec::new(), None).unwrap_err(),
            OpcodeTableError::Empty
        );
    }
}
