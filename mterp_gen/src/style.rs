// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch style and handler slot size.

use core::fmt;

/// Dispatch style selected by `handler-style`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandlerStyle {
    /// Fixed-size, aligned handler slots; control transfers to `base + (opcode << bits)`.
    ComputedGoto,
    /// Handlers are placed freely and reached through an address table.
    JumpTable,
    /// Every handler lives in the native body; the low-level stream only holds bridging stubs.
    AllC,
}

impl HandlerStyle {
    /// Parses a style name as written in a config file.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "computed-goto" => Self::ComputedGoto,
            "jump-table" => Self::JumpTable,
            "all-c" => Self::AllC,
            _ => return None,
        })
    }

    /// The config-file spelling of this style.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ComputedGoto => "computed-goto",
            Self::JumpTable => "jump-table",
            Self::AllC => "all-c",
        }
    }

    /// Returns `true` if `%break` continuations are moved out of the handler slots.
    #[must_use]
    pub const fn relocates_continuations(self) -> bool {
        matches!(self, Self::ComputedGoto)
    }
}

impl fmt::Display for HandlerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size of one computed-goto handler slot.
///
/// Always a non-zero power of two.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandlerSize {
    bytes: u32,
}

impl HandlerSize {
    /// Returns `None` unless `bytes` is a non-zero power of two that fits in `u32`.
    #[must_use]
    pub fn new(bytes: i64) -> Option<Self> {
        let bytes = u32::try_from(bytes).ok()?;
        bytes.is_power_of_two().then_some(Self { bytes })
    }

    /// Slot size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self.bytes
    }

    /// `log2` of the slot size.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes.trailing_zeros()
    }
}
