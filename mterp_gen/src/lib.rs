// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `mterp_gen`: assembles interpreter dispatch tables from a per-target config file and a library
//! of per-opcode source fragments.
//!
//! A run reads the config line by line. Settings commands (`handler-style`, `handler-size`,
//! `asm-stub`, ...) mutate the generation context; the `op-start` / `op-end` bracket drives the
//! table assembly. At `op-end` every opcode is emitted in index order, each one by expanding its
//! fragment through the [`template`] engine.
//!
//! Nothing is written to disk by this crate. Outputs are rendered in memory and returned as a
//! [`Generated`] report; a failed run returns an error and no output at all.
//!
//! ## Example
//!
//! ```
//! use mterp_gen::profile::Profile;
//! use mterp_gen::source::MemorySource;
//!
//! let profile = Profile { expected_opcodes: Some(2), ..Profile::MTERP };
//! let source = MemorySource::new()
//!     .with("arm/OP_NOP.S", "    nop\n")
//!     .with("arm/OP_MOVE.S", "    mov r$opnum, r0\n");
//! let config = "handler-style computed-goto\nhandler-size 64\nop-start arm\nop-end\n";
//!
//! let out = mterp_gen::generate(
//!     &profile,
//!     "demo",
//!     vec!["OP_NOP".into(), "OP_MOVE".into()],
//!     &source,
//!     config,
//! )?;
//! let asm = out.asm();
//! assert!(asm.contains(".L_OP_MOVE: /* 0x01 */"));
//! assert!(asm.contains("    mov r1, r0\n"));
//! # Ok::<(), mterp_gen::GenerateError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod driver;
pub(crate) mod emit;
pub mod location;
pub mod opcode_list;
pub mod opcode_table;
pub mod params;
pub mod profile;
pub mod scope;
pub mod source;
pub mod style;
pub mod subst;
pub mod template;

pub use diagnostics::{Diagnostic, Severity};
pub use driver::{
    ConfigError, ConfigErrorKind, ConfigLocation, GenerateError, Generated, GeneratedFile,
    Generator, generate,
};
