// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generator profiles.
//!
//! The interpreter generator and the JIT template generator share one core. A [`Profile`] fixes
//! everything that differs between them: which output streams exist, which config commands are
//! recognized, how handler labels are spelled, and how the table is framed.

use crate::opcode_list::OpcodeListFormat;

/// One generated output stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    /// The high-level-language body (handlers written in C/C++).
    Native,
    /// The low-level assembly body holding the dispatch table.
    Asm,
}

/// How the start of a handler table is materialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TableFraming {
    /// The start symbol is an alias for the first handler's label; the table ends with an
    /// exported end label.
    AliasFirstHandler,
    /// The start symbol is placed inline in a read-only data section.
    InlineStart,
}

/// Label spelling for handler entry points.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LabelScheme {
    /// Prefix for primary handler labels (`<prefix>_<opcode>`).
    pub handler_prefix: &'static str,
    /// Prefix for alternate handler labels. Must differ from `handler_prefix`.
    pub alt_prefix: &'static str,
    /// Emit `.global` for each handler label.
    pub export_handlers: bool,
    /// Append `/* 0xNN */` with the opcode index to each label line.
    pub annotate_index: bool,
}

impl LabelScheme {
    /// Primary label for `opcode`.
    #[must_use]
    pub fn handler(&self, opcode: &str) -> String {
        format!("{}_{opcode}", self.handler_prefix)
    }

    /// Alternate label for `opcode`.
    #[must_use]
    pub fn alternate(&self, opcode: &str) -> String {
        format!("{}_{opcode}", self.alt_prefix)
    }
}

/// Static description of one generator variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Generator name written into each output header.
    pub generator: &'static str,
    /// File stem of the assembly output (`<stem>-<target><asm_ext>`).
    pub asm_stem: &'static str,
    /// File stem of the native output, if this profile produces one.
    pub native_stem: Option<&'static str>,
    /// Extension of assembly fragments and of the assembly output.
    pub asm_ext: &'static str,
    /// Extension of native fragments and of the native output.
    pub native_ext: &'static str,
    /// Opcode directory name that routes a handler to the native body.
    pub native_dir: &'static str,
    /// Whether `handler-style` is recognized (and then required as the first command).
    pub has_styles: bool,
    /// Whether `alt`, `asm-alt-stub`, `alt-ops` and `split-ops` are recognized.
    pub alt_tables: bool,
    /// Required opcode count, if fixed.
    pub expected_opcodes: Option<usize>,
    /// Handler label spelling.
    pub labels: LabelScheme,
    /// Table framing.
    pub framing: TableFraming,
    /// Primary table start symbol.
    pub table_start: &'static str,
    /// Primary table end symbol.
    pub table_end: Option<&'static str>,
    /// Alternate table start symbol.
    pub alt_table_start: &'static str,
    /// Alternate table end symbol.
    pub alt_table_end: &'static str,
    /// Alignment used wherever the handler size does not apply.
    pub min_align: u32,
    /// Default opcode list file, relative to the source root.
    pub opcode_list_file: &'static str,
    /// The opcode list file lives in the per-target directory.
    pub opcode_list_per_target: bool,
    /// Format of the default opcode list.
    pub opcode_list_format: OpcodeListFormat,
}

impl Profile {
    /// The interpreter generator: native + assembly streams, handler styles, alternate tables.
    pub const MTERP: Self = Self {
        generator: "gen-mterp",
        asm_stem: "InterpAsm",
        native_stem: Some("InterpC"),
        asm_ext: ".S",
        native_ext: ".cpp",
        native_dir: "c",
        has_styles: true,
        alt_tables: true,
        expected_opcodes: Some(256),
        labels: LabelScheme {
            handler_prefix: ".L",
            alt_prefix: ".L_ALT",
            export_handlers: false,
            annotate_index: true,
        },
        framing: TableFraming::AliasFirstHandler,
        table_start: "dvmAsmInstructionStart",
        table_end: Some("dvmAsmInstructionEnd"),
        alt_table_start: "dvmAsmAltInstructionStart",
        alt_table_end: "dvmAsmAltInstructionEnd",
        min_align: 4,
        opcode_list_file: "../../libdex/DexOpcodes.h",
        opcode_list_per_target: false,
        opcode_list_format: OpcodeListFormat::DexGotoTable,
    };

    /// The JIT template generator: a single assembly stream of exported templates.
    pub const TEMPLATE: Self = Self {
        generator: "gen-template",
        asm_stem: "CompilerTemplateAsm",
        native_stem: None,
        asm_ext: ".S",
        native_ext: ".cpp",
        native_dir: "c",
        has_styles: false,
        alt_tables: false,
        expected_opcodes: None,
        labels: LabelScheme {
            handler_prefix: "dvmCompiler",
            alt_prefix: "dvmCompilerAlt",
            export_handlers: true,
            annotate_index: false,
        },
        framing: TableFraming::InlineStart,
        table_start: "dvmCompilerTemplateStart",
        table_end: None,
        alt_table_start: "dvmCompilerAltTemplateStart",
        alt_table_end: "dvmCompilerAltTemplateEnd",
        min_align: 4,
        opcode_list_file: "TemplateOpList.h",
        opcode_list_per_target: true,
        opcode_list_format: OpcodeListFormat::JitTemplateList,
    };

    /// Looks up a built-in profile by name (`mterp` or `template`).
    #[must_use]
    pub fn by_name(name: &str) -> Option<&'static Self> {
        match name {
            "mterp" => Some(&Self::MTERP),
            "template" => Some(&Self::TEMPLATE),
            _ => None,
        }
    }

    /// Returns `true` if this profile produces `stream`.
    #[must_use]
    pub fn has_stream(&self, stream: Stream) -> bool {
        match stream {
            Stream::Asm => true,
            Stream::Native => self.native_stem.is_some(),
        }
    }

    /// Output file name for `stream`, or `None` if this profile does not produce it.
    #[must_use]
    pub fn output_name(&self, stream: Stream, target: &str) -> Option<String> {
        match stream {
            Stream::Asm => Some(format!("{}-{target}{}", self.asm_stem, self.asm_ext)),
            Stream::Native => self
                .native_stem
                .map(|stem| format!("{stem}-{target}{}", self.native_ext)),
        }
    }

    /// Streams produced by this profile, in the order they are written.
    pub fn streams(&self) -> impl Iterator<Item = Stream> + '_ {
        [Stream::Native, Stream::Asm]
            .into_iter()
            .filter(|s| self.has_stream(*s))
    }

    /// Routes an `import`ed fragment to a stream by its extension.
    #[must_use]
    pub fn import_stream(&self, path: &str) -> Option<Stream> {
        if path.ends_with(self.asm_ext) {
            Some(Stream::Asm)
        } else if path.ends_with(self.native_ext) && self.has_stream(Stream::Native) {
            Some(Stream::Native)
        } else {
            None
        }
    }

    /// Default opcode list path for `target`, relative to the source root.
    #[must_use]
    pub fn default_opcode_list(&self, target: &str) -> String {
        if self.opcode_list_per_target {
            format!("{target}/{}", self.opcode_list_file)
        } else {
            self.opcode_list_file.to_owned()
        }
    }

    /// The "generated automatically" banner that starts every output.
    #[must_use]
    pub fn file_header(&self, target: &str) -> String {
        format!(
            "/*\n * This file was generated automatically by {} for '{target}'.\n *\n * --> DO NOT EDIT <--\n */\n\n",
            self.generator
        )
    }
}
