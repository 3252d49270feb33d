// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The config driver: runs config commands against a generation context and assembles the
//! outputs.

use core::fmt;

use crate::config::{Command, DirectiveError};
use crate::diagnostics::Diagnostic;
use crate::emit::{AsmStub, Emitter, Outputs, Settings, Table};
use crate::opcode_table::{OpcodeTable, OpcodeTableError};
use crate::profile::{Profile, Stream};
use crate::source::FragmentSource;
use crate::style::{HandlerSize, HandlerStyle};
use crate::template::TemplateError;

/// Progress through the `op-start` / `op-end` bracket.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BracketState {
    /// No `op-start` yet.
    #[default]
    NotStarted,
    /// Inside the bracket; `op` and `alt` are accepted.
    Started,
    /// `op-end` seen; the primary table has been emitted.
    Ended,
}

/// What went wrong while processing the config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A config command was malformed, misordered or invalid.
    Directive(DirectiveError),
    /// Fragment expansion failed.
    Template(TemplateError),
}

impl From<DirectiveError> for ConfigErrorKind {
    fn from(err: DirectiveError) -> Self {
        Self::Directive(err)
    }
}

impl From<TemplateError> for ConfigErrorKind {
    fn from(err: TemplateError) -> Self {
        Self::Template(err)
    }
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directive(e) => e.fmt(f),
            Self::Template(e) => e.fmt(f),
        }
    }
}

impl core::error::Error for ConfigErrorKind {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Directive(e) => Some(e),
            Self::Template(e) => Some(e),
        }
    }
}

/// The config line a failure is attributed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigLocation {
    /// 1-based line number.
    pub line: usize,
    /// The command word on that line.
    pub command: String,
}

/// A config processing failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    /// The offending line, or `None` for checks made at the end of the config.
    pub location: Option<ConfigLocation>,
    /// The failure.
    pub kind: ConfigErrorKind,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "line {} ({}): {}", loc.line, loc.command, self.kind),
            None => write!(f, "end of config: {}", self.kind),
        }
    }
}

impl core::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// A failed generation run. No output is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// The supplied opcode list was rejected.
    OpcodeTable(OpcodeTableError),
    /// The config or a fragment was rejected.
    Config(ConfigError),
}

impl GenerateError {
    /// The directive failure, if this is one.
    #[must_use]
    pub fn as_directive(&self) -> Option<&DirectiveError> {
        match self {
            Self::Config(ConfigError {
                kind: ConfigErrorKind::Directive(e),
                ..
            }) => Some(e),
            _ => None,
        }
    }

    /// The template failure, if this is one.
    #[must_use]
    pub fn as_template(&self) -> Option<&TemplateError> {
        match self {
            Self::Config(ConfigError {
                kind: ConfigErrorKind::Template(e),
                ..
            }) => Some(e),
            _ => None,
        }
    }
}

impl From<OpcodeTableError> for GenerateError {
    fn from(err: OpcodeTableError) -> Self {
        Self::OpcodeTable(err)
    }
}

impl From<ConfigError> for GenerateError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpcodeTable(e) => write!(f, "opcode table: {e}"),
            Self::Config(e) => e.fmt(f),
        }
    }
}

impl core::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::OpcodeTable(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

/// One rendered output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Which stream this is.
    pub stream: Stream,
    /// File name, e.g. `InterpAsm-armv5te.S`.
    pub name: String,
    /// Full contents, header included.
    pub contents: String,
}

/// The result of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    /// Rendered outputs, in the order the profile lists its streams.
    pub files: Vec<GeneratedFile>,
    /// Notes and warnings raised along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl Generated {
    /// The output for `stream`, if the profile produces it.
    #[must_use]
    pub fn file(&self, stream: Stream) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.stream == stream)
    }

    /// Contents of the assembly output.
    #[must_use]
    pub fn asm(&self) -> &str {
        self.file(Stream::Asm).map_or("", |f| f.contents.as_str())
    }

    /// Contents of the native output, if any.
    #[must_use]
    pub fn native(&self) -> Option<&str> {
        self.file(Stream::Native).map(|f| f.contents.as_str())
    }
}

/// A single generation run over one config file.
pub struct Generator<'a> {
    profile: &'a Profile,
    target: &'a str,
    opcodes: &'a OpcodeTable,
    source: &'a dyn FragmentSource,
    settings: Settings,
    bracket: BracketState,
    split_ops: bool,
    alt_ops_seen: bool,
    tables_emitted: bool,
    generate_alt: bool,
    outputs: Outputs,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Generator<'a> {
    /// Creates a run for `target` (used in output names and headers).
    #[must_use]
    pub fn new(
        profile: &'a Profile,
        target: &'a str,
        opcodes: &'a OpcodeTable,
        source: &'a dyn FragmentSource,
    ) -> Self {
        Self {
            profile,
            target,
            opcodes,
            source,
            settings: Settings::default(),
            bracket: BracketState::NotStarted,
            split_ops: false,
            alt_ops_seen: false,
            tables_emitted: false,
            generate_alt: false,
            outputs: Outputs::new(profile, target),
            diagnostics: Vec::new(),
        }
    }

    /// Processes `config` and returns the rendered outputs.
    ///
    /// Fails before reading `config` if the opcode table does not have the profile's fixed
    /// cardinality. The first failing command aborts the run.
    pub fn run(mut self, config: &str) -> Result<Generated, GenerateError> {
        tracing::debug!(
            generator = self.profile.generator,
            target = self.target,
            opcodes = self.opcodes.len(),
            "start"
        );
        if let Some(expected) = self.profile.expected_opcodes {
            let found = self.opcodes.len();
            if found != expected {
                return Err(OpcodeTableError::Cardinality { found, expected }.into());
            }
        }

        for (idx, raw) in config.lines().enumerate() {
            let line = idx + 1;
            let Some(tokens) = Command::tokenize(raw) else {
                continue;
            };
            let located = |kind: ConfigErrorKind| ConfigError {
                location: Some(ConfigLocation {
                    line,
                    command: tokens[0].to_owned(),
                }),
                kind,
            };
            let cmd = Command::parse(&tokens, self.profile).map_err(|e| located(e.into()))?;
            self.apply(line, cmd).map_err(located)?;
        }

        self.finish().map_err(|kind| ConfigError {
            location: None,
            kind,
        })?;

        let Self {
            profile,
            target,
            mut outputs,
            diagnostics,
            ..
        } = self;
        let files = profile
            .streams()
            .filter_map(|stream| {
                let name = profile.output_name(stream, target)?;
                let contents = core::mem::take(outputs.stream_mut(stream));
                Some(GeneratedFile {
                    stream,
                    name,
                    contents,
                })
            })
            .collect();
        Ok(Generated { files, diagnostics })
    }

    fn apply(&mut self, line: usize, cmd: Command<'_>) -> Result<(), ConfigErrorKind> {
        if self.profile.has_styles
            && self.settings.style.is_none()
            && !matches!(cmd, Command::HandlerStyle(_))
        {
            return Err(DirectiveError::StyleNotFirst {
                command: cmd.name().to_owned(),
            }
            .into());
        }

        match cmd {
            Command::HandlerStyle(name) => {
                if self.settings.style.is_some() {
                    return Err(DirectiveError::StyleAlreadySet.into());
                }
                let style = HandlerStyle::from_name(name).ok_or_else(|| {
                    DirectiveError::InvalidStyle {
                        name: name.to_owned(),
                    }
                })?;
                tracing::debug!(%style, "handler style");
                self.settings.style = Some(style);
            }
            Command::HandlerSize(value) => {
                if self.settings.handler_size.is_some() {
                    return Err(DirectiveError::HandlerSizeAlreadySet.into());
                }
                let bytes: i64 =
                    value
                        .parse()
                        .map_err(|_| DirectiveError::HandlerSizeNotInteger {
                            value: value.to_owned(),
                        })?;
                let size = HandlerSize::new(bytes)
                    .ok_or(DirectiveError::HandlerSizeNotPowerOfTwo { value: bytes })?;
                if self.profile.has_styles && self.settings.style != Some(HandlerStyle::ComputedGoto)
                {
                    self.warn(line, "handler-size valid only for computed-goto interpreters");
                }
                self.settings.handler_size = Some(size);
            }
            Command::Import(path) => {
                let stream = self.profile.import_stream(path).ok_or_else(|| {
                    DirectiveError::UnknownImportKind {
                        path: path.to_owned(),
                    }
                })?;
                let emitter = Emitter {
                    profile: self.profile,
                    opcodes: self.opcodes,
                    source: self.source,
                    settings: &self.settings,
                };
                emitter.import(path, self.outputs.stream_mut(stream))?;
            }
            Command::AsmStub(path) => {
                let text = self
                    .source
                    .read(path)
                    .map_err(|e| TemplateError::Unreadable {
                        path: path.to_owned(),
                        message: e.to_string(),
                    })?;
                self.settings.asm_stub = Some(AsmStub::new(path, &text));
            }
            Command::AsmAltStub(path) => {
                if self.tables_emitted {
                    return Err(DirectiveError::AltStubAfterAltPass.into());
                }
                if self.settings.style == Some(HandlerStyle::AllC) {
                    self.warn(line, "asm-alt-stub for an all-c interpreter");
                }
                self.settings.default_alt_stub = Some(path.to_owned());
                self.generate_alt = true;
            }
            Command::OpStart(dir) => {
                if self.bracket != BracketState::NotStarted {
                    return Err(DirectiveError::OpStartRepeated.into());
                }
                self.settings.default_dir = Some(dir.to_owned());
                self.bracket = BracketState::Started;
            }
            Command::Op { opcode, dir } => {
                self.check_override(&cmd, opcode)?;
                if let Some(old) = self.settings.primary.set(opcode, dir) {
                    self.note(line, format!("op overrides earlier {opcode} ({old} -> {dir})"));
                }
            }
            Command::Alt { opcode, dir } => {
                self.check_override(&cmd, opcode)?;
                if let Some(old) = self.settings.alternate.set(opcode, dir) {
                    self.note(line, format!("alt overrides earlier {opcode} ({old} -> {dir})"));
                }
                self.generate_alt = true;
            }
            Command::OpEnd => {
                if self.bracket != BracketState::Started {
                    return Err(DirectiveError::OpEndOutOfOrder.into());
                }
                self.bracket = BracketState::Ended;
                if self.settings.style == Some(HandlerStyle::ComputedGoto)
                    && self.settings.handler_size.is_none()
                {
                    return Err(DirectiveError::MissingHandlerSize.into());
                }

                let emitter = Emitter {
                    profile: self.profile,
                    opcodes: self.opcodes,
                    source: self.source,
                    settings: &self.settings,
                };
                emitter.emit_primary(&mut self.outputs)?;
                if !self.split_ops {
                    self.emit_tables()?;
                }
            }
            Command::AltOps => {
                if self.bracket != BracketState::Ended {
                    return Err(DirectiveError::AltOpsBeforeOpEnd.into());
                }
                if self.alt_ops_seen {
                    return Err(DirectiveError::AltOpsRepeated.into());
                }
                self.alt_ops_seen = true;
                if self.tables_emitted {
                    self.note(line, "alt-ops has nothing left to emit");
                } else {
                    self.emit_tables()?;
                }
            }
            Command::SplitOps => {
                if self.bracket == BracketState::Ended {
                    return Err(DirectiveError::SplitOpsAfterOpEnd.into());
                }
                self.split_ops = true;
            }
        }
        Ok(())
    }

    fn check_override(&self, cmd: &Command<'_>, opcode: &str) -> Result<(), DirectiveError> {
        if self.bracket != BracketState::Started {
            return Err(DirectiveError::OutsideBracket {
                command: cmd.name().to_owned(),
            });
        }
        if !self.opcodes.contains(opcode) {
            return Err(DirectiveError::UnknownOpcode {
                name: opcode.to_owned(),
            });
        }
        Ok(())
    }

    /// Emits the alternate table and, for `jump-table` style, both address tables.
    fn emit_tables(&mut self) -> Result<(), ConfigErrorKind> {
        let emitter = Emitter {
            profile: self.profile,
            opcodes: self.opcodes,
            source: self.source,
            settings: &self.settings,
        };
        let jump_table = self.settings.style == Some(HandlerStyle::JumpTable);
        if self.generate_alt {
            emitter.emit_alternate(&mut self.outputs)?;
        }
        if jump_table {
            emitter.emit_address_table(Table::Primary, &mut self.outputs.asm);
            if self.generate_alt {
                emitter.emit_address_table(Table::Alternate, &mut self.outputs.asm);
            }
        }
        self.tables_emitted = true;
        Ok(())
    }

    fn finish(&self) -> Result<(), ConfigErrorKind> {
        if self.bracket != BracketState::Ended {
            return Err(DirectiveError::Unterminated.into());
        }
        let needs_tables =
            self.generate_alt || self.settings.style == Some(HandlerStyle::JumpTable);
        if needs_tables && !self.tables_emitted {
            return Err(DirectiveError::AltOpsMissing.into());
        }
        Ok(())
    }

    fn note(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::note(line, message));
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(line, message));
    }
}

/// Validates `names` against the profile and runs `config` in one step.
pub fn generate(
    profile: &Profile,
    target: &str,
    names: Vec<String>,
    source: &dyn FragmentSource,
    config: &str,
) -> Result<Generated, GenerateError> {
    let opcodes = OpcodeTable::new(names, profile.expected_opcodes)?;
    Generator::new(profile, target, &opcodes, source).run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::source::MemorySource;

    const OPS: [&str; 3] = ["OP_NOP", "OP_MOVE", "OP_ADD_INT"];

    fn profile() -> Profile {
        Profile {
            expected_opcodes: Some(OPS.len()),
            ..Profile::MTERP
        }
    }

    fn source() -> MemorySource {
        let mut src = MemorySource::new()
            .with("stub.S", "    bl      dvmMterp_${opcode}\n")
            .with("alt_stub.S", "    b       .L_${opcode}  @ $opnum\n")
            .with("c/header.cpp", "// common C\n")
            .with("arm/header.S", "#define SIZE $handler_size_bytes\n");
        for op in OPS {
            src.insert(format!("arm/{op}.S"), format!("    handle {op}\n"));
            src.insert(format!("c/{op}.cpp"), format!("HANDLE_OPCODE({op})\n"));
            src.insert(format!("arm/{op}.cpp"), format!("HANDLE_OPCODE({op})\n"));
            src.insert(format!("arm2/{op}.S"), format!("    handle2 {op}\n"));
            src.insert(format!("trace/ALT_{op}.S"), format!("    trace {op}\n"));
        }
        src
    }

    fn run(config: &str) -> Result<Generated, GenerateError> {
        let names = OPS.iter().map(|s| (*s).to_owned()).collect();
        generate(&profile(), "test", names, &source(), config)
    }

    fn directive_err(config: &str) -> DirectiveError {
        let err = run(config).unwrap_err();
        err.as_directive()
            .cloned()
            .unwrap_or_else(|| panic!("expected a directive error, got {err}"))
    }

    const CG: &str = "handler-style computed-goto\nhandler-size 64\n";

    #[test]
    fn minimal_computed_goto_run() {
        let out = run(&format!("{CG}op-start arm\nop-end\n")).unwrap();
        assert_eq!(out.files.len(), 2);
        assert_eq!(out.files[0].name, "InterpC-test.cpp");
        assert_eq!(out.files[1].name, "InterpAsm-test.S");
        let asm = out.asm();
        assert!(asm.starts_with("/*\n * This file was generated automatically by gen-mterp"));
        assert_eq!(asm.matches("    .balign 64\n.L_").count(), OPS.len());
        assert!(!asm.contains("dvmAsmSisterStart"));
        assert!(!asm.contains("dvmAsmAltInstructionStart"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn blocks_follow_index_order() {
        let out = run(&format!("{CG}op-start arm\nop OP_MOVE arm2\nop-end\n")).unwrap();
        let asm = out.asm();
        let positions: Vec<usize> = OPS
            .iter()
            .map(|op| asm.find(&format!(".L_{op}: ")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(asm.contains("/* File: arm2/OP_MOVE.S */\n    handle2 OP_MOVE\n"));
        assert!(asm.contains("/* File: arm/OP_ADD_INT.S */"));
    }

    #[test]
    fn import_routes_by_extension() {
        let out = run(&format!(
            "{CG}import c/header.cpp\nimport arm/header.S\nop-start arm\nop-end\n"
        ))
        .unwrap();
        assert!(out.native().unwrap().contains("// common C\n"));
        assert!(out.asm().contains("#define SIZE 64\n"));

        assert_eq!(
            directive_err(&format!("{CG}import arm/header.h\n")),
            DirectiveError::UnknownImportKind {
                path: "arm/header.h".into()
            }
        );
    }

    #[test]
    fn style_must_come_first_and_once() {
        assert_eq!(
            directive_err("handler-size 64\nhandler-style computed-goto\n"),
            DirectiveError::StyleNotFirst {
                command: "handler-size".into()
            }
        );
        assert_eq!(
            directive_err("handler-style all-c\nhandler-style all-c\n"),
            DirectiveError::StyleAlreadySet
        );
        assert_eq!(
            directive_err("handler-style threaded\n"),
            DirectiveError::InvalidStyle {
                name: "threaded".into()
            }
        );
    }

    #[test]
    fn handler_size_validation() {
        for bad in ["0", "-8", "48", "3"] {
            let err = directive_err(&format!("handler-style computed-goto\nhandler-size {bad}\n"));
            assert!(
                matches!(err, DirectiveError::HandlerSizeNotPowerOfTwo { .. }),
                "{bad}: {err}"
            );
        }
        assert_eq!(
            directive_err("handler-style computed-goto\nhandler-size big\n"),
            DirectiveError::HandlerSizeNotInteger {
                value: "big".into()
            }
        );
        assert_eq!(
            directive_err(&format!("{CG}handler-size 64\n")),
            DirectiveError::HandlerSizeAlreadySet
        );
        assert_eq!(
            directive_err("handler-style computed-goto\nop-start arm\nop-end\n"),
            DirectiveError::MissingHandlerSize
        );
    }

    #[test]
    fn handler_size_outside_computed_goto_warns() {
        let out = run("handler-style jump-table\nhandler-size 64\nop-start arm\nop-end\n").unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Warning);
        assert_eq!(out.diagnostics[0].line, 2);
    }

    #[test]
    fn bracket_rules() {
        assert_eq!(
            directive_err(&format!("{CG}op OP_NOP arm\n")),
            DirectiveError::OutsideBracket {
                command: "op".into()
            }
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nop-start arm\n")),
            DirectiveError::OpStartRepeated
        );
        assert_eq!(
            directive_err(&format!("{CG}op-end\n")),
            DirectiveError::OpEndOutOfOrder
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nop-end\nop-end\n")),
            DirectiveError::OpEndOutOfOrder
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nop-end\nalt OP_NOP trace\n")),
            DirectiveError::OutsideBracket {
                command: "alt".into()
            }
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\n")),
            DirectiveError::Unterminated
        );
        assert_eq!(directive_err(CG), DirectiveError::Unterminated);
    }

    #[test]
    fn errors_carry_line_and_command() {
        let err = run(&format!("{CG}\n# comment\nop-start arm\nop OP_BOGUS arm2\n")).unwrap_err();
        let (loc, kind) = match err {
            GenerateError::Config(ConfigError {
                location: Some(loc),
                kind,
            }) => (loc, kind),
            other => panic!("unexpected error {other}"),
        };
        assert_eq!(loc.line, 6);
        assert_eq!(loc.command, "op");
        assert_eq!(
            kind,
            ConfigErrorKind::Directive(DirectiveError::UnknownOpcode {
                name: "OP_BOGUS".into()
            })
        );
    }

    #[test]
    fn override_notes() {
        let out = run(&format!(
            "{CG}op-start arm\nop OP_MOVE c\nop OP_MOVE arm2\nop-end\n"
        ))
        .unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Note);
        assert_eq!(
            out.diagnostics[0].message,
            "op overrides earlier OP_MOVE (c -> arm2)"
        );
        assert!(out.asm().contains("    handle2 OP_MOVE\n"));
        assert!(!out.native().unwrap().contains("OP_MOVE"));
    }

    #[test]
    fn alt_override_notes() {
        let out = run(&format!(
            "{CG}asm-alt-stub alt_stub.S\nop-start arm\nalt OP_MOVE arm2\nalt OP_MOVE trace\nop-end\n"
        ))
        .unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Note);
        assert_eq!(out.diagnostics[0].line, 6);
        assert_eq!(
            out.diagnostics[0].message,
            "alt overrides earlier OP_MOVE (arm2 -> trace)"
        );
        assert!(out.asm().contains("/* File: trace/ALT_OP_MOVE.S */\n    trace OP_MOVE\n"));
        assert!(!out.asm().contains("arm2/ALT_OP_MOVE.S"));
    }

    #[test]
    fn alternate_table_covers_every_opcode() {
        let out = run(&format!(
            "{CG}asm-alt-stub alt_stub.S\nop-start arm\nalt OP_MOVE trace\nop-end\n"
        ))
        .unwrap();
        let asm = out.asm();
        assert!(asm.contains("dvmAsmAltInstructionStart = .L_ALT_OP_NOP\n"));
        for op in OPS {
            assert!(asm.contains(&format!(".L_ALT_{op}: /* ")), "{op}");
        }
        assert!(asm.contains("/* File: trace/ALT_OP_MOVE.S */\n    trace OP_MOVE\n"));
        assert!(asm.contains("    b       .L_OP_ADD_INT  @ 2\n"));
        assert!(asm.ends_with("dvmAsmAltInstructionEnd:\n"));
    }

    #[test]
    fn alt_override_without_default_stub_fails() {
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nalt OP_MOVE trace\nop-end\n")),
            DirectiveError::MissingAltStub {
                opcode: "OP_NOP".into()
            }
        );
    }

    #[test]
    fn split_ops_defers_tables_until_alt_ops() {
        let config =
            format!("{CG}asm-alt-stub alt_stub.S\nsplit-ops\nop-start arm\nop-end\nimport arm/header.S\nalt-ops\n");
        let asm = run(&config).unwrap().asm().to_owned();
        let end = asm.find("dvmAsmInstructionEnd:").unwrap();
        let imported = asm.find("#define SIZE").unwrap();
        let alt = asm.find("dvmAsmAltInstructionStart").unwrap();
        assert!(end < imported && imported < alt);

        assert_eq!(
            directive_err(&format!(
                "{CG}asm-alt-stub alt_stub.S\nsplit-ops\nop-start arm\nop-end\n"
            )),
            DirectiveError::AltOpsMissing
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nop-end\nsplit-ops\n")),
            DirectiveError::SplitOpsAfterOpEnd
        );
        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nalt-ops\n")),
            DirectiveError::AltOpsBeforeOpEnd
        );
        assert_eq!(
            directive_err(&format!(
                "{CG}split-ops\nop-start arm\nop-end\nalt-ops\nalt-ops\n"
            )),
            DirectiveError::AltOpsRepeated
        );
    }

    #[test]
    fn alt_ops_after_immediate_tables_is_a_note() {
        let out = run(&format!(
            "{CG}asm-alt-stub alt_stub.S\nop-start arm\nop-end\nalt-ops\n"
        ))
        .unwrap();
        assert_eq!(out.asm().matches("dvmAsmAltInstructionStart = ").count(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Note);
    }

    #[test]
    fn alt_stub_after_tables_fails() {
        assert_eq!(
            directive_err(&format!(
                "{CG}op-start arm\nop-end\nasm-alt-stub alt_stub.S\n"
            )),
            DirectiveError::AltStubAfterAltPass
        );
    }

    #[test]
    fn jump_table_emits_address_tables() {
        let out = run(
            "handler-style jump-table\nasm-alt-stub alt_stub.S\nop-start arm\nop-end\n",
        )
        .unwrap();
        let asm = out.asm();
        assert!(asm.contains("dvmAsmInstructionStartCode = .L_OP_NOP\n"));
        assert!(asm.contains(
            "dvmAsmInstructionStart:\n    .long .L_OP_NOP /* 0x00 */\n    .long .L_OP_MOVE /* 0x01 */\n    .long .L_OP_ADD_INT /* 0x02 */\n"
        ));
        assert!(asm.contains(
            "dvmAsmAltInstructionStart:\n    .long .L_ALT_OP_NOP /* 0x00 */\n"
        ));

        let plain = run("handler-style jump-table\nop-start arm\nop-end\n").unwrap();
        assert!(plain.asm().contains("\ndvmAsmInstructionStart:\n"));
        assert!(!plain.asm().contains("dvmAsmAltInstructionStart"));
    }

    #[test]
    fn all_c_without_stub_synthesizes_dummy_entry() {
        let out = run("handler-style all-c\nimport c/header.cpp\nop-start arm\nop-end\n").unwrap();
        let asm = out.asm();
        assert_eq!(asm.matches(".L_OP_NOP:   /* dummy */").count(), 1);
        assert!(!asm.contains(".L_OP_MOVE"));
        let native = out.native().unwrap();
        for op in OPS {
            assert!(native.contains(&format!("/* File: arm/{op}.cpp */")));
        }
    }

    #[test]
    fn all_c_with_stub_has_no_dummy() {
        let out = run("handler-style all-c\nasm-stub stub.S\nop-start arm\nop-end\n").unwrap();
        let asm = out.asm();
        assert!(!asm.contains("dummy"));
        assert!(asm.contains(".L_OP_ADD_INT: /* 0x02 */\n    bl      dvmMterp_OP_ADD_INT\n"));
    }

    #[test]
    fn native_handler_without_stub_fails_outside_all_c() {
        let config = format!("{CG}op-start arm\nop OP_MOVE c\nop-end\n");
        assert_eq!(
            directive_err(&config),
            DirectiveError::MissingAsmStub {
                opcode: "OP_MOVE".into()
            }
        );
        let Err(GenerateError::Config(ConfigError {
            location: Some(loc),
            ..
        })) = run(&config)
        else {
            panic!("expected a located config error");
        };
        assert_eq!((loc.line, loc.command.as_str()), (5, "op-end"));

        assert_eq!(
            directive_err(&format!("{CG}op-start arm\nop OP_NOP c\nop-end\n")),
            DirectiveError::MissingAsmStub {
                opcode: "OP_NOP".into()
            }
        );
        assert_eq!(
            directive_err("handler-style jump-table\nop-start c\nop-end\n"),
            DirectiveError::MissingAsmStub {
                opcode: "OP_NOP".into()
            }
        );
    }

    #[test]
    fn native_handler_with_stub_keeps_every_slot() {
        let out = run(&format!(
            "{CG}asm-stub stub.S\nop-start arm\nop OP_NOP c\nop-end\n"
        ))
        .unwrap();
        let asm = out.asm();
        assert!(!asm.contains("dummy"));
        let slots: Vec<usize> = OPS
            .iter()
            .map(|op| asm.find(&format!(".L_{op}: /* ")).unwrap())
            .collect();
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
        assert!(asm.contains(".L_OP_NOP: /* 0x00 */\n    bl      dvmMterp_OP_NOP\n"));
        assert!(out.native().unwrap().contains("/* File: c/OP_NOP.cpp */"));
    }

    #[test]
    fn missing_fragment_is_a_template_error() {
        let err = run(&format!("{CG}op-start arm\nop OP_MOVE nowhere\nop-end\n")).unwrap_err();
        assert!(matches!(
            err.as_template(),
            Some(TemplateError::Unreadable { path, .. }) if path == "nowhere/OP_MOVE.S"
        ));
    }

    #[test]
    fn opcode_cardinality_is_checked_first() {
        let err = generate(
            &profile(),
            "test",
            vec!["OP_NOP".into()],
            &source(),
            "this config is never read\n",
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::OpcodeTable(_)));
    }

    #[test]
    fn template_profile_single_stream() {
        let profile = Profile::TEMPLATE;
        let src = MemorySource::new()
            .with("armv5te/TEMPLATE_A.S", "    a\n%break\n    cold\n")
            .with("armv5te/TEMPLATE_B.S", "    b\n");
        let out = generate(
            &profile,
            "armv5te",
            vec!["TEMPLATE_A".into(), "TEMPLATE_B".into()],
            &src,
            "handler-size 128\nop-start armv5te\nop-end\n",
        )
        .unwrap();
        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].name, "CompilerTemplateAsm-armv5te.S");
        let asm = out.asm();
        assert!(asm.contains("    .section .data.rel.ro\n\ndvmCompilerTemplateStart:\n\n"));
        assert!(asm.contains("    .balign 4\n    .global dvmCompiler_TEMPLATE_B\ndvmCompiler_TEMPLATE_B:\n"));
        assert!(asm.contains("    a\n    cold\n"));
        assert!(asm.ends_with("    .size   dvmCompilerTemplateStart, .-dvmCompilerTemplateStart\n"));
    }
}
