// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Table assembly: per-opcode blocks, alternate tables and address tables.

use crate::config::DirectiveError;
use crate::driver::ConfigErrorKind;
use crate::location::LocationMap;
use crate::opcode_table::{Opcode, OpcodeTable};
use crate::profile::{Profile, Stream, TableFraming};
use crate::scope::Scope;
use crate::source::FragmentSource;
use crate::style::{HandlerSize, HandlerStyle};
use crate::subst::substitute;
use crate::template::{SisterBuffer, TemplateError, TemplateExpander};

const BLOCK_RULE: &str = "/* ------------------------------ */\n";
const SISTER_START: &str = "dvmAsmSisterStart";
const SISTER_END: &str = "dvmAsmSisterEnd";

/// A bridging stub loaded by `asm-stub`, kept as raw lines.
#[derive(Clone, Debug)]
pub(crate) struct AsmStub {
    pub(crate) path: String,
    pub(crate) lines: Vec<String>,
}

impl AsmStub {
    pub(crate) fn new(path: &str, text: &str) -> Self {
        Self {
            path: path.to_owned(),
            lines: text.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }
}

/// Settings accumulated from the config file.
#[derive(Clone, Debug, Default)]
pub(crate) struct Settings {
    pub(crate) style: Option<HandlerStyle>,
    pub(crate) handler_size: Option<HandlerSize>,
    pub(crate) asm_stub: Option<AsmStub>,
    pub(crate) default_dir: Option<String>,
    pub(crate) default_alt_stub: Option<String>,
    pub(crate) primary: LocationMap,
    pub(crate) alternate: LocationMap,
}

impl Settings {
    /// The scope every expansion starts from.
    pub(crate) fn global_scope(&self) -> Scope<'static> {
        let (bytes, bits) = self
            .handler_size
            .map_or((0, 0), |size| (size.bytes(), size.bits()));
        Scope::root()
            .with("handler_size_bytes", bytes)
            .with("handler_size_bits", bits)
    }

    fn opcode_scope(&self, op: Opcode<'_>) -> Scope<'static> {
        self.global_scope()
            .with("opcode", op.name)
            .with("opnum", op.index)
    }

    fn relocates(&self) -> bool {
        self.style
            .is_some_and(HandlerStyle::relocates_continuations)
    }
}

/// In-memory output streams.
#[derive(Clone, Debug, Default)]
pub(crate) struct Outputs {
    pub(crate) asm: String,
    pub(crate) native: Option<String>,
}

impl Outputs {
    pub(crate) fn new(profile: &Profile, target: &str) -> Self {
        let header = profile.file_header(target);
        Self {
            asm: header.clone(),
            native: profile.has_stream(Stream::Native).then_some(header),
        }
    }

    pub(crate) fn stream_mut(&mut self, stream: Stream) -> &mut String {
        match stream {
            Stream::Asm => &mut self.asm,
            Stream::Native => self.native.get_or_insert_with(String::new),
        }
    }
}

/// Which of the two tables a block belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Table {
    Primary,
    Alternate,
}

/// Emits table blocks for one run. Borrows the run's settings; writes into [`Outputs`].
pub(crate) struct Emitter<'g> {
    pub(crate) profile: &'g Profile,
    pub(crate) opcodes: &'g OpcodeTable,
    pub(crate) source: &'g dyn FragmentSource,
    pub(crate) settings: &'g Settings,
}

impl Emitter<'_> {
    /// Expands `path` with only the global parameters bound. Used by `import`.
    pub(crate) fn import(&self, path: &str, out: &mut String) -> Result<(), TemplateError> {
        tracing::debug!("import {path}");
        let mut scope = self.settings.global_scope();
        TemplateExpander::new(self.source, false).expand(path, &mut scope, out, None)
    }

    /// Emits one block per opcode in index order, followed by the end bookkeeping and, when
    /// continuations were relocated, the sister block.
    pub(crate) fn emit_primary(&self, out: &mut Outputs) -> Result<(), ConfigErrorKind> {
        let start = self.code_label(self.profile.table_start);
        let first = self.opcodes.first();
        let relocate = self.settings.relocates();
        let all_c = self.settings.style == Some(HandlerStyle::AllC);
        let default_dir = self.settings.default_dir.as_deref().unwrap_or_default();

        match self.profile.framing {
            TableFraming::AliasFirstHandler => {
                let first_label = self.profile.labels.handler(first.name);
                out.asm.push_str(&format!("\n    .global {start}\n"));
                out.asm.push_str(&format!("    .type   {start}, %function\n"));
                out.asm.push_str(&format!("{start} = {first_label}\n"));
                out.asm.push_str("    .text\n\n");
            }
            TableFraming::InlineStart => {
                out.asm.push_str(&format!("\n    .global {start}\n"));
                out.asm.push_str(&format!("    .type   {start}, %function\n"));
                out.asm.push_str("    .section .data.rel.ro\n\n");
                out.asm.push_str(&format!("{start}:\n\n"));
            }
        }

        let mut expander = TemplateExpander::new(self.source, relocate);
        let mut sister = SisterBuffer::new();
        let mut need_dummy = false;

        for op in self.opcodes.iter() {
            let dir = self.settings.primary.resolve(op.name, default_dir);
            let mut scope = self.settings.opcode_scope(op);

            if self.is_native(dir) {
                // Outside all-c the slots are positional, so every native handler needs a stub.
                if self.settings.asm_stub.is_none() && !all_c {
                    return Err(DirectiveError::MissingAsmStub {
                        opcode: op.name.to_owned(),
                    }
                    .into());
                }
                let path = format!("{dir}/{}{}", op.name, self.profile.native_ext);
                tracing::debug!("emit {path} --> native");
                expander.expand(&path, &mut scope, out.stream_mut(Stream::Native), None)?;
                match &self.settings.asm_stub {
                    Some(stub) => self.emit_stub(stub, op, &scope, &mut out.asm)?,
                    None if op.index == first.index => need_dummy = true,
                    None => {}
                }
            } else {
                let path = format!("{dir}/{}{}", op.name, self.profile.asm_ext);
                tracing::debug!("emit {path} --> asm");
                self.emit_header(Table::Primary, op, &mut out.asm);
                expander.expand(&path, &mut scope, &mut out.asm, Some(&mut sister))?;
            }
        }

        if need_dummy {
            out.asm.push_str(&self.align());
            let label = self.profile.labels.handler(first.name);
            out.asm.push_str(&format!("{label}:   /* dummy */\n"));
        }

        match (self.profile.framing, self.profile.table_end) {
            (TableFraming::AliasFirstHandler, Some(end)) => {
                out.asm.push_str(&self.align());
                self.emit_size_and_end(&start, &self.code_label(end), &mut out.asm);
            }
            _ => {
                out.asm
                    .push_str(&format!("    .size   {start}, .-{start}\n"));
            }
        }

        if relocate && !sister.is_empty() {
            tracing::debug!(chunks = sister.chunks().len(), "flush sister block");
            out.asm.push_str(&section_comment("Sister implementations"));
            out.asm.push_str(&format!("    .global {SISTER_START}\n"));
            out.asm
                .push_str(&format!("    .type   {SISTER_START}, %function\n"));
            out.asm.push_str("    .text\n");
            out.asm
                .push_str(&format!("    .balign {}\n", self.profile.min_align));
            out.asm.push_str(&format!("{SISTER_START}:\n"));
            for chunk in sister.chunks() {
                out.asm.push_str(chunk);
            }
            out.asm.push_str(&format!(
                "\n    .size   {SISTER_START}, .-{SISTER_START}\n"
            ));
            out.asm.push_str(&format!("    .global {SISTER_END}\n"));
            out.asm.push_str(&format!("{SISTER_END}:\n\n"));
        }
        Ok(())
    }

    /// Emits the alternate table: one entry per opcode, from its `alt` override or the default
    /// alternate stub.
    pub(crate) fn emit_alternate(&self, out: &mut Outputs) -> Result<(), ConfigErrorKind> {
        let start = self.code_label(self.profile.alt_table_start);
        let end = self.code_label(self.profile.alt_table_end);
        let first_label = self.profile.labels.alternate(self.opcodes.first().name);

        out.asm.push_str(&format!("\n    .global {start}\n"));
        out.asm.push_str(&format!("    .type   {start}, %function\n"));
        out.asm.push_str("    .text\n\n");
        out.asm.push_str(&format!("{start} = {first_label}\n"));

        let mut expander = TemplateExpander::new(self.source, false);
        for op in self.opcodes.iter() {
            let path = match (
                self.settings.alternate.get(op.name),
                &self.settings.default_alt_stub,
            ) {
                (Some(dir), _) => format!("{dir}/ALT_{}{}", op.name, self.profile.asm_ext),
                (None, Some(stub)) => stub.clone(),
                (None, None) => {
                    return Err(DirectiveError::MissingAltStub {
                        opcode: op.name.to_owned(),
                    }
                    .into());
                }
            };
            tracing::debug!("alt emit {path} --> stub");
            let mut scope = self.settings.opcode_scope(op);
            self.emit_header(Table::Alternate, op, &mut out.asm);
            expander.expand(&path, &mut scope, &mut out.asm, None)?;
        }

        out.asm.push_str(&self.align());
        self.emit_size_and_end(&start, &end, &mut out.asm);
        Ok(())
    }

    /// Emits a literal address table with one entry per opcode, in index order.
    pub(crate) fn emit_address_table(&self, table: Table, out: &mut String) {
        let start = match table {
            Table::Primary => self.profile.table_start,
            Table::Alternate => self.profile.alt_table_start,
        };
        out.push_str(&format!("\n    .global {start}\n"));
        out.push_str("    .text\n");
        out.push_str(&format!("{start}:\n"));
        for op in self.opcodes.iter() {
            let label = self.label(table, op.name);
            out.push_str(&format!("    .long {label} /* 0x{:02x} */\n", op.index));
        }
    }

    fn label(&self, table: Table, opcode: &str) -> String {
        match table {
            Table::Primary => self.profile.labels.handler(opcode),
            Table::Alternate => self.profile.labels.alternate(opcode),
        }
    }

    fn is_native(&self, dir: &str) -> bool {
        self.profile.has_stream(Stream::Native)
            && (self.settings.style == Some(HandlerStyle::AllC) || dir == self.profile.native_dir)
    }

    /// Table start/end symbols get a `Code` suffix when a separate address table carries the
    /// plain name.
    fn code_label(&self, label: &str) -> String {
        if self.settings.style == Some(HandlerStyle::JumpTable) {
            format!("{label}Code")
        } else {
            label.to_owned()
        }
    }

    fn align(&self) -> String {
        let bytes = match (self.settings.style, self.settings.handler_size) {
            (Some(HandlerStyle::ComputedGoto), Some(size)) => size.bytes(),
            _ => self.profile.min_align,
        };
        format!("    .balign {bytes}\n")
    }

    fn emit_header(&self, table: Table, op: Opcode<'_>, out: &mut String) {
        let scheme = &self.profile.labels;
        let label = self.label(table, op.name);
        out.push_str(BLOCK_RULE);
        out.push_str(&self.align());
        if scheme.export_handlers {
            out.push_str(&format!("    .global {label}\n"));
        }
        if scheme.annotate_index {
            out.push_str(&format!("{label}: /* 0x{:02x} */\n", op.index));
        } else {
            out.push_str(&format!("{label}:\n"));
        }
    }

    fn emit_stub(
        &self,
        stub: &AsmStub,
        op: Opcode<'_>,
        scope: &Scope<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        self.emit_header(Table::Primary, op, out);
        for (idx, line) in stub.lines.iter().enumerate() {
            let line = substitute(line, scope)
                .map_err(|e| TemplateError::from_subst(e, &stub.path, idx + 1))?;
            out.push_str(&line);
        }
        Ok(())
    }

    fn emit_size_and_end(&self, start: &str, end: &str, out: &mut String) {
        out.push_str(&format!("    .size   {start}, .-{start}\n"));
        out.push_str(&format!("    .global {end}\n"));
        out.push_str(&format!("{end}:\n"));
    }
}

/// A boxed comment that separates major sections of the assembly output.
fn section_comment(title: &str) -> String {
    let rule = "=".repeat(75);
    format!("\n/*\n * {rule}\n *  {title}\n * {rule}\n */\n")
}
