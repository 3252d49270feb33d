// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fragment expansion.
//!
//! A fragment is plain text. Lines starting in column 0 with one of these directives are
//! interpreted; every other line is placeholder-substituted (see [`crate::subst`]) and written
//! out:
//!
//! - `%include <path> [params]`: expand another fragment with a child scope holding `params`.
//! - `%default <params>`: bind each parameter unless some enclosing scope already binds it.
//! - `%verify ...`: reserved; ignored.
//! - `%break`: the rest of this fragment (and everything it includes) is continuation code and
//!   goes to the [`SisterBuffer`] instead of the output, when the caller supplied one and
//!   relocation is enabled. Otherwise it is ignored.
//!
//! Each fragment is preceded by a `/* File: <path> */` marker and followed by one blank line.

use core::fmt;

use crate::params::parse_params;
use crate::scope::Scope;
use crate::source::FragmentSource;
use crate::subst::{SubstError, substitute};

const CONTINUATION_HEADER: &str = "\n/* continuation for ${opcode} */\n";

/// Cold continuation code collected across all handlers, flushed once after the table.
#[derive(Clone, Debug, Default)]
pub struct SisterBuffer {
    chunks: Vec<String>,
}

impl SisterBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one piece of text.
    pub fn push(&mut self, text: impl Into<String>) {
        self.chunks.push(text.into());
    }

    /// Returns `true` if nothing was diverted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The collected pieces, in the order they were diverted.
    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Concatenation of all pieces.
    #[must_use]
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

/// Fragment expansion failures. All of them abort the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// A fragment could not be read.
    Unreadable {
        /// Fragment path.
        path: String,
        /// I/O error text.
        message: String,
    },
    /// A directive line had a missing or malformed argument.
    MalformedDirective {
        /// Fragment containing the directive.
        path: String,
        /// 1-based line within the fragment.
        line: usize,
        /// The directive word, e.g. `%include`.
        directive: &'static str,
        /// What was wrong.
        reason: String,
    },
    /// A fragment included itself.
    SelfInclude {
        /// The fragment path.
        path: String,
    },
    /// A fragment included one of the fragments currently being expanded.
    IncludeCycle {
        /// Active fragments, outermost first, ending with the repeated path.
        chain: Vec<String>,
    },
    /// A placeholder named a key with no binding.
    Unresolved {
        /// Fragment path.
        path: String,
        /// 1-based line within the fragment.
        line: usize,
        /// The missing key.
        key: String,
    },
    /// A `$` that starts neither a placeholder nor `$$`.
    InvalidPlaceholder {
        /// Fragment path.
        path: String,
        /// 1-based line within the fragment.
        line: usize,
        /// 1-based column of the `$`.
        column: usize,
    },
}

impl TemplateError {
    pub(crate) fn from_subst(err: SubstError, path: &str, line: usize) -> Self {
        match err {
            SubstError::Unresolved { key } => Self::Unresolved {
                path: path.to_owned(),
                line,
                key,
            },
            SubstError::Invalid { column } => Self::InvalidPlaceholder {
                path: path.to_owned(),
                line,
                column,
            },
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, message } => write!(f, "unable to read {path}: {message}"),
            Self::MalformedDirective {
                path,
                line,
                directive,
                reason,
            } => write!(f, "malformed {directive} in {path}:{line}: {reason}"),
            Self::SelfInclude { path } => write!(f, "self-referential %include in {path}"),
            Self::IncludeCycle { chain } => {
                write!(f, "%include cycle: {}", chain.join(" -> "))
            }
            Self::Unresolved { path, line, key } => {
                write!(f, "keyword substitution failed in {path}:{line}: '{key}'")
            }
            Self::InvalidPlaceholder { path, line, column } => {
                write!(f, "invalid placeholder in {path}:{line}:{column}")
            }
        }
    }
}

impl core::error::Error for TemplateError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Directive {
    Include,
    Default,
    Verify,
    Break,
}

impl Directive {
    /// Splits a directive line into the directive and its argument text.
    fn parse(line: &str) -> Option<(Self, &str)> {
        let body = line.strip_prefix('%')?;
        let word_end = body.find(char::is_whitespace).unwrap_or(body.len());
        let directive = match &body[..word_end] {
            "include" => Self::Include,
            "default" => Self::Default,
            "verify" => Self::Verify,
            "break" => Self::Break,
            _ => return None,
        };
        Some((directive, body[word_end..].trim()))
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Include => "%include",
            Self::Default => "%default",
            Self::Verify => "%verify",
            Self::Break => "%break",
        }
    }
}

/// Expands fragments read from a [`FragmentSource`].
pub struct TemplateExpander<'s> {
    source: &'s dyn FragmentSource,
    relocate: bool,
    active: Vec<String>,
}

impl<'s> TemplateExpander<'s> {
    /// Creates an expander. `relocate` enables `%break` diversion into a sister buffer.
    #[must_use]
    pub fn new(source: &'s dyn FragmentSource, relocate: bool) -> Self {
        Self {
            source,
            relocate,
            active: Vec::new(),
        }
    }

    /// Expands the fragment at `path` into `out`.
    ///
    /// `%default` directives at the top level of the fragment bind into `scope`. Continuation
    /// code after `%break` goes to `sister` when it is `Some` and relocation is enabled.
    pub fn expand(
        &mut self,
        path: &str,
        scope: &mut Scope<'_>,
        out: &mut String,
        sister: Option<&mut SisterBuffer>,
    ) -> Result<(), TemplateError> {
        self.active.clear();
        self.expand_fragment(path, scope, out, sister, false)
    }

    fn expand_fragment(
        &mut self,
        path: &str,
        scope: &mut Scope<'_>,
        out: &mut String,
        mut sister: Option<&mut SisterBuffer>,
        diverted: bool,
    ) -> Result<(), TemplateError> {
        let text = self
            .source
            .read(path)
            .map_err(|e| TemplateError::Unreadable {
                path: path.to_owned(),
                message: e.to_string(),
            })?;

        write_to(
            out,
            sister.as_deref_mut(),
            diverted,
            format!("/* File: {path} */\n"),
        );
        self.active.push(path.to_owned());
        let result = self.expand_lines(path, &text, scope, out, sister.as_deref_mut(), diverted);
        self.active.pop();
        result?;
        write_to(out, sister, diverted, "\n".to_owned());
        Ok(())
    }

    fn expand_lines(
        &mut self,
        path: &str,
        text: &str,
        scope: &mut Scope<'_>,
        out: &mut String,
        mut sister: Option<&mut SisterBuffer>,
        mut diverted: bool,
    ) -> Result<(), TemplateError> {
        for (idx, line) in text.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let Some((directive, args)) = Directive::parse(line) else {
                let expanded = substitute(line, scope)
                    .map_err(|e| TemplateError::from_subst(e, path, line_no))?;
                write_to(out, sister.as_deref_mut(), diverted, expanded);
                continue;
            };

            let malformed = |reason: String| TemplateError::MalformedDirective {
                path: path.to_owned(),
                line: line_no,
                directive: directive.name(),
                reason,
            };

            match directive {
                Directive::Include => {
                    let (target, params) = split_include(args).map_err(malformed)?;
                    let params = parse_params(params).map_err(|e| malformed(e.to_string()))?;
                    if target == path {
                        return Err(TemplateError::SelfInclude {
                            path: path.to_owned(),
                        });
                    }
                    if self.active.iter().any(|p| p == target) {
                        let mut chain = self.active.clone();
                        chain.push(target.to_owned());
                        return Err(TemplateError::IncludeCycle { chain });
                    }

                    let mut child = scope.child();
                    for (key, value) in params {
                        child.bind(key, value);
                    }
                    self.expand_fragment(target, &mut child, out, sister.as_deref_mut(), diverted)?;
                }
                Directive::Default => {
                    if args.is_empty() {
                        return Err(malformed("missing parameter list".to_owned()));
                    }
                    let params = parse_params(args).map_err(|e| malformed(e.to_string()))?;
                    for (key, value) in params {
                        scope.set_default(key, value);
                    }
                }
                Directive::Verify => {}
                Directive::Break => {
                    if diverted || !self.relocate {
                        continue;
                    }
                    if let Some(buf) = sister.as_deref_mut() {
                        let header = substitute(CONTINUATION_HEADER, scope)
                            .map_err(|e| TemplateError::from_subst(e, path, line_no))?;
                        buf.push(header);
                        diverted = true;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_to(out: &mut String, sister: Option<&mut SisterBuffer>, diverted: bool, text: String) {
    match sister {
        Some(buf) if diverted => buf.push(text),
        _ => out.push_str(&text),
    }
}

/// Splits `%include` arguments into the (unquoted) fragment path and the parameter text.
fn split_include(args: &str) -> Result<(&str, &str), String> {
    if args.is_empty() {
        return Err("missing fragment path".to_owned());
    }
    if let Some(quoted) = args.strip_prefix('"') {
        let Some(end) = quoted.find('"') else {
            return Err("unterminated fragment path".to_owned());
        };
        let path = &quoted[..end];
        if path.is_empty() {
            return Err("empty fragment path".to_owned());
        }
        return Ok((path, quoted[end + 1..].trim()));
    }
    let end = args.find(char::is_whitespace).unwrap_or(args.len());
    Ok((&args[..end], args[end..].trim()))
}
