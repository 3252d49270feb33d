// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Config file commands.
//!
//! A config file is processed line by line. Leading and trailing whitespace is trimmed, blank
//! lines and lines whose first token starts with `#` are skipped, and everything else is split on
//! whitespace. The first token names a [`Command`].

use core::fmt;

use crate::profile::Profile;

/// One parsed config line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `handler-style <style>`
    HandlerStyle(&'a str),
    /// `handler-size <bytes>`
    HandlerSize(&'a str),
    /// `import <path>`
    Import(&'a str),
    /// `asm-stub <path>`
    AsmStub(&'a str),
    /// `asm-alt-stub <path>`
    AsmAltStub(&'a str),
    /// `op-start <dir>`
    OpStart(&'a str),
    /// `op <opcode> <dir>`
    Op {
        /// Opcode name.
        opcode: &'a str,
        /// Override directory.
        dir: &'a str,
    },
    /// `alt <opcode> <dir>`
    Alt {
        /// Opcode name.
        opcode: &'a str,
        /// Override directory holding `ALT_<opcode>` fragments.
        dir: &'a str,
    },
    /// `op-end`
    OpEnd,
    /// `alt-ops`
    AltOps,
    /// `split-ops`
    SplitOps,
}

impl<'a> Command<'a> {
    /// Splits a config line into tokens.
    ///
    /// Returns `None` for blank lines and comments.
    #[must_use]
    pub fn tokenize(line: &'a str) -> Option<Vec<&'a str>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first() {
            None => None,
            Some(first) if first.starts_with('#') => None,
            Some(_) => Some(tokens),
        }
    }

    /// Parses a tokenized line. Commands not enabled by `profile` are unrecognized.
    pub fn parse(tokens: &[&'a str], profile: &Profile) -> Result<Self, DirectiveError> {
        let Some((&name, args)) = tokens.split_first() else {
            return Err(DirectiveError::Unknown {
                command: String::new(),
            });
        };

        let cmd = match name {
            "handler-style" if profile.has_styles => Self::HandlerStyle(one(name, args)?),
            "handler-size" => Self::HandlerSize(one(name, args)?),
            "import" => Self::Import(one(name, args)?),
            "asm-stub" => Self::AsmStub(one(name, args)?),
            "asm-alt-stub" if profile.alt_tables => Self::AsmAltStub(one(name, args)?),
            "op-start" => Self::OpStart(one(name, args)?),
            "op" => {
                let (opcode, dir) = two(name, args)?;
                Self::Op { opcode, dir }
            }
            "alt" if profile.alt_tables => {
                let (opcode, dir) = two(name, args)?;
                Self::Alt { opcode, dir }
            }
            "op-end" => none(name, args, Self::OpEnd)?,
            "alt-ops" if profile.alt_tables => none(name, args, Self::AltOps)?,
            "split-ops" if profile.alt_tables => none(name, args, Self::SplitOps)?,
            _ => {
                return Err(DirectiveError::Unknown {
                    command: name.to_owned(),
                });
            }
        };
        Ok(cmd)
    }

    /// The command word as written in the config file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HandlerStyle(_) => "handler-style",
            Self::HandlerSize(_) => "handler-size",
            Self::Import(_) => "import",
            Self::AsmStub(_) => "asm-stub",
            Self::AsmAltStub(_) => "asm-alt-stub",
            Self::OpStart(_) => "op-start",
            Self::Op { .. } => "op",
            Self::Alt { .. } => "alt",
            Self::OpEnd => "op-end",
            Self::AltOps => "alt-ops",
            Self::SplitOps => "split-ops",
        }
    }
}

fn arity(command: &str, expected: &'static str) -> DirectiveError {
    DirectiveError::Arity {
        command: command.to_owned(),
        expected,
    }
}

fn one<'a>(command: &str, args: &[&'a str]) -> Result<&'a str, DirectiveError> {
    match args {
        [a] => Ok(*a),
        _ => Err(arity(command, "exactly one argument")),
    }
}

fn two<'a>(command: &str, args: &[&'a str]) -> Result<(&'a str, &'a str), DirectiveError> {
    match args {
        [a, b] => Ok((*a, *b)),
        _ => Err(arity(command, "exactly two arguments")),
    }
}

fn none<'a>(command: &str, args: &[&str], cmd: Command<'a>) -> Result<Command<'a>, DirectiveError> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(arity(command, "no arguments"))
    }
}

/// A malformed, misordered or invalid config command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectiveError {
    /// The command word is not recognized by the active profile.
    Unknown {
        /// The command word.
        command: String,
    },
    /// Wrong number of arguments.
    Arity {
        /// The command word.
        command: String,
        /// Expected argument count, in words.
        expected: &'static str,
    },
    /// A command appeared before `handler-style`.
    StyleNotFirst {
        /// The offending command word.
        command: String,
    },
    /// `handler-style` appeared twice.
    StyleAlreadySet,
    /// Unknown style name.
    InvalidStyle {
        /// The name given.
        name: String,
    },
    /// `handler-size` appeared twice.
    HandlerSizeAlreadySet,
    /// `handler-size` value is not an integer.
    HandlerSizeNotInteger {
        /// The text given.
        value: String,
    },
    /// `handler-size` value is zero, negative, or not a power of two.
    HandlerSizeNotPowerOfTwo {
        /// The value given.
        value: i64,
    },
    /// `computed-goto` style requires `handler-size` before `op-end`.
    MissingHandlerSize,
    /// `import` of a file whose extension selects no output stream.
    UnknownImportKind {
        /// The path given.
        path: String,
    },
    /// `op-start` appeared twice.
    OpStartRepeated,
    /// `op` or `alt` outside the `op-start` / `op-end` bracket.
    OutsideBracket {
        /// The command word.
        command: String,
    },
    /// `op-end` without an open bracket.
    OpEndOutOfOrder,
    /// `op` or `alt` named an opcode not in the opcode table.
    UnknownOpcode {
        /// The name given.
        name: String,
    },
    /// `alt-ops` before `op-end`.
    AltOpsBeforeOpEnd,
    /// `alt-ops` appeared twice.
    AltOpsRepeated,
    /// `split-ops` after `op-end`.
    SplitOpsAfterOpEnd,
    /// `asm-alt-stub` after the alternate tables were emitted.
    AltStubAfterAltPass,
    /// The alternate table needs a stub for an opcode without an `alt` override.
    MissingAltStub {
        /// The first opcode left without an alternate entry.
        opcode: String,
    },
    /// An opcode outside `all-c` style is implemented in C, but no `asm-stub` gives it an
    /// assembly entry point.
    MissingAsmStub {
        /// The first opcode left without an entry point.
        opcode: String,
    },
    /// The config ended before the opcode bracket was closed.
    Unterminated,
    /// `split-ops` deferred the alternate tables, but no `alt-ops` followed.
    AltOpsMissing,
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { command } => write!(f, "unrecognized command '{command}'"),
            Self::Arity { command, expected } => write!(f, "{command} takes {expected}"),
            Self::StyleNotFirst { command } => {
                write!(f, "handler-style must be first command (found '{command}')")
            }
            Self::StyleAlreadySet => f.write_str("handler-style may only be set once"),
            Self::InvalidStyle { name } => write!(f, "handler-style ({name}) invalid"),
            Self::HandlerSizeAlreadySet => f.write_str("handler-size may only be set once"),
            Self::HandlerSizeNotInteger { value } => {
                write!(f, "handler-size ({value}) is not an integer")
            }
            Self::HandlerSizeNotPowerOfTwo { value } => {
                write!(f, "handler-size ({value}) must be power of 2 and > 0")
            }
            Self::MissingHandlerSize => {
                f.write_str("computed-goto handlers require handler-size before op-end")
            }
            Self::UnknownImportKind { path } => {
                write!(f, "don't know how to import {path}")
            }
            Self::OpStartRepeated => f.write_str("op-start can only be specified once"),
            Self::OutsideBracket { command } => {
                write!(f, "{command} statements must be between op-start/op-end")
            }
            Self::OpEndOutOfOrder => f.write_str("op-end must follow op-start, and only appear once"),
            Self::UnknownOpcode { name } => write!(f, "unknown opcode {name}"),
            Self::AltOpsBeforeOpEnd => f.write_str("alt-ops can be specified only after op-end"),
            Self::AltOpsRepeated => f.write_str("alt-ops can only be specified once"),
            Self::SplitOpsAfterOpEnd => f.write_str("split-ops must precede op-end"),
            Self::AltStubAfterAltPass => {
                f.write_str("asm-alt-stub after the alternate table was emitted")
            }
            Self::MissingAltStub { opcode } => {
                write!(f, "no asm-alt-stub for {opcode}, which has no alt override")
            }
            Self::MissingAsmStub { opcode } => {
                write!(f, "{opcode} is implemented in C but no asm-stub was loaded")
            }
            Self::Unterminated => f.write_str("config ended without op-start/op-end"),
            Self::AltOpsMissing => f.write_str("split-ops requires a later alt-ops"),
        }
    }
}

impl core::error::Error for DirectiveError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command<'_>, DirectiveError> {
        let tokens = Command::tokenize(line).unwrap();
        Command::parse(&tokens, &Profile::MTERP)
    }

    #[test]
    fn blank_and_comment_lines_have_no_tokens() {
        assert_eq!(Command::tokenize(""), None);
        assert_eq!(Command::tokenize("   \t  "), None);
        assert_eq!(Command::tokenize("# Set handler style"), None);
        assert_eq!(Command::tokenize("  #op OP_NOP c"), None);
    }

    #[test]
    fn any_whitespace_separates_tokens() {
        assert_eq!(
            Command::tokenize("  op \tOP_NOP   armv5te  ").unwrap(),
            vec!["op", "OP_NOP", "armv5te"]
        );
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse("handler-style computed-goto").unwrap(),
            Command::HandlerStyle("computed-goto")
        );
        assert_eq!(parse("handler-size 64").unwrap(), Command::HandlerSize("64"));
        assert_eq!(
            parse("import c/header.cpp").unwrap(),
            Command::Import("c/header.cpp")
        );
        assert_eq!(
            parse("asm-stub armv5te/stub.S").unwrap(),
            Command::AsmStub("armv5te/stub.S")
        );
        assert_eq!(
            parse("asm-alt-stub armv5te/alt_stub.S").unwrap(),
            Command::AsmAltStub("armv5te/alt_stub.S")
        );
        assert_eq!(parse("op-start armv5te").unwrap(), Command::OpStart("armv5te"));
        assert_eq!(
            parse("op OP_NOP c").unwrap(),
            Command::Op {
                opcode: "OP_NOP",
                dir: "c"
            }
        );
        assert_eq!(
            parse("alt OP_NOP armv7").unwrap(),
            Command::Alt {
                opcode: "OP_NOP",
                dir: "armv7"
            }
        );
        assert_eq!(parse("op-end").unwrap(), Command::OpEnd);
        assert_eq!(parse("alt-ops").unwrap(), Command::AltOps);
        assert_eq!(parse("split-ops").unwrap(), Command::SplitOps);
    }

    #[test]
    fn wrong_argument_counts() {
        for line in [
            "handler-style",
            "handler-size 64 128",
            "op OP_NOP",
            "op OP_NOP a b",
            "op-end now",
            "split-ops 1",
        ] {
            assert!(
                matches!(parse(line), Err(DirectiveError::Arity { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(
            parse("op-begin armv5te").unwrap_err(),
            DirectiveError::Unknown {
                command: "op-begin".into()
            }
        );
    }

    #[test]
    fn profile_gates_optional_commands() {
        for line in [
            "handler-style all-c",
            "alt OP_NOP x",
            "asm-alt-stub s.S",
            "alt-ops",
            "split-ops",
        ] {
            let tokens = Command::tokenize(line).unwrap();
            assert!(
                matches!(
                    Command::parse(&tokens, &Profile::TEMPLATE),
                    Err(DirectiveError::Unknown { .. })
                ),
                "{line}"
            );
        }
        let tokens = Command::tokenize("handler-size 32").unwrap();
        assert_eq!(
            Command::parse(&tokens, &Profile::TEMPLATE).unwrap(),
            Command::HandlerSize("32")
        );
    }

    #[test]
    fn names_round_trip_through_parse() {
        let cmd = parse("op OP_NOP c").unwrap();
        assert_eq!(cmd.name(), "op");
        assert_eq!(parse("alt-ops").unwrap().name(), "alt-ops");
    }
}
