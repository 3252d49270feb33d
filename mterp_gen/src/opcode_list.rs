// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters that extract the ordered opcode names from an upstream definition file.
//!
//! These only produce names; cardinality and uniqueness are checked by
//! [`OpcodeTable::new`](crate::opcode_table::OpcodeTable::new).

use core::fmt;

use serde::Deserialize;

/// Format of an opcode list file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpcodeListFormat {
    /// A goto-table definition macro: one `H(OP_<NAME>),` entry per line.
    DexGotoTable,
    /// A template list: one `JIT_TEMPLATE(<NAME>)` entry per line; names get a `TEMPLATE_` prefix.
    JitTemplateList,
    /// JSON: either `["OP_NOP", ...]` or `{ "opcodes": ["OP_NOP", ...] }`.
    Json,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonList {
    Bare(Vec<String>),
    Wrapped { opcodes: Vec<String> },
}

/// Error parsing an opcode list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpcodeListError {
    /// The JSON document was malformed.
    Json {
        /// Parser message.
        message: String,
    },
}

impl fmt::Display for OpcodeListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { message } => write!(f, "invalid opcode list JSON: {message}"),
        }
    }
}

impl core::error::Error for OpcodeListError {}

/// Extracts opcode names from `text` in file order.
pub fn parse_opcode_list(
    text: &str,
    format: OpcodeListFormat,
) -> Result<Vec<String>, OpcodeListError> {
    match format {
        OpcodeListFormat::DexGotoTable => Ok(text
            .lines()
            .filter_map(|line| {
                let rest = line.trim_start().strip_prefix("H(OP_")?;
                let name = leading_word(rest)?;
                rest[name.len()..]
                    .starts_with("),")
                    .then(|| format!("OP_{name}"))
            })
            .collect()),
        OpcodeListFormat::JitTemplateList => Ok(text
            .lines()
            .filter_map(|line| {
                let rest = line.strip_prefix("JIT_TEMPLATE(")?;
                let name = leading_word(rest)?;
                rest[name.len()..]
                    .starts_with(')')
                    .then(|| format!("TEMPLATE_{name}"))
            })
            .collect()),
        OpcodeListFormat::Json => {
            let list: JsonList =
                serde_json::from_str(text).map_err(|e| OpcodeListError::Json {
                    message: e.to_string(),
                })?;
            Ok(match list {
                JsonList::Bare(names) | JsonList::Wrapped { opcodes: names } => names,
            })
        }
    }
}

fn leading_word(s: &str) -> Option<&str> {
    let end = s
        .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goto_table_lines() {
        let text = "\
#define DEFINE_GOTO_TABLE(_name) \\
    static const void* _name[kNumPackedOpcodes] = {                      \\
        /* BEGIN(libdex-goto-table); GENERATED AUTOMATICALLY BY opcode-gen */ \\
        H(OP_NOP),                                                            \\
        H(OP_MOVE),                                                           \\
        H(OP_MOVE_FROM16),                                                    \\
        /* END(libdex-goto-table) */                                          \\
    };
";
        let ops = parse_opcode_list(text, OpcodeListFormat::DexGotoTable).unwrap();
        assert_eq!(ops, vec!["OP_NOP", "OP_MOVE", "OP_MOVE_FROM16"]);
    }

    #[test]
    fn goto_table_requires_trailing_comma() {
        let ops = parse_opcode_list("H(OP_NOP)\nH(OP_MOVE),\n", OpcodeListFormat::DexGotoTable)
            .unwrap();
        assert_eq!(ops, vec!["OP_MOVE"]);
    }

    #[test]
    fn template_list_lines() {
        let text = "\
/* comment */
JIT_TEMPLATE(CMP_LONG)
JIT_TEMPLATE(RETURN)
  JIT_TEMPLATE(INDENTED)
JIT_TEMPLATE(INVOKE_METHOD_NO_OPT)
";
        let ops = parse_opcode_list(text, OpcodeListFormat::JitTemplateList).unwrap();
        assert_eq!(
            ops,
            vec![
                "TEMPLATE_CMP_LONG",
                "TEMPLATE_RETURN",
                "TEMPLATE_INVOKE_METHOD_NO_OPT"
            ]
        );
    }

    #[test]
    fn json_bare_and_wrapped() {
        let bare = parse_opcode_list(r#"["OP_NOP", "OP_MOVE"]"#, OpcodeListFormat::Json).unwrap();
        let wrapped =
            parse_opcode_list(r#"{"opcodes": ["OP_NOP", "OP_MOVE"]}"#, OpcodeListFormat::Json)
                .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare, vec!["OP_NOP", "OP_MOVE"]);
    }

    #[test]
    fn json_errors_are_reported() {
        let err = parse_opcode_list("{\"opcodes\": 3}", OpcodeListFormat::Json).unwrap_err();
        assert!(matches!(err, OpcodeListError::Json { .. }));
    }
}
