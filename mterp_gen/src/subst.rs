// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placeholder substitution.
//!
//! `$name` and `${name}` are replaced by the scope binding for `name`; `$$` is a literal `$`.
//! Names match `[A-Za-z_][A-Za-z0-9_]*`.

use core::fmt;

use crate::scope::Scope;

/// A substitution failure within one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubstError {
    /// A well-formed placeholder named a key with no binding.
    Unresolved {
        /// The missing key.
        key: String,
    },
    /// A `$` that does not start a placeholder or an escape.
    Invalid {
        /// 1-based column of the `$`.
        column: usize,
    },
}

impl fmt::Display for SubstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved { key } => write!(f, "no value bound for '{key}'"),
            Self::Invalid { column } => write!(f, "invalid placeholder at column {column}"),
        }
    }
}

impl core::error::Error for SubstError {}

/// Expands every placeholder in `line` against `scope`.
pub fn substitute(line: &str, scope: &Scope<'_>) -> Result<String, SubstError> {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        out.push_str(&line[literal_start..i]);
        let invalid = SubstError::Invalid { column: i + 1 };

        i = match bytes.get(i + 1) {
            Some(b'$') => {
                out.push('$');
                i + 2
            }
            Some(b'{') => {
                let start = i + 2;
                let end = ident_end(bytes, start);
                if end == start || bytes.get(end) != Some(&b'}') {
                    return Err(invalid);
                }
                push_binding(&mut out, &line[start..end], scope)?;
                end + 1
            }
            _ => {
                let start = i + 1;
                let end = ident_end(bytes, start);
                if end == start {
                    return Err(invalid);
                }
                push_binding(&mut out, &line[start..end], scope)?;
                end
            }
        };
        literal_start = i;
    }

    out.push_str(&line[literal_start..]);
    Ok(out)
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    match bytes.get(start) {
        Some(b) if *b == b'_' || b.is_ascii_alphabetic() => {}
        _ => return start,
    }
    let mut end = start + 1;
    while bytes
        .get(end)
        .is_some_and(|b| *b == b'_' || b.is_ascii_alphanumeric())
    {
        end += 1;
    }
    end
}

fn push_binding(out: &mut String, key: &str, scope: &Scope<'_>) -> Result<(), SubstError> {
    let value = scope.get(key).ok_or_else(|| SubstError::Unresolved {
        key: key.to_owned(),
    })?;
    out.push_str(&value.to_string());
    Ok(())
}
