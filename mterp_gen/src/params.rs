// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameter lists carried by `%include` and `%default`.
//!
//! Grammar:
//!
//! ```text
//! list  := '{' entries? '}' | entries?
//! entries := entry (',' entry)* ','?
//! entry := key (':' | '=') value
//! key   := string | ident
//! value := string | integer
//! ```
//!
//! Strings are single- or double-quoted with `\\`, `\"`, `\'`, `\n` and `\t` escapes. Integers are
//! decimal with an optional sign, or `0x` hex. Whitespace is allowed between all tokens.
//!
//! Duplicate keys are allowed; the last one wins.

use core::fmt;

use crate::scope::Value;

/// A malformed parameter list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamError {
    /// Byte offset into the parameter text.
    pub offset: usize,
    /// What was expected.
    pub reason: &'static str,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.reason, self.offset)
    }
}

impl core::error::Error for ParamError {}

/// Parses a parameter list into `(key, value)` pairs in source order.
pub fn parse_params(text: &str) -> Result<Vec<(String, Value)>, ParamError> {
    let mut c = Cursor { src: text, pos: 0 };
    let mut out = Vec::new();

    c.skip_ws();
    let braced = c.eat('{');
    loop {
        c.skip_ws();
        if braced && c.eat('}') {
            break;
        }
        if c.at_end() {
            if braced {
                return Err(c.error("unterminated '{'"));
            }
            break;
        }

        let key = c.key()?;
        c.skip_ws();
        if !(c.eat(':') || c.eat('=')) {
            return Err(c.error("expected ':' or '='"));
        }
        c.skip_ws();
        let value = c.value()?;
        out.push((key, value));

        c.skip_ws();
        if c.eat(',') {
            continue;
        }
        if braced {
            if c.eat('}') {
                break;
            }
            return Err(c.error("expected ',' or '}'"));
        }
        if !c.at_end() {
            return Err(c.error("expected ','"));
        }
    }

    c.skip_ws();
    if !c.at_end() {
        return Err(c.error("unexpected text after parameter list"));
    }
    Ok(out)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &'static str) -> ParamError {
        ParamError {
            offset: self.pos,
            reason,
        }
    }

    fn key(&mut self) -> Result<String, ParamError> {
        match self.peek() {
            Some('"' | '\'') => self.string(),
            Some(ch) if ch == '_' || ch.is_ascii_alphabetic() => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|ch| ch == '_' || ch.is_ascii_alphanumeric())
                {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_owned())
            }
            _ => Err(self.error("expected a key")),
        }
    }

    fn value(&mut self) -> Result<Value, ParamError> {
        match self.peek() {
            Some('"' | '\'') => self.string().map(Value::Str),
            Some(ch) if ch == '-' || ch == '+' || ch.is_ascii_digit() => self.integer(),
            _ => Err(self.error("expected a string or integer value")),
        }
    }

    fn string(&mut self) -> Result<String, ParamError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        let mut s = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ParamError {
                        offset: start,
                        reason: "unterminated string",
                    });
                }
                Some(ch) if ch == quote => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(ch @ ('\\' | '"' | '\'')) => s.push(ch),
                    _ => return Err(self.error("invalid escape")),
                },
                Some(ch) => s.push(ch),
            }
        }
    }

    fn integer(&mut self) -> Result<Value, ParamError> {
        let start = self.pos;
        let negative = if self.eat('-') {
            true
        } else {
            self.eat('+');
            false
        };
        let digits_start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch == '_' || ch.is_ascii_alphanumeric())
        {
            self.bump();
        }
        let digits = &self.src[digits_start..self.pos];
        let magnitude = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => i64::from_str_radix(hex, 16),
            None => digits.parse::<i64>(),
        };
        let Ok(magnitude) = magnitude else {
            return Err(ParamError {
                offset: start,
                reason: "invalid integer",
            });
        };
        Ok(Value::Int(if negative { -magnitude } else { magnitude }))
    }
}
