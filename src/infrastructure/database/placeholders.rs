//! Positional (`?`) to named (`@paramN`) placeholder translation.
//!
//! SQL Server only accepts named parameters, while the persistence layer writes
//! portable statements with `?`. The translator walks the statement with a small
//! tokenizer so that question marks inside string literals, quoted identifiers
//! and comments are left alone.
//!
//! A `NULL` parameter is written into the statement as the literal `null`
//! instead of being bound. Numbering stays positional: the third `?` is always
//! `@param3`, whatever happened to the first two.

use super::error::ConnectorError;
use super::value::SqlValue;

/// Prefix of every generated parameter name.
pub const PARAM_PREFIX: &str = "param";

/// A named parameter produced by the translator.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    /// Name without the leading `@`, e.g. `param1`.
    pub name: String,
    pub value: SqlValue,
}

/// A statement rewritten for a named-parameter backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStatement {
    pub sql: String,
    pub params: Vec<NamedParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment,
}

/// Byte offsets of every `?` that is a real placeholder.
fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut offsets = Vec::new();
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            State::Code => match b {
                b'?' => offsets.push(i),
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                b'-' if next == Some(b'-') => {
                    state = State::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    // '' is an escaped quote inside the literal
                    if next == Some(b'\'') {
                        i += 1;
                    } else {
                        state = State::Code;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    state = State::Code;
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    i += 1;
                }
            }
        }

        i += 1;
    }

    offsets
}

/// Counts the placeholders of a statement.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

/// Rewrites every `?` of `sql` into `@param1..N`, left to right.
///
/// # Errors
///
/// Returns [`ConnectorError::ParameterCount`] when the number of placeholders
/// differs from `params.len()`.
///
/// # Examples
///
/// ```ignore
/// let stmt = translate_placeholders("SELECT * FROM link WHERE id = ?", &[SqlValue::Int(1)])?;
/// assert_eq!(stmt.sql, "SELECT * FROM link WHERE id = @param1");
/// assert_eq!(stmt.params[0].name, "param1");
/// ```
pub fn translate_placeholders(
    sql: &str,
    params: &[SqlValue],
) -> Result<NamedStatement, ConnectorError> {
    let offsets = placeholder_offsets(sql);

    if offsets.len() != params.len() {
        return Err(ConnectorError::ParameterCount {
            placeholders: offsets.len(),
            params: params.len(),
        });
    }

    let mut out = String::with_capacity(sql.len() + offsets.len() * 8);
    let mut named = Vec::with_capacity(params.len());
    let mut last = 0;

    for (index, (offset, value)) in offsets.iter().zip(params).enumerate() {
        out.push_str(&sql[last..*offset]);

        if value.is_null() {
            out.push_str("null");
        } else {
            let name = format!("{PARAM_PREFIX}{}", index + 1);
            out.push('@');
            out.push_str(&name);
            named.push(NamedParam {
                name,
                value: value.clone(),
            });
        }

        last = offset + 1;
    }
    out.push_str(&sql[last..]);

    Ok(NamedStatement {
        sql: out,
        params: named,
    })
}
