//! Client-side placeholder handling.
//!
//! Statements may use `%(name)s` or `@name` placeholders. Both are resolved into the
//! handle's native `@name` form here; the values themselves travel separately as bound
//! parameters and are never spliced into the SQL text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

mod parsers;
mod scanner;

use parsers::{close_quote, is_block_comment_end, is_block_comment_start, is_line_comment_start};
use scanner::{State, is_identifier_byte, scan_pyformat};

use crate::error::DbApiError;

static TRANSACTION_CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(begin|commit|rollback)(\s+transaction)?\s*;?\s*$")
        .expect("transaction-control pattern must compile")
});

/// True for `BEGIN`, `COMMIT` and `ROLLBACK` (any case, optional `TRANSACTION`, surrounding
/// whitespace ignored). These must go through the connection, not a cursor.
#[must_use]
pub fn is_transaction_control(sql: &str) -> bool {
    TRANSACTION_CONTROL.is_match(sql)
}

/// Rewrite `%(name)s` placeholders to `@name` and `%%` to `%`.
///
/// Quoted strings, quoted identifiers and comments are copied untouched.
/// Returns a borrowed `Cow` when no changes are needed.
/// ```rust
/// use sql_dbapi::translation::translate_placeholders;
///
/// let sql = "insert into t values(%(k)s, @v, '%(not_me)s')";
/// assert_eq!(translate_placeholders(sql)?, "insert into t values(@k, @v, '%(not_me)s')");
/// # Ok::<(), sql_dbapi::DbApiError>(())
/// ```
///
/// # Errors
/// `DbApiError::Programming` when a placeholder runs straight into identifier characters
/// (`%(a)sfoo`), which would otherwise name a different parameter.
pub fn translate_placeholders(sql: &str) -> Result<Cow<'_, str>, DbApiError> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'%' => {
                    if let Some((end, name)) = scan_pyformat(bytes, idx) {
                        if bytes.get(end).is_some_and(|&c| is_identifier_byte(c)) {
                            return Err(DbApiError::programming(format!(
                                "placeholder %({name})s must not be followed directly by identifier characters"
                            )));
                        }
                        let buf = out.get_or_insert_with(String::new);
                        buf.push_str(&sql[copied..idx]);
                        buf.push('@');
                        buf.push_str(name);
                        copied = end;
                        idx = end;
                        continue;
                    } else if bytes.get(idx + 1) == Some(&b'%') {
                        let buf = out.get_or_insert_with(String::new);
                        buf.push_str(&sql[copied..=idx]);
                        copied = idx + 2;
                        idx += 2;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted | State::Backticked => {
                let quote = match state {
                    State::SingleQuoted => b'\'',
                    State::DoubleQuoted => b'"',
                    _ => b'`',
                };
                let (closed, skip) = close_quote(bytes, idx, quote);
                if closed {
                    state = State::Normal;
                }
                idx += skip;
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    Ok(match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn translates_pyformat_to_native() -> Result<(), DbApiError> {
        let sql = "insert into simple(key, val) values(%(k)s, %(v)s)";
        assert_eq!(
            translate_placeholders(sql)?,
            "insert into simple(key, val) values(@k, @v)"
        );
        Ok(())
    }

    #[test]
    fn leaves_native_placeholders_borrowed() -> Result<(), DbApiError> {
        let sql = "select @date";
        let res = translate_placeholders(sql)?;
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
        Ok(())
    }

    #[test]
    fn skips_inside_literals_and_comments() -> Result<(), DbApiError> {
        let sql = "select '%(a)s', %(a)s -- %(b)s\n/* %(c)s */ from t where x = \"%(d)s\"";
        assert_eq!(
            translate_placeholders(sql)?,
            "select '%(a)s', @a -- %(b)s\n/* %(c)s */ from t where x = \"%(d)s\""
        );
        Ok(())
    }

    #[test]
    fn escaped_percent_and_modulo() -> Result<(), DbApiError> {
        assert_eq!(translate_placeholders("select 7 %% 3")?, "select 7 % 3");
        assert_eq!(translate_placeholders("select 7 % 3")?, "select 7 % 3");
        assert_eq!(translate_placeholders("select '%%'")?, "select '%%'");
        Ok(())
    }

    #[test]
    fn keeps_multibyte_text_intact() -> Result<(), DbApiError> {
        let sql = "select 'héllo', %(x)s, 'wörld'";
        assert_eq!(translate_placeholders(sql)?, "select 'héllo', @x, 'wörld'");
        Ok(())
    }

    #[test]
    fn placeholder_glued_to_identifier_is_rejected() -> Result<(), DbApiError> {
        let err = translate_placeholders("select %(a)sfoo").expect_err("glued placeholder");
        assert_eq!(err.kind(), ErrorKind::Programming);
        assert!(err.message().contains("%(a)s"));
        assert_eq!(translate_placeholders("select %(a)s+1, %(b)s)")?, "select @a+1, @b)");
        assert_eq!(translate_placeholders("select '%(a)sfoo'")?, "select '%(a)sfoo'");
        Ok(())
    }

    #[test]
    fn detects_transaction_control() {
        for sql in [" BEGIN TRANSACTION ", "commit", "  rollback   ", "Begin;", "ROLLBACK TRANSACTION"] {
            assert!(is_transaction_control(sql), "{sql}");
        }
        for sql in ["select 1", "begin_date", "insert into t values('commit')", "commit_log"] {
            assert!(!is_transaction_control(sql), "{sql}");
        }
    }
}
