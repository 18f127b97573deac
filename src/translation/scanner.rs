#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
}

/// Scan `%(name)s` starting at the `%`; returns the index just past the `s` and the name.
pub(super) fn scan_pyformat(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    if bytes.get(start + 1) != Some(&b'(') {
        return None;
    }
    let name_start = start + 2;
    let name_end = scan_identifier(bytes, name_start)?;
    if bytes.get(name_end) == Some(&b')') && bytes.get(name_end + 1) == Some(&b's') {
        let name = std::str::from_utf8(&bytes[name_start..name_end]).ok()?;
        Some((name_end + 2, name))
    } else {
        None
    }
}

pub(super) fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index one past the identifier starting at `start`, if any.
fn scan_identifier(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start;
    while idx < bytes.len() && is_identifier_byte(bytes[idx]) {
        idx += 1;
    }
    if idx == start { None } else { Some(idx) }
}
