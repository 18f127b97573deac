pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Closing quote handling shared by the quoted states: a doubled quote is an escape.
/// Returns `(closed, skip)`.
pub(super) fn close_quote(bytes: &[u8], idx: usize, quote: u8) -> (bool, usize) {
    if bytes.get(idx) != Some(&quote) {
        return (false, 0);
    }
    if bytes.get(idx + 1) == Some(&quote) {
        (false, 1)
    } else {
        (true, 0)
    }
}
