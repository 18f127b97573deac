use crate::handle::{HandleError, codes};

use super::{DbApiError, ErrorDetail, ErrorKind};

/// Where in the connection/cursor lifecycle a handle error surfaced.
///
/// The same return code is classified differently depending on the phase: anything that
/// fails while opening a transaction is operational, while a constraint code only becomes
/// an integrity error when it is reported for a statement or at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Begin,
    Execute,
    Fetch,
    Commit,
    Effects,
    Rollback,
}

/// Classify a handle error into the client taxonomy.
#[must_use]
pub fn translate(err: HandleError, phase: Phase) -> DbApiError {
    let kind = match phase {
        Phase::Connect | Phase::Begin | Phase::Effects => ErrorKind::Operational,
        Phase::Commit if is_integrity_code(err.code) => ErrorKind::Integrity,
        Phase::Commit => ErrorKind::Operational,
        Phase::Execute | Phase::Fetch | Phase::Rollback => kind_for_code(err.code),
    };
    tracing::debug!(code = err.code, ?phase, ?kind, "handle error: {}", err.message);
    let detail = ErrorDetail::from_handle(err.code, err.message);
    match kind {
        ErrorKind::Interface => DbApiError::Interface(detail),
        ErrorKind::Operational => DbApiError::Operational(detail),
        ErrorKind::Integrity => DbApiError::Integrity(detail),
        ErrorKind::Programming => DbApiError::Programming(detail),
        ErrorKind::Data => DbApiError::Data(detail),
        ErrorKind::NotSupported => DbApiError::NotSupported(detail),
        ErrorKind::Internal => DbApiError::Internal(detail),
    }
}

fn is_integrity_code(code: i32) -> bool {
    matches!(
        code,
        codes::CONSTRAINTS | codes::FKEY_VIOLATION | codes::NULL_CONSTRAINT | codes::DUPLICATE
    )
}

fn kind_for_code(code: i32) -> ErrorKind {
    match code {
        codes::NOT_CONNECTED
        | codes::PREPARE_ERROR
        | codes::NO_STATEMENT
        | codes::BAD_COLUMN
        | codes::BAD_STATE => ErrorKind::Programming,
        codes::INTERNAL | codes::INVALID_ID | codes::NO_MASTER => ErrorKind::Internal,
        codes::READ_ONLY
        | codes::UNTAGGED_DATABASE
        | codes::TRAN_MODE_UNSUPPORTED
        | codes::NONKLESS
        | codes::NOT_SUPPORTED => ErrorKind::NotSupported,
        codes::CONV_FAIL | codes::TZNAME_FAIL => ErrorKind::Data,
        c if is_integrity_code(c) => ErrorKind::Integrity,
        _ => ErrorKind::Operational,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(code: i32) -> HandleError {
        HandleError::new(code, "boom")
    }

    #[test]
    fn statement_errors_follow_code_table() {
        assert_eq!(translate(err(codes::PREPARE_ERROR), Phase::Execute).kind(), ErrorKind::Programming);
        assert_eq!(translate(err(codes::DUPLICATE), Phase::Execute).kind(), ErrorKind::Integrity);
        assert_eq!(translate(err(codes::CONV_FAIL), Phase::Execute).kind(), ErrorKind::Data);
        assert_eq!(translate(err(codes::NOT_SUPPORTED), Phase::Fetch).kind(), ErrorKind::NotSupported);
        assert_eq!(translate(err(codes::INTERNAL), Phase::Execute).kind(), ErrorKind::Internal);
        assert_eq!(translate(err(codes::DEADLOCK), Phase::Execute).kind(), ErrorKind::Operational);
        assert_eq!(translate(err(42), Phase::Execute).kind(), ErrorKind::Operational);
    }

    #[test]
    fn begin_and_effects_are_always_operational() {
        assert_eq!(translate(err(codes::PREPARE_ERROR), Phase::Begin).kind(), ErrorKind::Operational);
        assert_eq!(translate(err(codes::DUPLICATE), Phase::Effects).kind(), ErrorKind::Operational);
        assert_eq!(translate(err(codes::CONNECT_ERROR), Phase::Connect).kind(), ErrorKind::Operational);
    }

    #[test]
    fn commit_is_integrity_or_operational() {
        assert_eq!(translate(err(codes::CONSTRAINTS), Phase::Commit).kind(), ErrorKind::Integrity);
        assert_eq!(translate(err(codes::NULL_CONSTRAINT), Phase::Commit).kind(), ErrorKind::Integrity);
        assert_eq!(translate(err(codes::PREPARE_ERROR), Phase::Commit).kind(), ErrorKind::Operational);
    }

    #[test]
    fn rollback_surfaces_deferred_syntax_errors() {
        let translated = translate(err(codes::PREPARE_ERROR), Phase::Rollback);
        assert_eq!(translated.kind(), ErrorKind::Programming);
        assert_eq!(translated.code(), Some(codes::PREPARE_ERROR));
        assert_eq!(translated.message(), "boom");
    }
}
