use crate::handle::ColumnMeta;
use crate::types::ColumnType;

/// One entry of [`Cursor::description`](crate::Cursor::description).
///
/// Only `name` and `type_code` are populated; the remaining five fields are reserved by the
/// standard interface and always `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    /// Compare against [`STRING`](crate::STRING), [`NUMBER`](crate::NUMBER), ...
    pub type_code: ColumnType,
    pub display_size: Option<usize>,
    pub internal_size: Option<usize>,
    pub precision: Option<usize>,
    pub scale: Option<usize>,
    pub null_ok: Option<bool>,
}

impl ColumnDescription {
    #[must_use]
    pub fn new(name: impl Into<String>, type_code: ColumnType) -> Self {
        Self {
            name: name.into(),
            type_code,
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: None,
        }
    }
}

impl From<&ColumnMeta> for ColumnDescription {
    fn from(meta: &ColumnMeta) -> Self {
        Self::new(meta.name.clone(), meta.column_type)
    }
}
