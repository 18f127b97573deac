//! Convenient imports for common functionality.

pub use crate::codec::Params;
pub use crate::config::ConnectOptions;
pub use crate::connection::{Connection, connect, connect_with};
pub use crate::cursor::{Cursor, CursorState};
pub use crate::error::{DbApiError, ErrorKind};
pub use crate::handle::{Connector, Handle};
pub use crate::params;
pub use crate::results::{ColumnDescription, Row};
pub use crate::types::{Binary, ColumnType, Datetime, TypeTag, Value};
