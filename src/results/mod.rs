mod description;
mod row;

pub use description::ColumnDescription;
pub use row::Row;
pub(crate) use row::index_columns;
