//! Helpers for exercising connections and cursors without a database.
//!
//! [`MockConnector`] hands out scripted handles that record every statement they are sent,
//! so tests can check exactly what reached the wire and inject failures at each step.

mod helpers;
mod mock;

pub use helpers::{create_test_row, int_column, text_column};
pub use mock::{MockConnector, MockHandle, Response};
