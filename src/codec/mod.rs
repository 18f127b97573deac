//! Conversion between host values and the handle's wire values.

mod datetime;
mod decode;
mod params;

pub use datetime::round_to_millis;
pub use decode::{decode_row, decode_value};
pub use params::{BoundParams, Params, bind_params, bind_value};
