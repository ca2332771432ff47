//! Utility modules

pub mod datetime;
pub mod options;
pub mod path;
pub mod sanitize;

pub use datetime::{convert_string_to_date, format_date_input, parse_date_value};
pub use options::{options_from_strings, options_from_variants, to_number_or_default, SelectOption};
pub use path::property_by_path;
pub use sanitize::{sanitize_row, strip_markup};
