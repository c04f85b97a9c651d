pub mod error;
pub mod value;

pub use error::ErrorKind;
pub use value::{
    SERIAL_EPOCH, SERIAL_MAX, Value, date_to_serial, datetime_to_serial, format_number,
    parse_invariant_number, serial_to_date, serial_to_datetime,
};
