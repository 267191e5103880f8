//! Closed enumerations of instruction field encodings, and tables keyed by them.

// lets the derive's `::isa_table` paths resolve inside this crate's own tests
extern crate self as isa_table;

mod encoded;
mod enum_map;

pub use encoded::{Encoded, EncodedIterator};
pub use enum_map::EnumMap;
pub use isa_table_derive::Encoded;
