//! Reading and writing delimited metadata tables and auxiliary mapping files.

pub mod mapping_file;
pub mod table_io;

pub use mapping_file::{load_mapping, parse_mapping};
pub use table_io::{
    TAB, delimiter_byte, load_table, read_table, table_to_string, write_table, write_table_to,
};
