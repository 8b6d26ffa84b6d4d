//! Binary parsers for the container file format

mod header_parser;

// Re-export the parsing functions
pub use header_parser::{ContainerHeader, parse_container_header};
