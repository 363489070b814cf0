mod headers;

pub use headers::parse_header;
