pub mod capture_delegate;
pub mod capture_source;
pub mod decoder;
