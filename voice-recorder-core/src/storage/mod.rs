pub mod finalizer;
pub mod metadata;
pub mod naming;
pub mod raw_writer;
