pub mod sinks;
pub mod store;
