pub mod config;

pub use cdcflat_api_derive::ConfigParams;
pub mod error;
pub mod ffi;
pub mod transform;
