//! Input validation utilities

pub mod upload;

pub use upload::{UploadLimits, UploadValidator};
