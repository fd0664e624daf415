//! Service layer separating file and codec I/O from pixel logic

pub mod io;

pub use io::ImageIOService;
