pub mod bit_utils;
pub mod error;
pub mod metadata;
pub mod options;

pub use error::*;
pub use metadata::*;
pub use options::*;
