pub mod aggregate;
pub mod cell;
pub mod chunk;
pub mod error;
pub mod file_handler;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod rmsd;

pub use error::*;
