pub mod config;
pub mod env;
pub mod error;
pub mod simulation;
pub mod utils;

pub use config::*;
pub use env::*;
pub use error::{HighwayError, Result};
pub use simulation::*;
