//! Common types shared by the tailor shop gateway crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
