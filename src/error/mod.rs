mod types;

pub use types::{CurtainError, Result};
