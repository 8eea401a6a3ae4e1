mod types;

pub use types::{CustomizationError, Result};
