//! Customization session: the Open to Sealed registration lifecycle and the
//! sealed snapshot queried by the host.

mod core;
mod snapshot;

pub use self::core::{CustomizationSession, SessionPhase};
pub use snapshot::{Customizations, FilterBarMode, LayoutCustomizerFn};
