//! Target references and the dashboard context passed to customizations.

mod core;

pub use self::core::{DashboardContext, RefEquality, Target, TargetKind, TargetRef};
