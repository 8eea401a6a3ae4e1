//! Event handler registration and isolated-failure dispatch.

mod core;

pub use self::core::{
    DASHBOARD_INITIALIZED, DashboardEvent, DispatchReport, EventHandler, EventHandlers,
    FILTER_CONTEXT_CHANGED, HandlerError, HandlerFailure, HandlerResult, RENDER_RESOLVED,
};
