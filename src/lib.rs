//! Customization composition engine for hosted dashboard plugins.
//!
//! A plugin registers provider rules, decorators, custom widgets, layout
//! mutations and event handlers against a [`CustomizationSession`]. Once the
//! session is sealed the host queries the resulting [`Customizations`]
//! snapshot: which component renders a target, what the effective layout
//! looks like and which handlers run for an event.
//!
//! Modules follow the `mod core;` plus re-export layout so callers import
//! from the module root.

pub mod component;
pub mod decorators;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod plugin;
pub mod registry;
pub mod samples;
pub mod session;
pub mod target;
pub mod widgets;

pub use component::{Component, Markup, Resolver};
pub use decorators::{Decoration, DecoratorChain, DecoratorFactory};
pub use descriptor::PluginDescriptor;
pub use error::{CustomizationError, Result};
pub use events::{
    DASHBOARD_INITIALIZED, DashboardEvent, DispatchReport, EventHandler, EventHandlers,
    FILTER_CONTEXT_CHANGED, HandlerError, HandlerFailure, HandlerResult, RENDER_RESOLVED,
};
pub use host::{
    DEFAULT_ENGINE_VERSION, HostAudit, HostAuditEvent, HostAuditEventBuilder, HostAuditStage,
    HostConfig, HostSettings, LoadedPlugin, NullHostAudit, PluginHandle, PluginHost,
    RecordingHostAudit,
};
pub use layout::{
    GRID_COLUMNS, ItemSize, Layout, LayoutCustomizer, LayoutItem, LayoutMutation, Section,
    SectionHeader, Widget, apply_mutations, resolve_insert_index,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{MetricSnapshot, SessionMetrics};
pub use plugin::DashboardPlugin;
pub use registry::{Category, Predicate, ProviderRule, RuleRegistry};
pub use session::{
    CustomizationSession, Customizations, FilterBarMode, LayoutCustomizerFn, SessionPhase,
};
pub use target::{DashboardContext, RefEquality, Target, TargetKind, TargetRef};
pub use widgets::{CustomWidget, CustomWidgetRegistry};
pub use semver;
