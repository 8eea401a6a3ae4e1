use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::component::{Component, Resolver};
use crate::decorators::DecoratorChain;
use crate::error::Result;
use crate::events::{DashboardEvent, DispatchReport, EventHandler, EventHandlers};
use crate::layout::{Layout, LayoutCustomizer, LayoutMutation, apply_mutations};
use crate::logging::{EVENTS_TARGET, LogLevel, Logger, emit, json_kv};
use crate::metrics::{MetricSnapshot, SessionMetrics};
use crate::registry::{Category, RuleRegistry};
use crate::target::{DashboardContext, Target};
use crate::widgets::{CustomWidget, CustomWidgetRegistry};

/// How the host should render the dashboard filter bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterBarMode {
    #[default]
    Default,
    Hidden,
}

type CustomizerFn = dyn Fn(&DashboardContext, &Layout, &mut LayoutCustomizer) + Send + Sync;

/// Callback that records layout mutations after looking at the base layout.
#[derive(Clone)]
pub struct LayoutCustomizerFn {
    call: Arc<CustomizerFn>,
}

impl LayoutCustomizerFn {
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&DashboardContext, &Layout, &mut LayoutCustomizer) + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(call),
        }
    }

    fn record(&self, ctx: &DashboardContext, base: &Layout) -> Vec<LayoutMutation> {
        let mut customizer = LayoutCustomizer::new();
        (self.call)(ctx, base, &mut customizer);
        customizer.into_mutations()
    }
}

impl fmt::Debug for LayoutCustomizerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LayoutCustomizerFn(..)")
    }
}

/// One entry of the layout batch, kept in registration order.
#[derive(Debug, Clone)]
pub(crate) enum LayoutStep {
    Mutation(LayoutMutation),
    Customizer(LayoutCustomizerFn),
}

/// Registrations collected while a session is open.
#[derive(Debug, Default)]
pub(crate) struct Draft {
    pub(crate) rules: RuleRegistry,
    pub(crate) decorators: DecoratorChain,
    pub(crate) widgets: CustomWidgetRegistry,
    pub(crate) layout: Vec<LayoutStep>,
    pub(crate) handlers: EventHandlers,
    pub(crate) filter_bar_mode: FilterBarMode,
    pub(crate) metrics: SessionMetrics,
}

/// Read-only snapshot produced by sealing a session.
///
/// Every query takes `&self`; the snapshot is `Send + Sync` and meant to be
/// shared behind an `Arc` across concurrent render passes.
pub struct Customizations {
    context: DashboardContext,
    rules: Arc<RuleRegistry>,
    decorators: DecoratorChain,
    widgets: CustomWidgetRegistry,
    layout: Vec<LayoutStep>,
    handlers: EventHandlers,
    filter_bar_mode: FilterBarMode,
    metrics: SessionMetrics,
    logger: Option<Logger>,
    sealed_at: Instant,
}

impl Customizations {
    pub(crate) fn from_draft(
        context: DashboardContext,
        draft: Draft,
        logger: Option<Logger>,
    ) -> Self {
        Self {
            context,
            rules: Arc::new(draft.rules),
            decorators: draft.decorators,
            widgets: draft.widgets,
            layout: draft.layout,
            handlers: draft.handlers,
            filter_bar_mode: draft.filter_bar_mode,
            metrics: draft.metrics,
            logger,
            sealed_at: Instant::now(),
        }
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn resolve_widget(&self, name: &str) -> Result<&CustomWidget> {
        self.widgets.get(name)
    }

    pub fn widget_names(&self) -> impl Iterator<Item = &str> {
        self.widgets.names()
    }

    /// Rule lookup falling back to `base`, wrapped by this category's
    /// decorator chain.
    pub fn effective_resolver(&self, category: Category, base: Resolver) -> Resolver {
        let rules = Arc::clone(&self.rules);
        let matched = Resolver::new(move |ctx, target| {
            rules
                .resolve(category, ctx, target)
                .unwrap_or_else(|| base.resolve(ctx, target))
        });
        self.decorators.build_effective_resolver(category, matched)
    }

    /// Component that renders `target`: the first matching rule's output or
    /// `base`, with every decorator applied. Bumps the `resolutions` counter;
    /// the result never depends on it.
    pub fn resolve_provider(
        &self,
        category: Category,
        target: &Target,
        base: &Component,
    ) -> Component {
        self.metrics.record_resolution();
        self.effective_resolver(category, Resolver::constant(base.clone()))
            .resolve(&self.context, target)
    }

    /// Output of the first matching rule without decorators or fallback.
    pub fn matching_rule(&self, category: Category, target: &Target) -> Option<Component> {
        self.rules.resolve(category, &self.context, target)
    }

    pub(crate) fn decorate(&self, category: Category, resolver: Resolver) -> Resolver {
        self.decorators.build_effective_resolver(category, resolver)
    }

    /// Full mutation batch for `base`, with customizer callbacks expanded in
    /// place.
    pub fn layout_mutations(&self, base: &Layout) -> Vec<LayoutMutation> {
        self.layout
            .iter()
            .flat_map(|step| match step {
                LayoutStep::Mutation(mutation) => vec![mutation.clone()],
                LayoutStep::Customizer(callback) => callback.record(&self.context, base),
            })
            .collect()
    }

    pub fn effective_layout(&self, base: &Layout) -> Result<Layout> {
        apply_mutations(base, &self.layout_mutations(base))
    }

    pub fn handlers_for(&self, event_type: &str) -> Result<&[EventHandler]> {
        self.handlers.handlers_for(event_type)
    }

    pub fn declares_event(&self, event_type: &str) -> bool {
        self.handlers.declares(event_type)
    }

    /// Invoke every handler registered for the event type. Handler failures
    /// are reported, never propagated.
    pub fn dispatch_event(&self, event: &DashboardEvent) -> Result<DispatchReport> {
        let report = self.handlers.dispatch(event)?;
        self.metrics.record_dispatch(report.failures.len());
        for failure in &report.failures {
            emit(
                self.logger.as_ref(),
                LogLevel::Warn,
                EVENTS_TARGET,
                "handler_failed",
                [
                    json_kv("event_type", failure.event_type.as_str()),
                    json_kv("handler_index", failure.handler_index),
                    json_kv("panicked", failure.panicked),
                    json_kv("error", failure.message.as_str()),
                ],
            );
        }
        emit(
            self.logger.as_ref(),
            LogLevel::Debug,
            EVENTS_TARGET,
            "event_dispatched",
            [
                json_kv("event_type", event.event_type.as_str()),
                json_kv("invoked", report.invoked),
                json_kv("failures", report.failures.len()),
                json_kv("correlation_id", json!(event.correlation_id)),
            ],
        );
        Ok(report)
    }

    pub fn filter_bar_mode(&self) -> FilterBarMode {
        self.filter_bar_mode
    }

    pub fn rule_count(&self, category: Category) -> usize {
        self.rules.rule_count(category)
    }

    pub fn decorator_count(&self, category: Category) -> usize {
        self.decorators.decorator_count(category)
    }

    pub fn metrics_snapshot(&self) -> MetricSnapshot {
        self.metrics.snapshot(self.uptime())
    }

    fn uptime(&self) -> Duration {
        self.sealed_at.elapsed()
    }
}

impl fmt::Debug for Customizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customizations")
            .field("context", &self.context)
            .field("rules", &self.rules.total_rules())
            .field("decorators", &self.decorators.total_decorators())
            .field("widgets", &self.widgets.len())
            .field("layout_steps", &self.layout.len())
            .field("handlers", &self.handlers.total_handlers())
            .field("filter_bar_mode", &self.filter_bar_mode)
            .finish()
    }
}
