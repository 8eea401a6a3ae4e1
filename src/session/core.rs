use std::sync::Arc;

use serde_json::Value;

use crate::component::{Component, Resolver};
use crate::decorators::DecoratorFactory;
use crate::error::{CustomizationError, Result};
use crate::events::{DashboardEvent, DispatchReport, EventHandler};
use crate::layout::{Layout, LayoutCustomizer, LayoutMutation};
use crate::logging::{LogLevel, Logger, SESSION_TARGET, emit, json_kv};
use crate::registry::{Category, Predicate};
use crate::target::{DashboardContext, Target};
use crate::widgets::CustomWidget;

use super::snapshot::{Customizations, Draft, FilterBarMode, LayoutCustomizerFn, LayoutStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Open,
    Sealed,
}

#[derive(Debug)]
enum SessionState {
    Open(Draft),
    Sealed(Arc<Customizations>),
}

/// Registration facade handed to a plugin.
///
/// Mutators are accepted while the session is open. [`seal`](Self::seal)
/// freezes everything into a shared [`Customizations`] snapshot; after that
/// every mutator fails with [`CustomizationError::SessionSealed`] and the
/// query methods become available.
#[derive(Debug)]
pub struct CustomizationSession {
    context: DashboardContext,
    state: SessionState,
    logger: Option<Logger>,
}

impl CustomizationSession {
    pub fn new(context: DashboardContext) -> Self {
        Self {
            context,
            state: SessionState::Open(Draft::default()),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Open(_) => SessionPhase::Open,
            SessionState::Sealed(_) => SessionPhase::Sealed,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.phase() == SessionPhase::Sealed
    }

    // Registration API

    /// Registers a custom widget type. A repeated name replaces the earlier
    /// registration.
    pub fn register_widget(
        &mut self,
        name: &str,
        component: Component,
        default_props: Option<Value>,
    ) -> Result<&mut Self> {
        let draft = self.draft_mut("register_widget")?;
        let replaced = draft
            .widgets
            .register(name, CustomWidget::new(component, default_props))
            .is_some();
        draft.metrics.record_widget(replaced);
        if replaced {
            self.log(LogLevel::Debug, "widget_overwritten", [json_kv("widget", name)]);
        }
        Ok(self)
    }

    pub fn add_layout_mutation(&mut self, mutation: LayoutMutation) -> Result<&mut Self> {
        let draft = self.draft_mut("add_layout_mutation")?;
        draft.layout.push(LayoutStep::Mutation(mutation));
        draft.metrics.record_layout_mutations(1);
        Ok(self)
    }

    /// Registers a callback that records mutations against the base layout
    /// when the effective layout is computed. Its mutations run at this
    /// position in the batch.
    pub fn customize_layout<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: Fn(&DashboardContext, &Layout, &mut LayoutCustomizer) + Send + Sync + 'static,
    {
        let draft = self.draft_mut("customize_layout")?;
        draft
            .layout
            .push(LayoutStep::Customizer(LayoutCustomizerFn::new(callback)));
        Ok(self)
    }

    pub fn add_provider_rule(
        &mut self,
        category: Category,
        predicate: Predicate,
        resolver: Resolver,
    ) -> Result<&mut Self> {
        let draft = self.draft_mut("add_provider_rule")?;
        draft.rules.add_rule(category, predicate, resolver);
        draft.metrics.record_rule();
        Ok(self)
    }

    /// Catch-all provider; equivalent to a rule whose predicate always holds.
    pub fn add_provider(&mut self, category: Category, resolver: Resolver) -> Result<&mut Self> {
        self.add_provider_rule(category, Predicate::always(), resolver)
    }

    pub fn add_decorator(
        &mut self,
        category: Category,
        factory: DecoratorFactory,
    ) -> Result<&mut Self> {
        let draft = self.draft_mut("add_decorator")?;
        draft.decorators.add_decorator(category, factory);
        draft.metrics.record_decorator();
        Ok(self)
    }

    pub fn add_event_handler(
        &mut self,
        event_type: &str,
        handler: EventHandler,
    ) -> Result<&mut Self> {
        let draft = self.draft_mut("add_event_handler")?;
        draft.handlers.add(event_type, handler);
        draft.metrics.record_handler();
        Ok(self)
    }

    pub fn set_filter_bar_mode(&mut self, mode: FilterBarMode) -> Result<&mut Self> {
        self.draft_mut("set_filter_bar_mode")?.filter_bar_mode = mode;
        Ok(self)
    }

    /// Freeze registrations. Sealing again returns the same snapshot.
    pub fn seal(&mut self) -> Arc<Customizations> {
        let snapshot = match &mut self.state {
            SessionState::Sealed(snapshot) => return Arc::clone(snapshot),
            SessionState::Open(draft) => Arc::new(Customizations::from_draft(
                self.context.clone(),
                std::mem::take(draft),
                self.logger.clone(),
            )),
        };
        self.state = SessionState::Sealed(Arc::clone(&snapshot));

        let metrics = snapshot.metrics_snapshot();
        self.log(
            LogLevel::Info,
            "session_sealed",
            [
                json_kv("workspace", self.context.workspace.as_str()),
                json_kv("rules", metrics.rules),
                json_kv("decorators", metrics.decorators),
                json_kv("widgets", snapshot.widget_names().count()),
                json_kv("layout_mutations", metrics.layout_mutations),
                json_kv("handlers", metrics.handlers),
            ],
        );
        snapshot
    }

    /// Sealed snapshot, if any.
    pub fn customizations(&self) -> Option<Arc<Customizations>> {
        match &self.state {
            SessionState::Open(_) => None,
            SessionState::Sealed(snapshot) => Some(Arc::clone(snapshot)),
        }
    }

    // Query API

    pub fn resolve_widget(&self, name: &str) -> Result<&CustomWidget> {
        self.sealed("resolve_widget")?.resolve_widget(name)
    }

    pub fn resolve_provider(
        &self,
        category: Category,
        target: &Target,
        base: &Component,
    ) -> Result<Component> {
        Ok(self
            .sealed("resolve_provider")?
            .resolve_provider(category, target, base))
    }

    pub fn effective_layout(&self, base: &Layout) -> Result<Layout> {
        self.sealed("effective_layout")?.effective_layout(base)
    }

    pub fn handlers_for(&self, event_type: &str) -> Result<&[EventHandler]> {
        self.sealed("handlers_for")?.handlers_for(event_type)
    }

    pub fn dispatch_event(&self, event: &DashboardEvent) -> Result<DispatchReport> {
        self.sealed("dispatch_event")?.dispatch_event(event)
    }

    pub fn filter_bar_mode(&self) -> Result<FilterBarMode> {
        Ok(self.sealed("filter_bar_mode")?.filter_bar_mode())
    }

    fn draft_mut(&mut self, operation: &'static str) -> Result<&mut Draft> {
        if self.is_sealed() {
            self.log(
                LogLevel::Warn,
                "mutation_rejected",
                [json_kv("operation", operation)],
            );
        }
        match &mut self.state {
            SessionState::Open(draft) => Ok(draft),
            SessionState::Sealed(_) => Err(CustomizationError::SessionSealed { operation }),
        }
    }

    fn sealed(&self, operation: &'static str) -> Result<&Customizations> {
        match &self.state {
            SessionState::Sealed(snapshot) => Ok(snapshot.as_ref()),
            SessionState::Open(_) => Err(CustomizationError::NotSealed { operation }),
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        emit(self.logger.as_ref(), level, SESSION_TARGET, message, fields);
    }
}
