//! Plugin host: loads plugins, seals their sessions and composes the sealed
//! customizations of every loaded plugin.

pub mod audit;
pub mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

use crate::component::{Component, Resolver};
use crate::descriptor::PluginDescriptor;
use crate::error::{CustomizationError, Result};
use crate::events::{DashboardEvent, DispatchReport};
use crate::layout::Layout;
use crate::logging::{HOST_TARGET, LogEvent, LogLevel, emit, json_kv};
use crate::metrics::MetricSnapshot;
use crate::plugin::DashboardPlugin;
use crate::registry::Category;
use crate::session::{CustomizationSession, Customizations};
use crate::target::{DashboardContext, Target};

pub use audit::{
    HostAudit, HostAuditEvent, HostAuditEventBuilder, HostAuditStage, NullHostAudit,
    RecordingHostAudit,
};
pub use config::{DEFAULT_ENGINE_VERSION, HostConfig, HostSettings};

/// Identifies a loaded plugin for [`PluginHost::unload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginHandle(u64);

/// A plugin that passed every lifecycle step, plus its sealed customizations.
pub struct LoadedPlugin {
    handle: PluginHandle,
    context: DashboardContext,
    plugin: Box<dyn DashboardPlugin>,
    customizations: Arc<Customizations>,
}

impl LoadedPlugin {
    pub fn handle(&self) -> PluginHandle {
        self.handle
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        self.plugin.descriptor()
    }

    pub fn name(&self) -> &str {
        &self.descriptor().display_name
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn customizations(&self) -> Arc<Customizations> {
        Arc::clone(&self.customizations)
    }
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("handle", &self.handle)
            .field("descriptor", self.descriptor())
            .field("customizations", &self.customizations)
            .finish()
    }
}

/// Loads plugins for one dashboard and answers composed queries across them
/// in load order.
pub struct PluginHost {
    context: DashboardContext,
    config: HostConfig,
    plugins: Vec<LoadedPlugin>,
    next_handle: u64,
    /// Instrumentation only; never read by resolution.
    resolutions: AtomicU64,
}

impl PluginHost {
    pub fn new(context: DashboardContext, config: HostConfig) -> Self {
        let host = Self {
            context,
            config,
            plugins: Vec::new(),
            next_handle: 0,
            resolutions: AtomicU64::new(0),
        };
        host.audit(
            HostAuditStage::HostConstructed,
            [
                ("workspace", json!(host.context.workspace)),
                ("engine", json!(host.config.engine_version.to_string())),
            ],
        );
        host
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    pub fn get(&self, handle: PluginHandle) -> Option<&LoadedPlugin> {
        self.plugins.iter().find(|loaded| loaded.handle == handle)
    }

    /// Check the engine range, run `on_load`, run `register` once against a
    /// fresh session and seal it. Any failure leaves the host unchanged.
    pub fn load(
        &mut self,
        mut plugin: Box<dyn DashboardPlugin>,
        parameters: Option<&str>,
    ) -> Result<&LoadedPlugin> {
        let descriptor = plugin.descriptor().clone();
        let name = descriptor.display_name.clone();

        if self.config.enforce_engine_range
            && !descriptor.supports_engine(&self.config.engine_version)
        {
            self.audit(
                HostAuditStage::PluginRejected,
                [
                    ("plugin", json!(name)),
                    ("engine", json!(self.config.engine_version.to_string())),
                    ("min", json!(descriptor.min_engine_version.to_string())),
                    ("max", json!(descriptor.max_engine_version.to_string())),
                ],
            );
            self.log(
                LogLevel::Warn,
                "plugin_rejected",
                [
                    json_kv("plugin", name.as_str()),
                    json_kv("engine", self.config.engine_version.to_string()),
                ],
            );
            return Err(CustomizationError::IncompatibleEngine {
                plugin: name,
                engine: self.config.engine_version.clone(),
                min: descriptor.min_engine_version,
                max: descriptor.max_engine_version,
            });
        }

        let context = match parameters {
            Some(parameters) => self.context.clone().with_parameters(parameters),
            None => self.context.clone(),
        };

        self.audit(
            HostAuditStage::PluginLoadStarted,
            [
                ("plugin", json!(name)),
                ("version", json!(descriptor.version.to_string())),
            ],
        );
        plugin
            .on_load(&context, parameters)
            .map_err(|err| self.load_failed(&name, "on_load", err))?;

        let mut session = CustomizationSession::new(context.clone());
        if let Some(logger) = self.config.logger.clone() {
            session = session.with_logger(logger);
        }
        plugin
            .register(&context, &mut session)
            .map_err(|err| self.load_failed(&name, "register", err))?;
        self.audit(HostAuditStage::PluginRegistered, [("plugin", json!(name))]);

        let customizations = session.seal();
        let metrics = customizations.metrics_snapshot();
        self.audit(
            HostAuditStage::SessionSealed,
            [
                ("plugin", json!(name)),
                ("metrics", Value::Object(metrics.as_fields())),
            ],
        );
        self.log(
            LogLevel::Info,
            "plugin_loaded",
            [
                json_kv("plugin", name.as_str()),
                json_kv("version", descriptor.version.to_string()),
                json_kv("widgets", metrics.widgets),
                json_kv("rules", metrics.rules),
            ],
        );

        let handle = PluginHandle(self.next_handle);
        self.next_handle += 1;
        self.plugins.push(LoadedPlugin {
            handle,
            context,
            plugin,
            customizations,
        });
        let index = self.plugins.len() - 1;
        Ok(&self.plugins[index])
    }

    /// Run `on_unload` and drop the plugin's customizations. The plugin is
    /// removed even when the hook fails.
    pub fn unload(&mut self, handle: PluginHandle) -> Result<()> {
        let index = self
            .plugins
            .iter()
            .position(|loaded| loaded.handle == handle)
            .ok_or_else(|| CustomizationError::NotFound {
                kind: "plugin",
                name: format!("{handle:?}"),
            })?;
        let mut loaded = self.plugins.remove(index);
        let name = loaded.name().to_string();
        let outcome = loaded.plugin.on_unload(&loaded.context);

        self.audit(
            HostAuditStage::PluginUnloaded,
            [
                ("plugin", json!(name)),
                ("ok", json!(outcome.is_ok())),
            ],
        );
        self.log(LogLevel::Info, "plugin_unloaded", [json_kv("plugin", name.as_str())]);

        outcome.map_err(|err| CustomizationError::Plugin {
            plugin: name,
            stage: "on_unload",
            message: err.to_string(),
        })
    }

    /// Base layout with every plugin's mutations applied, plugin by plugin
    /// in load order.
    pub fn effective_layout(&self, base: &Layout) -> Result<Layout> {
        self.plugins
            .iter()
            .try_fold(base.clone(), |layout, loaded| {
                loaded.customizations.effective_layout(&layout)
            })
    }

    /// The first plugin with a matching rule supplies the component,
    /// otherwise `base`. Every plugin's decorators then wrap the result,
    /// later plugins outermost. Each layer resolves with its own plugin's
    /// context, so rules and decorators see the same link parameters.
    pub fn resolve_provider(
        &self,
        category: Category,
        target: &Target,
        base: &Component,
    ) -> Component {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let matched = self
            .plugins
            .iter()
            .find_map(|loaded| loaded.customizations.matching_rule(category, target))
            .unwrap_or_else(|| base.clone());

        self.plugins
            .iter()
            .fold(Resolver::constant(matched), |inner, loaded| {
                let decorated = loaded.customizations.decorate(category, inner);
                let context = loaded.context.clone();
                Resolver::new(move |_, target| decorated.resolve(&context, target))
            })
            .resolve(&self.context, target)
    }

    /// Deliver the event to every plugin that declared handlers for it.
    pub fn dispatch_event(&self, event: &DashboardEvent) -> Result<DispatchReport> {
        let mut report = DispatchReport {
            event_type: event.event_type.clone(),
            ..DispatchReport::default()
        };
        for loaded in &self.plugins {
            if loaded.customizations.declares_event(&event.event_type) {
                report.absorb(loaded.customizations.dispatch_event(event)?);
            }
        }
        self.audit(
            HostAuditStage::EventDispatched,
            [
                ("event_type", json!(event.event_type)),
                ("invoked", json!(report.invoked)),
                ("failures", json!(report.failures.len())),
            ],
        );
        Ok(report)
    }

    /// Counters summed over every loaded plugin, plus the host's own
    /// resolution count.
    pub fn metrics_snapshot(&self) -> MetricSnapshot {
        let mut total = MetricSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            ..MetricSnapshot::default()
        };
        for loaded in &self.plugins {
            total.merge(&loaded.customizations.metrics_snapshot());
        }
        total
    }

    /// Emit the summed metrics through the configured logger.
    pub fn emit_metrics(&self) -> LogEvent {
        let event = self.metrics_snapshot().to_log_event(&self.config.metrics_target);
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(event.clone());
        }
        event
    }

    fn load_failed(
        &self,
        plugin: &str,
        stage: &'static str,
        err: CustomizationError,
    ) -> CustomizationError {
        self.audit(
            HostAuditStage::PluginLoadFailed,
            [
                ("plugin", json!(plugin)),
                ("stage", json!(stage)),
                ("error", json!(err.to_string())),
            ],
        );
        self.log(
            LogLevel::Error,
            "plugin_load_failed",
            [
                json_kv("plugin", plugin),
                json_kv("stage", stage),
                json_kv("error", err.to_string()),
            ],
        );
        match err {
            CustomizationError::Plugin { .. } => err,
            other => CustomizationError::Plugin {
                plugin: plugin.to_string(),
                stage,
                message: other.to_string(),
            },
        }
    }

    fn audit<const N: usize>(&self, stage: HostAuditStage, details: [(&str, Value); N]) {
        let mut builder = HostAuditEventBuilder::new(stage);
        for (key, value) in details {
            builder.detail(key, value);
        }
        self.config.audit.record(builder.finish());
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        emit(self.config.logger.as_ref(), level, HOST_TARGET, message, fields);
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("context", &self.context)
            .field("config", &self.config)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
