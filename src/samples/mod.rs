//! Sample plugins exercising the engine end to end.
//!
//! Render components here produce small HTML-like strings so tests can
//! assert on composition without a real renderer.

pub mod basic;
pub mod bear;
pub mod tiger;

use semver::Version;
use serde_json::json;

use crate::descriptor::PluginDescriptor;
use crate::events::EventHandler;
use crate::logging::{EVENTS_TARGET, LogLevel, Logger, emit, json_kv};
use crate::plugin::DashboardPlugin;

pub use basic::BasicPlugin;
pub use bear::BearPlugin;
pub use tiger::TigerPlugin;

const AUTHOR: &str = "Dashboard Plugins Team";

fn descriptor(name: &str, min_engine: Version, max_engine: Version) -> PluginDescriptor {
    PluginDescriptor::new(AUTHOR, name, Version::new(1, 0, 0), min_engine, max_engine)
}

/// Handler that reports dashboard initialization through `logger`.
fn initialized_handler(plugin: &'static str, logger: Option<Logger>) -> EventHandler {
    EventHandler::infallible(move |event| {
        emit(
            logger.as_ref(),
            LogLevel::Info,
            EVENTS_TARGET,
            "dashboard_initialized",
            [
                json_kv("plugin", plugin),
                json_kv("payload", event.payload.clone()),
                json_kv("correlation_id", json!(event.correlation_id)),
            ],
        );
    })
}

/// Every sample plugin, in the order a host would typically load them.
pub fn all(logger: Option<Logger>) -> Vec<Box<dyn DashboardPlugin>> {
    vec![
        Box::new(BasicPlugin::new(logger.clone())),
        Box::new(TigerPlugin::new(logger.clone())),
        Box::new(BearPlugin::new(logger)),
    ]
}
