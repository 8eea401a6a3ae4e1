//! Plugin lifecycle contract.

use crate::descriptor::PluginDescriptor;
use crate::error::Result;
use crate::session::CustomizationSession;
use crate::target::DashboardContext;

/// Capabilities a dashboard plugin offers to the host.
///
/// `register` runs exactly once, synchronously, against an open session.
/// The session is sealed as soon as it returns, so deferred registration
/// is impossible.
pub trait DashboardPlugin: Send {
    fn descriptor(&self) -> &PluginDescriptor;

    fn on_load(&mut self, _ctx: &DashboardContext, _parameters: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn register(
        &mut self,
        ctx: &DashboardContext,
        session: &mut CustomizationSession,
    ) -> Result<()>;

    fn on_unload(&mut self, _ctx: &DashboardContext) -> Result<()> {
        Ok(())
    }
}
