use semver::Version;

use crate::component::{Component, Resolver};
use crate::decorators::{Decoration, DecoratorFactory};
use crate::descriptor::PluginDescriptor;
use crate::error::Result;
use crate::events::DASHBOARD_INITIALIZED;
use crate::layout::{LayoutItem, Section};
use crate::logging::Logger;
use crate::plugin::DashboardPlugin;
use crate::registry::{Category, Predicate};
use crate::session::CustomizationSession;
use crate::target::{DashboardContext, RefEquality};

const STAGE_NAME_ORDER: u64 = 1806;
const TOOLTIP_INSIGHT_TITLE: &str = "insightView";

/// Image and embedded-insight widgets spread over a top and a trailing
/// section, plus a filter override for a single display form.
pub struct BearPlugin {
    descriptor: PluginDescriptor,
    logger: Option<Logger>,
}

impl BearPlugin {
    pub fn new(logger: Option<Logger>) -> Self {
        Self {
            descriptor: super::descriptor("bear", Version::new(8, 12, 0), Version::new(8, 13, 0)),
            logger,
        }
    }
}

fn insight_tooltip() -> DecoratorFactory {
    DecoratorFactory::new(|next| {
        Decoration::Applies(Resolver::new(move |ctx, target| {
            let insight = next.resolve(ctx, target);
            if target.title() == Some(TOOLTIP_INSIGHT_TITLE) {
                insight.wrap("InsightTooltipCustomDecorator", |_, markup| {
                    format!("{markup}<tooltip/>")
                })
            } else {
                insight
            }
        }))
    })
}

impl DashboardPlugin for BearPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn register(
        &mut self,
        ctx: &DashboardContext,
        session: &mut CustomizationSession,
    ) -> Result<()> {
        session
            .register_widget(
                "myCustomWidget",
                Component::fixed("MyCustomWidget", "<div>Hello from custom widget</div>"),
                None,
            )?
            .register_widget(
                "myImage",
                Component::new("Image", |props| {
                    let src = props["src"].as_str().unwrap_or_default();
                    format!("<img src=\"{src}\"/>")
                }),
                Some(serde_json::json!({"src": "logo.png"})),
            )?
            .register_widget(
                "myInsight",
                Component::fixed("Visualization", "<insight-view/>"),
                None,
            )?
            .add_decorator(Category::Insight, insight_tooltip())?
            .add_provider_rule(
                Category::AttributeFilter,
                Predicate::reference(ctx.object_uri(STAGE_NAME_ORDER), RefEquality::strict()),
                Resolver::constant(Component::fixed(
                    "CustomAttributeFilter1",
                    "<div class=\"selection-tiles\"/>",
                )),
            )?
            .customize_layout(|_, _, customizer| {
                customizer
                    .add_section(
                        0,
                        Section::new("Section Added By Plugin").with_item(
                            LayoutItem::custom_widget("myWidget1", "myCustomWidget")
                                .with_size(12, 1),
                        ),
                    )
                    .add_section(
                        -1,
                        Section::new("last section")
                            .with_item(
                                LayoutItem::custom_widget("myWidget2", "myCustomWidget")
                                    .with_size(6, 3),
                            )
                            .with_item(
                                LayoutItem::custom_widget("myWidget4", "myInsight")
                                    .with_size(6, 12),
                            ),
                    )
                    .add_item(
                        0,
                        -1,
                        LayoutItem::custom_widget("myWidget3", "myImage").with_size(6, 3),
                    );
            })?
            .add_event_handler(
                DASHBOARD_INITIALIZED,
                super::initialized_handler("bear", self.logger.clone()),
            )?;
        Ok(())
    }
}
