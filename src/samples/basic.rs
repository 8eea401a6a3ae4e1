use semver::Version;

use crate::component::{Component, Resolver};
use crate::decorators::{Decoration, DecoratorFactory};
use crate::descriptor::PluginDescriptor;
use crate::error::Result;
use crate::events::DASHBOARD_INITIALIZED;
use crate::layout::{LayoutItem, Section};
use crate::logging::Logger;
use crate::plugin::DashboardPlugin;
use crate::registry::Category;
use crate::session::CustomizationSession;
use crate::target::{DashboardContext, RefEquality, Target};

const STAGE_NAME: u64 = 1805;
const SALES_REP: u64 = 1028;
const REGION: u64 = 1024;

/// Custom attribute filters for two display forms, a captioned decoration
/// around three of them and a one-line custom widget section on top.
pub struct BasicPlugin {
    descriptor: PluginDescriptor,
    logger: Option<Logger>,
}

impl BasicPlugin {
    pub fn new(logger: Option<Logger>) -> Self {
        Self {
            descriptor: super::descriptor("basic", Version::new(8, 11, 0), Version::new(8, 12, 0)),
            logger,
        }
    }
}

fn filter_component(name: &'static str, class: &'static str) -> Component {
    Component::new(name, move |props| {
        let title = props["title"].as_str().unwrap_or_default();
        format!("<div class=\"{class}\">{title}</div>")
    })
}

fn attribute_filter_provider(ctx: &DashboardContext) -> Resolver {
    let stage_name = ctx.object_uri(STAGE_NAME);
    let sales_rep = ctx.object_uri(SALES_REP);
    let equality = RefEquality::strict();
    let selection_tiles = filter_component("CustomAttributeFilter1", "selection-tiles");
    let styled_dropdown = filter_component("CustomAttributeFilter2", "styled-dropdown");
    let plain_dropdown = filter_component("CustomAttributeFilter3", "s-attribute-filter");

    Resolver::new(move |_, target: &Target| {
        if equality.matches(&target.reference, &stage_name) {
            selection_tiles.clone()
        } else if equality.matches(&target.reference, &sales_rep) {
            styled_dropdown.clone()
        } else {
            plain_dropdown.clone()
        }
    })
}

fn caption_decorator(ctx: &DashboardContext) -> DecoratorFactory {
    let decorated = vec![
        ctx.object_uri(STAGE_NAME),
        ctx.object_uri(SALES_REP),
        ctx.object_uri(REGION),
    ];
    DecoratorFactory::new(move |next| {
        let decorated = decorated.clone();
        Decoration::Applies(Resolver::new(move |ctx, target| {
            let inner = next.resolve(ctx, target);
            let equality = RefEquality::strict();
            if decorated
                .iter()
                .any(|reference| equality.matches(&target.reference, reference))
            {
                inner.wrap("MyCustomDecorator", |_, markup| {
                    format!("<div style=\"width:100%\"><b>My Custom Decoration</b>{markup}</div>")
                })
            } else {
                inner
            }
        }))
    })
}

impl DashboardPlugin for BasicPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn register(
        &mut self,
        ctx: &DashboardContext,
        session: &mut CustomizationSession,
    ) -> Result<()> {
        session
            .add_provider(Category::AttributeFilter, attribute_filter_provider(ctx))?
            .add_decorator(Category::AttributeFilter, caption_decorator(ctx))?
            .register_widget(
                "myCustomWidget",
                Component::fixed("MyCustomWidget", "<div>Hello from custom widget</div>"),
                None,
            )?
            .customize_layout(|_, _, customizer| {
                customizer.add_section(
                    0,
                    Section::new("Section Added By Plugin").with_item(
                        LayoutItem::custom_widget("myWidget1", "myCustomWidget").with_size(12, 1),
                    ),
                );
            })?
            .add_event_handler(
                DASHBOARD_INITIALIZED,
                super::initialized_handler("basic", self.logger.clone()),
            )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DashboardEvent;
    use crate::host::{HostConfig, PluginHost};
    use crate::layout::{ItemSize, Layout, Widget};
    use crate::logging::MemorySink;
    use crate::target::TargetRef;
    use serde_json::{Value, json};

    fn host(sink: &MemorySink) -> PluginHost {
        let mut host = PluginHost::new(
            DashboardContext::new("ws"),
            HostConfig::default().with_logger(Logger::new(sink.clone())),
        );
        host.load(Box::new(BasicPlugin::new(Some(Logger::new(sink.clone())))), None)
            .unwrap();
        host
    }

    fn render_filter(host: &PluginHost, object_id: u64) -> String {
        let target = Target::attribute_filter(TargetRef::uri(format!("/gdc/md/ws/obj/{object_id}")))
            .with_properties(json!({"title": "Filter"}));
        host.resolve_provider(
            Category::AttributeFilter,
            &target,
            &Component::fixed("DefaultAttributeFilter", "default"),
        )
        .render(&target.properties)
    }

    #[test]
    fn display_forms_pick_their_filter_and_caption() {
        let host = host(&MemorySink::new());
        let caption = "<div style=\"width:100%\"><b>My Custom Decoration</b>";

        let stage = render_filter(&host, STAGE_NAME);
        assert!(stage.starts_with(caption));
        assert!(stage.contains("selection-tiles"));

        let sales = render_filter(&host, SALES_REP);
        assert!(sales.contains("styled-dropdown"));
        assert!(sales.starts_with(caption));

        let region = render_filter(&host, REGION);
        assert!(region.starts_with(caption));
        assert!(region.contains("s-attribute-filter"));

        let other = render_filter(&host, 42);
        assert_eq!(other, "<div class=\"s-attribute-filter\">Filter</div>");
    }

    #[test]
    fn section_is_added_on_top() {
        let host = host(&MemorySink::new());
        let base = Layout::new(vec![Section::new("KPIs")]);
        let layout = host.effective_layout(&base).unwrap();

        assert_eq!(
            layout.section_titles(),
            vec![Some("Section Added By Plugin"), Some("KPIs")]
        );
        let item = &layout.sections[0].items[0];
        assert_eq!(item.widget, Widget::custom("myWidget1", "myCustomWidget"));
        assert_eq!(item.size, ItemSize::new(12, 1));

        let widget = host.plugins()[0]
            .customizations()
            .resolve_widget("myCustomWidget")
            .unwrap()
            .render(&Value::Null);
        assert_eq!(widget, "<div>Hello from custom widget</div>");
    }

    #[test]
    fn initialized_event_is_logged() {
        let sink = MemorySink::new();
        let host = host(&sink);
        let report = host
            .dispatch_event(
                &DashboardEvent::new(DASHBOARD_INITIALIZED, json!({"dashboard": "d1"}))
                    .with_correlation_id("c-7"),
            )
            .unwrap();
        assert!(report.is_clean());

        let event = sink.find("dashboard_initialized").unwrap();
        assert_eq!(event.field("plugin"), Some(&json!("basic")));
        assert_eq!(event.field("correlation_id"), Some(&json!("c-7")));
    }
}
