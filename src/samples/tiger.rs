use semver::Version;
use serde_json::json;

use crate::component::{Component, Resolver};
use crate::decorators::{Decoration, DecoratorFactory};
use crate::descriptor::PluginDescriptor;
use crate::error::Result;
use crate::events::DASHBOARD_INITIALIZED;
use crate::layout::{LayoutItem, Section, Widget};
use crate::logging::Logger;
use crate::plugin::DashboardPlugin;
use crate::registry::Category;
use crate::session::{CustomizationSession, FilterBarMode};
use crate::target::DashboardContext;

const TOOLTIP_INSIGHT_TITLE: &str = "date format 2";

/// Filter-driving custom widgets, a tooltip decoration for one insight and
/// two layout customizers.
pub struct TigerPlugin {
    descriptor: PluginDescriptor,
    logger: Option<Logger>,
}

impl TigerPlugin {
    pub fn new(logger: Option<Logger>) -> Self {
        Self {
            descriptor: super::descriptor("tiger", Version::new(8, 12, 0), Version::new(8, 12, 0)),
            logger,
        }
    }
}

fn change_filters_widget() -> Component {
    Component::fixed(
        "ChangeFilterDashboard",
        concat!(
            "<div>",
            "<button>Change date filter selection</button>",
            "<button>Change static period</button>",
            "<button>Clear date filter selection</button>",
            "<button>Change Region selection</button>",
            "<button>Reset Region filter</button>",
            "</div>"
        ),
    )
}

fn widget_with_filters() -> Component {
    Component::new("MyCustomWidgetWithFilters", |props| {
        let data_set = props["dateDataSet"]["identifier"]
            .as_str()
            .unwrap_or("none");
        let ignored = props["ignoreDashboardFilters"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0);
        format!("<radar-chart date-data-set=\"{data_set}\" ignored-filters=\"{ignored}\"/>")
    })
}

fn tooltip_decorator() -> DecoratorFactory {
    DecoratorFactory::new(|next| {
        Decoration::Applies(Resolver::new(move |ctx, target| {
            let insight = next.resolve(ctx, target);
            if target.title() == Some(TOOLTIP_INSIGHT_TITLE) {
                insight.wrap("InsightTooltipCustomDecorator", |_, markup| {
                    format!("{markup}<div class=\"tooltip-icon\">ABCDEF</div>")
                })
            } else {
                insight
            }
        }))
    })
}

impl DashboardPlugin for TigerPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn register(
        &mut self,
        _ctx: &DashboardContext,
        session: &mut CustomizationSession,
    ) -> Result<()> {
        session
            .register_widget(
                "myCustomWidget",
                Component::fixed("MyCustomWidget", "<div>Hello from custom widget</div>"),
                None,
            )?
            .register_widget("changeFilters", change_filters_widget(), None)?
            .register_widget("myWidgetWithFilters", widget_with_filters(), None)?
            .set_filter_bar_mode(FilterBarMode::Default)?
            .add_decorator(Category::Insight, tooltip_decorator())?
            .customize_layout(|_, _, customizer| {
                customizer
                    .add_section(
                        0,
                        Section::new("Section Added By Plugin").with_item(
                            LayoutItem::custom_widget("myWidget1", "myCustomWidget")
                                .with_size(6, 12),
                        ),
                    )
                    .add_item(
                        0,
                        -1,
                        LayoutItem::custom_widget("myWidget2", "changeFilters").with_size(6, 15),
                    );
            })?
            .customize_layout(|_, _, customizer| {
                let widget = Widget::custom_with_properties(
                    "myWidget3",
                    "myWidgetWithFilters",
                    json!({
                        "dateDataSet": {
                            "type": "identifier",
                            "identifier": "date1",
                            "kind": "dataSet"
                        },
                        "ignoreDashboardFilters": [
                            {
                                "type": "attributeFilterReference",
                                "displayForm": {"type": "identifier", "identifier": "region"}
                            }
                        ]
                    }),
                );
                customizer.add_section(
                    1,
                    Section::new("filter change")
                        .with_item(LayoutItem::new(widget).with_size(6, 12)),
                );
            })?
            .add_event_handler(
                DASHBOARD_INITIALIZED,
                super::initialized_handler("tiger", self.logger.clone()),
            )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostConfig, PluginHost};
    use crate::layout::{ItemSize, Layout};
    use crate::target::{Target, TargetRef};
    use serde_json::Value;

    fn host() -> PluginHost {
        let mut host = PluginHost::new(DashboardContext::new("ws"), HostConfig::default());
        host.load(Box::new(TigerPlugin::new(None)), None).unwrap();
        host
    }

    #[test]
    fn both_customizers_shape_the_layout() {
        let host = host();
        let base = Layout::new(vec![Section::new("orig0"), Section::new("orig1")]);
        let layout = host.effective_layout(&base).unwrap();

        assert_eq!(
            layout.section_titles(),
            vec![
                Some("Section Added By Plugin"),
                Some("filter change"),
                Some("orig0"),
                Some("orig1"),
            ]
        );
        let first = &layout.sections[0].items;
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].widget.custom_type(), Some("changeFilters"));
        assert_eq!(first[1].size, ItemSize::new(6, 15));
        assert_eq!(
            layout.custom_widget_types(),
            vec!["myCustomWidget", "changeFilters", "myWidgetWithFilters"]
        );
    }

    #[test]
    fn widget_with_filters_reads_instance_properties() {
        let host = host();
        let layout = host.effective_layout(&Layout::default()).unwrap();
        let Widget::Custom { properties, .. } = &layout.sections[1].items[0].widget else {
            panic!("expected a custom widget");
        };

        let customizations = host.plugins()[0].customizations();
        let markup = customizations
            .resolve_widget("myWidgetWithFilters")
            .unwrap()
            .render(properties);
        assert_eq!(
            markup,
            "<radar-chart date-data-set=\"date1\" ignored-filters=\"1\"/>"
        );
        assert_eq!(customizations.filter_bar_mode(), FilterBarMode::Default);
    }

    #[test]
    fn tooltip_only_for_matching_insight() {
        let host = host();
        let base = Component::fixed("Insight", "<chart/>");
        let tooltip = host.resolve_provider(
            Category::Insight,
            &Target::insight(TargetRef::id("i1"), TOOLTIP_INSIGHT_TITLE),
            &base,
        );
        assert_eq!(
            tooltip.render(&Value::Null),
            "<chart/><div class=\"tooltip-icon\">ABCDEF</div>"
        );

        let plain = host.resolve_provider(
            Category::Insight,
            &Target::insight(TargetRef::id("i2"), "revenue"),
            &base,
        );
        assert!(plain.ptr_eq(&base));
    }
}
