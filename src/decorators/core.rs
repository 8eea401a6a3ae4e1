use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::component::Resolver;
use crate::registry::Category;

/// Result of calling a decorator factory with the next resolver.
#[derive(Debug, Clone)]
pub enum Decoration {
    /// Replace the current resolver with this one.
    Applies(Resolver),
    /// Leave the chain unchanged.
    Skip,
}

type FactoryFn = dyn Fn(Resolver) -> Decoration + Send + Sync;

#[derive(Clone)]
pub struct DecoratorFactory {
    build: Arc<FactoryFn>,
}

impl DecoratorFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(Resolver) -> Decoration + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }

    pub fn decorate(&self, next: Resolver) -> Decoration {
        (self.build)(next)
    }
}

impl fmt::Debug for DecoratorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecoratorFactory(..)")
    }
}

/// Ordered decorator factories per category.
///
/// Folding happens in registration order, so the last registered decorator
/// ends up outermost: for `[d1, d2, d3]` the effective resolver is
/// `d3(d2(d1(base)))`.
#[derive(Debug, Clone, Default)]
pub struct DecoratorChain {
    factories: HashMap<Category, Vec<DecoratorFactory>>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_decorator(&mut self, category: Category, factory: DecoratorFactory) {
        self.factories.entry(category).or_default().push(factory);
    }

    pub fn build_effective_resolver(&self, category: Category, base: Resolver) -> Resolver {
        let Some(factories) = self.factories.get(&category) else {
            return base;
        };

        factories
            .iter()
            .fold(base, |next, factory| match factory.decorate(next.clone()) {
                Decoration::Applies(resolver) => resolver,
                Decoration::Skip => next,
            })
    }

    pub fn decorator_count(&self, category: Category) -> usize {
        self.factories.get(&category).map(Vec::len).unwrap_or(0)
    }

    pub fn total_decorators(&self) -> usize {
        self.factories.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::target::{DashboardContext, Target, TargetRef};
    use serde_json::Value;

    fn ctx() -> DashboardContext {
        DashboardContext::new("ws")
    }

    fn insight(title: &str) -> Target {
        Target::insight(TargetRef::id("insight"), title)
    }

    fn base() -> Resolver {
        Resolver::constant(Component::fixed("base", "base"))
    }

    fn tagging(tag: &'static str) -> DecoratorFactory {
        DecoratorFactory::new(move |next| {
            Decoration::Applies(Resolver::new(move |ctx, target| {
                next.resolve(ctx, target)
                    .wrap(tag, move |_, inner| format!("{tag}({inner})"))
            }))
        })
    }

    #[test]
    fn last_registered_is_outermost() {
        let mut chain = DecoratorChain::new();
        chain.add_decorator(Category::Insight, tagging("d1"));
        chain.add_decorator(Category::Insight, tagging("d2"));
        chain.add_decorator(Category::Insight, tagging("d3"));

        let resolver = chain.build_effective_resolver(Category::Insight, base());
        let component = resolver.resolve(&ctx(), &insight("any"));
        assert_eq!(component.render(&Value::Null), "d3(d2(d1(base)))");
        assert_eq!(component.name(), "d3");
    }

    #[test]
    fn skip_keeps_previous_resolver() {
        let mut chain = DecoratorChain::new();
        chain.add_decorator(Category::Insight, tagging("d1"));
        chain.add_decorator(Category::Insight, DecoratorFactory::new(|_| Decoration::Skip));

        let resolver = chain.build_effective_resolver(Category::Insight, base());
        let markup = resolver.resolve(&ctx(), &insight("any")).render(&Value::Null);
        assert_eq!(markup, "d1(base)");
    }

    #[test]
    fn per_target_noop_delegates_to_next() {
        let mut chain = DecoratorChain::new();
        chain.add_decorator(
            Category::Insight,
            DecoratorFactory::new(|next| {
                Decoration::Applies(Resolver::new(move |ctx, target| {
                    let inner = next.resolve(ctx, target);
                    if target.title() == Some("date format 2") {
                        inner.wrap("tooltip", |_, markup| format!("{markup}<Tooltip/>"))
                    } else {
                        inner
                    }
                }))
            }),
        );

        let resolver = chain.build_effective_resolver(Category::Insight, base());
        assert_eq!(
            resolver
                .resolve(&ctx(), &insight("date format 2"))
                .render(&Value::Null),
            "base<Tooltip/>"
        );
        assert_eq!(
            resolver.resolve(&ctx(), &insight("other")).name(),
            "base"
        );
    }

    #[test]
    fn empty_chain_returns_base() {
        let chain = DecoratorChain::new();
        let resolver = chain.build_effective_resolver(Category::Kpi, base());
        assert_eq!(resolver.resolve(&ctx(), &insight("x")).name(), "base");
        assert_eq!(chain.decorator_count(Category::Kpi), 0);
    }
}
