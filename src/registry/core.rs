use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::{Component, Resolver};
use crate::target::{DashboardContext, RefEquality, Target, TargetRef};

/// Customization category a rule or decorator is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AttributeFilter,
    DateFilter,
    Insight,
    Kpi,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::AttributeFilter,
        Category::DateFilter,
        Category::Insight,
        Category::Kpi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AttributeFilter => "filters.attribute",
            Category::DateFilter => "filters.date",
            Category::Insight => "widgets.insight",
            Category::Kpi => "widgets.kpi",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type PredicateFn = dyn Fn(&DashboardContext, &Target) -> bool + Send + Sync;

/// Decides whether a rule applies to a target.
#[derive(Clone)]
pub struct Predicate {
    test: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&DashboardContext, &Target) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    /// Matches targets whose reference equals `reference` under `equality`.
    pub fn reference(reference: TargetRef, equality: RefEquality) -> Self {
        Self::new(move |_, target| equality.matches(&target.reference, &reference))
    }

    /// Matches targets whose reference equals any of `references`.
    pub fn any_reference(references: Vec<TargetRef>, equality: RefEquality) -> Self {
        Self::new(move |_, target| {
            references
                .iter()
                .any(|candidate| equality.matches(&target.reference, candidate))
        })
    }

    pub fn test(&self, ctx: &DashboardContext, target: &Target) -> bool {
        (self.test)(ctx, target)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

#[derive(Debug, Clone)]
pub struct ProviderRule {
    pub predicate: Predicate,
    pub resolver: Resolver,
}

/// Ordered provider rules per category. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<Category, Vec<ProviderRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, category: Category, predicate: Predicate, resolver: Resolver) {
        self.rules
            .entry(category)
            .or_default()
            .push(ProviderRule {
                predicate,
                resolver,
            });
    }

    /// Catch-all rule for providers that answer every target.
    pub fn add_provider(&mut self, category: Category, resolver: Resolver) {
        self.add_rule(category, Predicate::always(), resolver);
    }

    pub fn add_matching(
        &mut self,
        category: Category,
        reference: TargetRef,
        equality: RefEquality,
        resolver: Resolver,
    ) {
        self.add_rule(category, Predicate::reference(reference, equality), resolver);
    }

    /// Resolver output of the first rule whose predicate accepts `target`.
    /// `None` means no rule matched and the category default applies.
    pub fn resolve(
        &self,
        category: Category,
        ctx: &DashboardContext,
        target: &Target,
    ) -> Option<Component> {
        self.rules
            .get(&category)?
            .iter()
            .find(|rule| rule.predicate.test(ctx, target))
            .map(|rule| rule.resolver.resolve(ctx, target))
    }

    pub fn rule_count(&self, category: Category) -> usize {
        self.rules.get(&category).map(Vec::len).unwrap_or(0)
    }

    pub fn total_rules(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> DashboardContext {
        DashboardContext::new("ws")
    }

    fn region() -> Target {
        Target::attribute_filter(TargetRef::id("region"))
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut registry = RuleRegistry::new();
        registry.add_rule(
            Category::AttributeFilter,
            Predicate::new(|_, _| false),
            Resolver::constant(Component::fixed("never", "")),
        );
        registry.add_rule(
            Category::AttributeFilter,
            Predicate::always(),
            Resolver::constant(Component::fixed("first", "")),
        );
        registry.add_rule(
            Category::AttributeFilter,
            Predicate::always(),
            Resolver::constant(Component::fixed("second", "")),
        );

        let resolved = registry
            .resolve(Category::AttributeFilter, &ctx(), &region())
            .unwrap();
        assert_eq!(resolved.name(), "first");
    }

    #[test]
    fn later_predicates_are_not_evaluated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = RuleRegistry::new();
        registry.add_provider(
            Category::AttributeFilter,
            Resolver::constant(Component::fixed("hit", "")),
        );
        registry.add_rule(
            Category::AttributeFilter,
            Predicate::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }),
            Resolver::constant(Component::fixed("late", "")),
        );

        registry.resolve(Category::AttributeFilter, &ctx(), &region());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_match_returns_none() {
        let mut registry = RuleRegistry::new();
        registry.add_matching(
            Category::AttributeFilter,
            TargetRef::id("stage"),
            RefEquality::strict(),
            Resolver::constant(Component::fixed("stage", "")),
        );
        assert!(registry
            .resolve(Category::AttributeFilter, &ctx(), &region())
            .is_none());
        assert!(registry.resolve(Category::Insight, &ctx(), &region()).is_none());
    }

    #[test]
    fn categories_are_isolated() {
        let mut registry = RuleRegistry::new();
        registry.add_provider(
            Category::Insight,
            Resolver::constant(Component::fixed("insight", "")),
        );
        assert_eq!(registry.rule_count(Category::Insight), 1);
        assert_eq!(registry.rule_count(Category::AttributeFilter), 0);
        assert!(registry
            .resolve(Category::AttributeFilter, &ctx(), &region())
            .is_none());
    }

    #[test]
    fn predicates_see_explicit_context() {
        let mut registry = RuleRegistry::new();
        registry.add_rule(
            Category::AttributeFilter,
            Predicate::new(|ctx, target| {
                RefEquality::strict().matches(&target.reference, &ctx.object_uri(1805))
            }),
            Resolver::constant(Component::fixed("stage", "")),
        );

        let target = Target::attribute_filter(TargetRef::uri("/gdc/md/ws/obj/1805"));
        assert!(registry
            .resolve(Category::AttributeFilter, &ctx(), &target)
            .is_some());
        let other = DashboardContext::new("other");
        assert!(registry
            .resolve(Category::AttributeFilter, &other, &target)
            .is_none());
    }
}
