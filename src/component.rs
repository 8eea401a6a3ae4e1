//! Opaque render components.
//!
//! The engine never renders anything itself. A [`Component`] is a named
//! render callback supplied by the plugin or the host; the engine only
//! selects, wraps, and hands components back.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::target::{DashboardContext, Target};

/// Output produced by a render callback. Opaque to the engine.
pub type Markup = String;

type RenderFn = dyn Fn(&Value) -> Markup + Send + Sync;

#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: impl Into<Arc<str>>, render: F) -> Self
    where
        F: Fn(&Value) -> Markup + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    /// Component rendering fixed markup regardless of props.
    pub fn fixed(name: impl Into<Arc<str>>, markup: impl Into<String>) -> Self {
        let markup: String = markup.into();
        Self::new(name, move |_| markup.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, props: &Value) -> Markup {
        (self.render)(props)
    }

    /// Wrap this component, giving the wrapper access to the inner render output.
    pub fn wrap<F>(&self, name: impl Into<Arc<str>>, wrapper: F) -> Self
    where
        F: Fn(&Value, Markup) -> Markup + Send + Sync + 'static,
    {
        let inner = self.clone();
        Self::new(name, move |props| wrapper(props, inner.render(props)))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

type ResolveFn = dyn Fn(&DashboardContext, &Target) -> Component + Send + Sync;

/// Maps a target to the component that should render it.
#[derive(Clone)]
pub struct Resolver {
    resolve: Arc<ResolveFn>,
}

impl Resolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&DashboardContext, &Target) -> Component + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    /// Resolver returning the same component for every target.
    pub fn constant(component: Component) -> Self {
        Self::new(move |_, _| component.clone())
    }

    pub fn resolve(&self, ctx: &DashboardContext, target: &Target) -> Component {
        (self.resolve)(ctx, target)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}
