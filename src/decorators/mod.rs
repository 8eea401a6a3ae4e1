mod core;

pub use self::core::{Decoration, DecoratorChain, DecoratorFactory};
