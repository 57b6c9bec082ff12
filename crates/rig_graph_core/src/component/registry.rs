use indexmap::IndexMap;

use super::ComponentLike;
use crate::errors::{RigError, RigResult};

pub type ComponentFactory = fn() -> Box<dyn ComponentLike>;

/// Class name -> factory. Mirroring and graph reloading go through here to get "the same
/// concrete type" back from a `componentClass` string.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: IndexMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class whose default value is a valid instance.
    pub fn register<T: ComponentLike + Default>(&mut self) -> &mut Self {
        let factory: ComponentFactory = default_factory::<T>;
        let class_name = factory().class_name();
        self.register_factory(class_name, factory)
    }

    pub fn register_factory(
        &mut self,
        class_name: impl Into<String>,
        factory: ComponentFactory,
    ) -> &mut Self {
        self.factories.insert(class_name.into(), factory);
        self
    }

    pub fn create(&self, class_name: &str) -> RigResult<Box<dyn ComponentLike>> {
        self.factories
            .get(class_name)
            .map(|factory| factory())
            .ok_or_else(|| RigError::UnknownComponentClass(class_name.into()))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

fn default_factory<T: ComponentLike + Default>() -> Box<dyn ComponentLike> {
    Box::new(T::default())
}
