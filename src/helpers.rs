use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::resolve::{BoxError, Component, ConstructError, ConstructionScope, Delivery, Instance, Maker};

type Constructor = Box<dyn Fn() -> Result<Component, BoxError> + Send + Sync>;

/// Table-based construction scope.
///
/// Constructors are registered under their full scoped path (for instance `"app::Database"`),
/// matching the lookup the resolver performs with its prefix and a bare name.
#[derive(Default)]
pub struct ScopedFactory {
    constructors: HashMap<String, Constructor>,
}

impl ScopedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain type built with its [Default] implementation
    pub fn plain<T: Default + Any + Send + Sync>(self, path: &str) -> Self {
        self.with(path, || Ok(Component::plain(T::default())))
    }

    /// Register a dependency-aware type built with its [Default] implementation
    pub fn maker<T: Default + Maker>(self, path: &str) -> Self {
        self.with(path, || Ok(Component::aware(T::default())))
    }

    /// Register a fallible constructor
    pub fn with<F>(mut self, path: &str, constructor: F) -> Self
    where
        F: Fn() -> Result<Component, BoxError> + Send + Sync + 'static,
    {
        self.constructors.insert(path.to_string(), Box::new(constructor));
        self
    }

    pub fn knows(&self, path: &str) -> bool {
        self.constructors.contains_key(path)
    }
}

impl ConstructionScope for ScopedFactory {
    fn construct(&self, path: &str) -> Result<Component, ConstructError> {
        let constructor = self
            .constructors
            .get(path)
            .ok_or_else(|| ConstructError::unknown(path))?;
        constructor().map_err(|e| ConstructError::failed(path, e))
    }
}

/// Requirements received so far by an [InstanceMaker]
#[derive(Default)]
pub struct Supplies(IndexMap<String, Instance>);

impl Supplies {
    /// Typed handle on a received requirement
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.0.get(name).and_then(|instance| instance.clone().downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type Build<T> = Box<dyn Fn(&Supplies) -> T + Send + Sync>;

/// Maker which wires itself, then builds and holds a product.
///
/// It requires a fixed list of names. Once all of them have been delivered, the build
/// function runs on the collected [Supplies] and the result is kept as the instance.
/// Use [crate::MakerBot::get_instance] to retrieve the product by the maker's name.
pub struct InstanceMaker<T> {
    requirements: Vec<String>,
    supplies: Supplies,
    build: Build<T>,
    instance: Option<Arc<T>>,
}

impl<T: Any + Send + Sync> InstanceMaker<T> {
    pub fn new<F>(requirements: &[&str], build: F) -> Self
    where
        F: Fn(&Supplies) -> T + Send + Sync + 'static,
    {
        Self {
            requirements: requirements.iter().map(|r| r.to_string()).collect(),
            supplies: Supplies::default(),
            build: Box::new(build),
            instance: None,
        }
    }

    pub fn instance(&self) -> Option<Arc<T>> {
        self.instance.clone()
    }

    /// Replace the product, for instance with a pre-built one
    pub fn set_instance(&mut self, instance: T) {
        self.instance = Some(Arc::new(instance));
    }

    fn build_when_supplied(&mut self) {
        let complete = self.requirements.iter().all(|r| self.supplies.contains(r));
        if complete && self.instance.is_none() {
            self.instance = Some(Arc::new((self.build)(&self.supplies)));
        }
    }
}

impl<T: Any + Send + Sync> Maker for InstanceMaker<T> {
    fn inject_dependency(&mut self, delivery: Option<Delivery<'_>>) -> Vec<String> {
        match delivery {
            None => {
                self.build_when_supplied();
                self.requirements.clone()
            }
            Some(d) => {
                self.supplies.0.insert(d.name.to_string(), d.instance.clone());
                self.build_when_supplied();
                vec![]
            }
        }
    }
}

/// Scope which knows nothing, for resolvers fed only with pre-built instances
pub struct EmptyScope;

impl ConstructionScope for EmptyScope {
    fn construct(&self, path: &str) -> Result<Component, ConstructError> {
        Err(ConstructError::unknown(path))
    }
}

/// Bare name of a type: its last path segment, without generic parameters.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
