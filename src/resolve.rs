//! Contracts between the resolver and the components it wires
//!
//! A component enters the resolver as a [Component], which is either a plain value or a
//! dependency-aware [Maker]. Makers are asked for their requirements with a discovery call
//! and receive each satisfied requirement through a [Delivery].
//!
//! * The [Maker] trait is the dependency-aware capability.
//!   Its single method is called once with no delivery to discover the initial requirements,
//!   then once per satisfied requirement. Each call returns the requirement names it (still) needs.
//! * The [ConstructionScope] trait turns a scoped path (prefix followed by a bare name) into a
//!   fresh default [Component]. It is supplied to the resolver, never looked up globally.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// Shared, type-erased handle on a fully wired component
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by a failing constructor
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A satisfied requirement handed to a [Maker]
#[derive(Clone, Copy)]
pub struct Delivery<'a> {
    pub name: &'a str,
    pub instance: &'a Instance,
}

impl<'a> Delivery<'a> {
    pub fn new(name: &'a str, instance: &'a Instance) -> Self {
        Self { name, instance }
    }

    /// Obtain a typed handle on the delivered instance, if it has the expected type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

/// Conversion of a boxed maker into a shared [Instance] once it is fully wired.
///
/// This is implemented for every eligible type and should not be implemented by hand.
pub trait IntoInstance: Any + Send + Sync {
    fn into_instance(self: Box<Self>) -> Instance;
}

impl<T: Any + Send + Sync> IntoInstance for T {
    fn into_instance(self: Box<Self>) -> Instance {
        let boxed: Box<dyn Any + Send + Sync> = self;
        Arc::from(boxed)
    }
}

/// Dependency-aware component
///
/// The resolver first calls [Maker::inject_dependency] with `None` to discover the initial
/// requirements, then once with each satisfied requirement. The returned names may grow
/// as deliveries arrive: names already requested are ignored, new ones are constructed if needed
/// and delivered later. Returning an empty list signals that nothing more is needed.
pub trait Maker: IntoInstance {
    fn inject_dependency(&mut self, delivery: Option<Delivery<'_>>) -> Vec<String>;
}

/// A component as handed to the resolver
pub enum Component {
    /// A value without requirements
    Plain(Instance),
    /// A value which declares requirements and must be wired before use
    Aware(Box<dyn Maker>),
}

impl Component {
    pub fn plain<T: Any + Send + Sync>(value: T) -> Self {
        Component::Plain(Arc::new(value))
    }

    pub fn aware<T: Maker>(value: T) -> Self {
        Component::Aware(Box::new(value))
    }

    pub fn is_aware(&self) -> bool {
        matches!(self, Component::Aware(_))
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Plain(_) => f.write_str("Component::Plain"),
            Component::Aware(_) => f.write_str("Component::Aware"),
        }
    }
}

/// Build default components from scoped paths
pub trait ConstructionScope: Send + Sync {
    /// Construct a fresh default component for the given path (scope prefix followed by the bare name).
    fn construct(&self, path: &str) -> Result<Component, ConstructError>;
}

/// Any suitable closure can act as a construction scope
impl<F> ConstructionScope for F
where
    F: Fn(&str) -> Result<Component, ConstructError> + Send + Sync,
{
    fn construct(&self, path: &str) -> Result<Component, ConstructError> {
        self(path)
    }
}

/// Errors reported by a [ConstructionScope]
#[derive(Error, Debug)]
pub enum ConstructError {
    #[error("No constructor registered for '{path}'")]
    Unknown { path: String },
    #[error("Constructor for '{path}' failed: {source}")]
    Failed {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl ConstructError {
    pub fn unknown(path: impl Into<String>) -> Self {
        Self::Unknown { path: path.into() }
    }

    pub fn failed(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Errors triggered during the wiring process
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("Maker '{name}' was already added")]
    DuplicateName { name: String },
    #[error("Could not construct maker '{name}' from '{path}'")]
    Construction {
        name: String,
        path: String,
        #[source]
        source: ConstructError,
    },
    #[error("Unresolvable dependencies, no progress possible: {}", format_pending(.pending))]
    UnresolvableGraph { pending: Vec<(String, Vec<String>)> },
    #[error("Maker '{name}' is not a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

fn format_pending(pending: &[(String, Vec<String>)]) -> String {
    pending
        .iter()
        .map(|(subject, requirements)| format!("{} -> [{}]", subject, requirements.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}
