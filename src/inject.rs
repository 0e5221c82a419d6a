use std::any::Any;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, trace, warn};

use crate::helpers::{short_type_name, InstanceMaker};
use crate::registry::{PendingMap, Registry};
use crate::resolve::*;

/// Prefix used to turn bare names into scoped paths when none is configured
pub const DEFAULT_SCOPE: &str = "makerbot::";

/// Name under which every resolver registers its [SelfHandle]
pub const SELF_NAME: &str = "MakerBot";

/// What a component receives when it requires [SELF_NAME].
///
/// It exposes the construction scope of the resolver which wired it, together with the
/// prefix in effect when that resolver was created.
pub struct SelfHandle {
    scope: Arc<dyn ConstructionScope>,
    prefix: String,
}

impl SelfHandle {
    pub fn scope(&self) -> &Arc<dyn ConstructionScope> {
        &self.scope
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Construct from a full scoped path
    pub fn construct(&self, path: &str) -> Result<Component, ConstructError> {
        self.scope.construct(path)
    }

    /// Construct from a bare name, prefixed like the resolver does
    pub fn construct_bare(&self, name: &str) -> Result<Component, ConstructError> {
        self.scope.construct(&format!("{}{}", self.prefix, name))
    }
}

/// Runtime dependency resolver.
///
/// Components are stored by name. Dependency-aware components ([Maker]) announce their
/// requirements, which are constructed on demand through the [ConstructionScope] and delivered
/// once they are fully wired themselves. Since a maker can reveal new requirements after each
/// delivery, [MakerBot::resolve] iterates until no requirement is left pending.
pub struct MakerBot {
    registry: Registry,
    pending: PendingMap,
    scope: Arc<dyn ConstructionScope>,
    prefix: String,
}

impl MakerBot {
    /// Create a resolver looking up bare names under [DEFAULT_SCOPE]
    pub fn new(scope: impl ConstructionScope + 'static) -> Self {
        Self::with_prefix(scope, DEFAULT_SCOPE)
    }

    /// Create a resolver looking up bare names under the given prefix
    pub fn with_prefix(scope: impl ConstructionScope + 'static, prefix: &str) -> Self {
        let mut bot = Self {
            registry: Registry::default(),
            pending: PendingMap::default(),
            scope: Arc::new(scope),
            prefix: String::new(),
        };
        bot.set_construction_scope(prefix);
        bot.bootstrap();
        bot
    }

    fn bootstrap(&mut self) {
        let handle = SelfHandle {
            scope: self.scope.clone(),
            prefix: self.prefix.clone(),
        };
        self.registry.insert(SELF_NAME, Component::plain(handle));
    }

    /// Change the prefix of scoped paths. An empty prefix restores [DEFAULT_SCOPE].
    pub fn set_construction_scope(&mut self, prefix: &str) -> &mut Self {
        self.prefix = if prefix.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            prefix.to_string()
        };
        self
    }

    pub fn construction_scope(&self) -> &str {
        &self.prefix
    }

    /// Add a maker by name, built by the construction scope
    pub fn add_maker(&mut self, name: &str) -> Result<&mut Self, WiringError> {
        self.ensure_vacant(name)?;
        let component = self.construct(name)?;
        self.register(name, component)?;
        Ok(self)
    }

    /// Add a pre-built component under an explicit name
    pub fn add_named(&mut self, name: &str, component: Component) -> Result<&mut Self, WiringError> {
        self.register(name, component)?;
        Ok(self)
    }

    /// Add a plain instance, named after its type
    pub fn add_instance<T: Any + Send + Sync>(&mut self, value: T) -> Result<&mut Self, WiringError> {
        self.add_named(short_type_name::<T>(), Component::plain(value))
    }

    /// Add a dependency-aware instance, named after its type
    pub fn add_aware<T: Maker>(&mut self, value: T) -> Result<&mut Self, WiringError> {
        self.add_named(short_type_name::<T>(), Component::aware(value))
    }

    /// Wire everything, then return the named instance, constructing it if needed.
    pub fn get_maker(&mut self, name: &str) -> Result<Instance, WiringError> {
        self.resolve()?;
        if !self.registry.contains(name) {
            self.add_maker(name)?;
            self.resolve()?;
        }
        self.registry
            .instance(name)
            .cloned()
            .ok_or_else(|| WiringError::UnresolvableGraph {
                pending: self.pending.snapshot(),
            })
    }

    /// Typed variant of [MakerBot::get_maker]
    pub fn get<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>, WiringError> {
        self.get_maker(name)?
            .downcast::<T>()
            .map_err(|_| WiringError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Product held by the [InstanceMaker] registered under the given name
    pub fn get_instance<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>, WiringError> {
        self.get::<InstanceMaker<T>>(name)?
            .instance()
            .ok_or_else(|| WiringError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Deliver requirements until no subject is pending.
    ///
    /// Fails with [WiringError::UnresolvableGraph] when a full scan changes nothing,
    /// which happens when subjects wait on each other.
    pub fn resolve(&mut self) -> Result<&mut Self, WiringError> {
        let mut pass = 0usize;
        while !self.pending.is_empty() {
            pass += 1;
            trace!(pass, "scanning pending makers");
            if !self.scan()? {
                let pending = self.pending.snapshot();
                warn!(?pending, "no progress, giving up");
                return Err(WiringError::UnresolvableGraph { pending });
            }
        }
        Ok(self)
    }

    /// Names of every component which is fully wired right now
    pub fn resolved_maker_names(&self) -> IndexSet<String> {
        self.registry
            .names()
            .filter(|name| !self.pending.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Requirements not yet delivered to a pending maker
    pub fn pending_requirements(&self, name: &str) -> Vec<String> {
        self.pending.unresolved(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn maker_names(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    fn ensure_vacant(&self, name: &str) -> Result<(), WiringError> {
        if self.registry.contains(name) {
            return Err(WiringError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn construct(&self, name: &str) -> Result<Component, WiringError> {
        let path = format!("{}{}", self.prefix, name);
        self.scope
            .construct(&path)
            .map_err(|source| WiringError::Construction {
                name: name.to_string(),
                path,
                source,
            })
    }

    fn register(&mut self, name: &str, component: Component) -> Result<(), WiringError> {
        let aware = component.is_aware();
        if !self.registry.insert(name, component) {
            return Err(WiringError::DuplicateName {
                name: name.to_string(),
            });
        }
        debug!(maker = name, aware, "registered maker");

        let Some(maker) = self.registry.maker_mut(name) else {
            return Ok(());
        };
        let requirements = maker.inject_dependency(None);
        if requirements.is_empty() {
            self.registry.seal(name);
            return Ok(());
        }
        self.append_maker_dependency(name, requirements)?;
        Ok(())
    }

    /// Fold requirement names into the subject's set, adding unknown ones to the registry.
    ///
    /// Returns true if at least one requirement was new for this subject.
    fn append_maker_dependency(&mut self, subject: &str, requirements: Vec<String>) -> Result<bool, WiringError> {
        // record every name before building any, so a failed construction loses nothing
        let mut new = Vec::new();
        for requirement in requirements {
            if self.pending.require(subject, &requirement) {
                debug!(maker = subject, requirement = %requirement, "new requirement");
                new.push(requirement);
            }
        }
        for requirement in &new {
            if !self.registry.contains(requirement) {
                self.add_maker(requirement)?;
            }
        }
        Ok(!new.is_empty())
    }

    /// Scan pending subjects in order, stopping at the first one which becomes fully wired.
    ///
    /// Returns false if nothing was delivered, discovered or completed.
    fn scan(&mut self) -> Result<bool, WiringError> {
        let mut progress = false;
        for subject in self.pending.subjects() {
            let mut resolved = true;
            for requirement in self.pending.unresolved(&subject) {
                if self.pending.contains(&requirement) {
                    resolved = false;
                    continue;
                }
                let Some(instance) = self.registry.instance(&requirement).cloned() else {
                    resolved = false;
                    // an earlier construction failed: try again
                    if !self.registry.contains(&requirement) {
                        self.add_maker(&requirement)?;
                        progress = true;
                    }
                    continue;
                };
                let Some(maker) = self.registry.maker_mut(&subject) else {
                    resolved = false;
                    continue;
                };
                debug!(maker = %subject, requirement = %requirement, "injecting");
                let discovered = maker.inject_dependency(Some(Delivery::new(&requirement, &instance)));
                self.pending.mark_resolved(&subject, &requirement);
                progress = true;
                if self.append_maker_dependency(&subject, discovered)? {
                    resolved = false;
                }
            }

            if resolved {
                self.pending.remove(&subject);
                self.registry.seal(&subject);
                debug!(maker = %subject, "maker wired");
                return Ok(true);
            }
        }
        Ok(progress)
    }
}

impl std::fmt::Debug for MakerBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MakerBot")
            .field("prefix", &self.prefix)
            .field("makers", &self.maker_names())
            .field("pending", &self.pending.snapshot())
            .finish()
    }
}
