//! Storage behind the resolver: named component slots and the pending-requirement map.
//!
//! Both maps keep insertion order, so scans over subjects and requirements are deterministic.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::resolve::{Component, Instance, IntoInstance, Maker};

/// State of a registered component
enum Slot {
    /// Dependency-aware component still receiving requirements, only empty while being sealed
    Wiring(Option<Box<dyn Maker>>),
    /// Fully wired component, ready to be delivered
    Ready(Instance),
}

impl From<Component> for Slot {
    fn from(component: Component) -> Self {
        match component {
            Component::Plain(instance) => Slot::Ready(instance),
            Component::Aware(maker) => Slot::Wiring(Some(maker)),
        }
    }
}

/// Name-indexed store of components. Grows monotonically.
#[derive(Default)]
pub(crate) struct Registry(IndexMap<String, Slot>);

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Store a new component. Returns false, leaving the registry untouched, if the name is taken.
    pub fn insert(&mut self, name: &str, component: Component) -> bool {
        match self.0.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(component.into());
                true
            }
        }
    }

    /// Retrieve a sealed instance
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        match self.0.get(name) {
            Some(Slot::Ready(instance)) => Some(instance),
            _ => None,
        }
    }

    /// Retrieve a component which is still being wired
    pub fn maker_mut(&mut self, name: &str) -> Option<&mut (dyn Maker + 'static)> {
        match self.0.get_mut(name) {
            Some(Slot::Wiring(Some(maker))) => Some(&mut **maker),
            _ => None,
        }
    }

    /// Turn a wired maker into a shareable instance. Sealing twice is a no-op.
    pub fn seal(&mut self, name: &str) {
        if let Some(slot) = self.0.get_mut(name) {
            if let Slot::Wiring(maker) = slot {
                if let Some(maker) = maker.take() {
                    *slot = Slot::Ready(IntoInstance::into_instance(maker));
                }
            }
        }
    }
}

/// Requirements of a single subject, flagged `true` while still unresolved
pub(crate) type RequirementSet = IndexMap<String, bool>;

/// Subjects which are not fully wired yet, with their requirement sets.
///
/// A name is absent from this map exactly when its component is fully wired.
#[derive(Default)]
pub(crate) struct PendingMap(IndexMap<String, RequirementSet>);

impl PendingMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn subjects(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Names still flagged unresolved for a subject, in insertion order
    pub fn unresolved(&self, subject: &str) -> Vec<String> {
        self.0
            .get(subject)
            .map(|set| {
                set.iter()
                    .filter(|(_, unresolved)| **unresolved)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a requirement for a subject. Returns true if it was not known yet.
    pub fn require(&mut self, subject: &str, requirement: &str) -> bool {
        let set = self.0.entry(subject.to_string()).or_default();
        if set.contains_key(requirement) {
            return false;
        }
        set.insert(requirement.to_string(), true);
        true
    }

    pub fn mark_resolved(&mut self, subject: &str, requirement: &str) {
        if let Some(flag) = self.0.get_mut(subject).and_then(|set| set.get_mut(requirement)) {
            *flag = false;
        }
    }

    pub fn remove(&mut self, subject: &str) {
        self.0.shift_remove(subject);
    }

    /// Ordered copy of every subject with its unresolved requirements
    pub fn snapshot(&self) -> Vec<(String, Vec<String>)> {
        self.0
            .keys()
            .map(|subject| (subject.clone(), self.unresolved(subject)))
            .collect()
    }
}
