//! Runtime dependency resolver wiring named components into a fully satisfied graph.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use makerbot::*;
//! // A plain component and a dependency-aware one
//! #[derive(Default)]
//! struct Config {
//!     url: String,
//! }
//!
//! #[derive(Default)]
//! struct Database {
//!     config: Option<Arc<Config>>,
//! }
//!
//! impl Maker for Database {
//!     fn inject_dependency(&mut self, delivery: Option<Delivery<'_>>) -> Vec<String> {
//!         match delivery {
//!             None => vec!["Config".to_string()],
//!             Some(d) => {
//!                 self.config = d.downcast::<Config>();
//!                 vec![]
//!             }
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), WiringError> {
//! // Tell the resolver how to build default instances from bare names
//! let scope = ScopedFactory::new()
//!     .plain::<Config>("app::Config")
//!     .maker::<Database>("app::Database");
//!
//! let mut bot = MakerBot::with_prefix(scope, "app::");
//! let db: Arc<Database> = bot.get("Database")?;
//! assert!(db.config.is_some());
//! assert!(bot.resolved_maker_names().contains("Config"));
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Every component is stored under a unique name. A component implementing [Maker] is asked for
//! its requirements as soon as it is added. Each requirement missing from the resolver is built
//! through the [ConstructionScope] using the configured prefix and the bare name, and may have
//! requirements of its own.
//!
//! * [MakerBot::resolve] repeatedly scans the pending makers in insertion order. A requirement is
//!   delivered only once it is fully wired itself. A delivery may reveal new requirements.
//! * A maker leaves the pending set when all its requirements are delivered and the last deliveries
//!   revealed nothing new. It is then sealed into a shared [Instance].
//! * If a full scan changes nothing, the remaining makers wait on each other and resolution
//!   fails with [WiringError::UnresolvableGraph].

mod helpers;
mod inject;
mod registry;
mod resolve;

pub use helpers::{short_type_name, EmptyScope, InstanceMaker, ScopedFactory, Supplies};
pub use inject::{MakerBot, SelfHandle, DEFAULT_SCOPE, SELF_NAME};
pub use resolve::{
    BoxError, Component, ConstructError, ConstructionScope, Delivery, Instance, IntoInstance, Maker, WiringError,
};
