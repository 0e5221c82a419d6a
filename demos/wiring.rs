use std::sync::Arc;

use makerbot::*;
use tracing_subscriber::EnvFilter;

// Regular structs, some of them aware of their dependencies

#[derive(Default)]
struct Config {
    dsn: String,
}

impl Config {
    fn load() -> Self {
        Self {
            dsn: "postgres://localhost/app".to_string(),
        }
    }
}

#[derive(Default)]
struct Database {
    config: Option<Arc<Config>>,
}

impl Maker for Database {
    fn inject_dependency(&mut self, delivery: Option<Delivery<'_>>) -> Vec<String> {
        match delivery {
            None => vec!["Config".to_string()],
            Some(d) => {
                self.config = d.downcast::<Config>();
                vec![]
            }
        }
    }
}

/// Only learns that it needs a cache once the database is known
#[derive(Default)]
struct Repository {
    database: Option<Arc<Database>>,
    cache: Option<Arc<Cache>>,
}

#[derive(Default)]
struct Cache;

impl Maker for Repository {
    fn inject_dependency(&mut self, delivery: Option<Delivery<'_>>) -> Vec<String> {
        let Some(d) = delivery else {
            return vec!["Database".to_string()];
        };
        match d.name {
            "Database" => {
                self.database = d.downcast::<Database>();
                vec!["Cache".to_string()]
            }
            "Cache" => {
                self.cache = d.downcast::<Cache>();
                vec![]
            }
            _ => vec![],
        }
    }
}

fn main() -> Result<(), WiringError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("makerbot=debug")))
        .init();

    let scope = ScopedFactory::new()
        .maker::<Database>("app::Database")
        .maker::<Repository>("app::Repository")
        .plain::<Cache>("app::Cache");

    let mut bot = MakerBot::with_prefix(scope, "app::");
    bot.add_instance(Config::load())?;

    let repository: Arc<Repository> = bot.get("Repository")?;
    let dsn = repository
        .database
        .as_ref()
        .and_then(|db| db.config.as_ref())
        .map(|config| config.dsn.as_str())
        .unwrap_or("<none>");
    println!("repository wired on {} (cache: {})", dsn, repository.cache.is_some());
    println!("wired makers: {:?}", bot.resolved_maker_names());

    Ok(())
}
