//! Units known to the `eloader` binary, keyed by file stem

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::Instant,
};

use eloader_config::LoaderConfig;
use eloader_di::{Args, DynError, ExternalModules, Instance, Unit, UnitCatalog};

/// Time since the container was bootstrapped
#[derive(Debug)]
pub struct Clock {
    started: Instant,
}
impl Clock {
    pub fn uptime_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

/// In-memory key value store shared by the routes
#[derive(Debug, Default)]
pub struct Store {
    entries: Mutex<BTreeMap<String, String>>,
}
impl Store {
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process environment, exposed as the external `env` module
pub fn external() -> ExternalModules {
    ExternalModules::new().add("env", || {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Ok(Instance::new(vars))
    })
}

pub fn catalog() -> UnitCatalog {
    UnitCatalog::new()
        .add("clock", || {
            Unit::constructor(|_| {
                Ok::<_, DynError>(Clock {
                    started: Instant::now(),
                })
            })
        })
        .add("store", || {
            Unit::constructor(|args: Args| {
                let clock = args.get::<Clock>(0)?;
                let store = Store::default();
                store.insert("booted_after_ms", clock.uptime_ms().to_string());
                Ok::<_, DynError>(store)
            })
            .with_signature("fn store(clock: &Clock) -> Store")
        })
        .add("health", || {
            Unit::procedure(|args: Args| {
                let clock = args.named::<Clock>("clock")?;
                tracing::info!("health: up for {}ms", clock.uptime_ms());
                Ok::<_, DynError>(())
            })
            .inject(["clock"])
        })
        .add("users", || {
            Unit::procedure(|args: Args| {
                let store = args.get::<Store>(0)?;
                store.insert("users", "[]");
                tracing::info!("users: store holds {} entries", store.len());
                Ok::<_, DynError>(())
            })
            .with_signature("fn users(store: Arc<Store>)")
        })
        .add("status", || {
            Unit::procedure(|args: Args| {
                let env = args.get::<HashMap<String, String>>(0)?;
                let config = args.get::<LoaderConfig>(1)?;
                tracing::info!(
                    "status: {} roots, {} environment variables",
                    config.roots.len(),
                    env.len()
                );
                Ok::<_, DynError>(())
            })
            .inject(["env", eloader_config::CONFIG_BINDING])
        })
}
