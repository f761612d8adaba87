use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::CpuPool;
use parking_lot::RwLock;
use std::sync::Arc;

pub struct Runtime {
    pool: Arc<CpuPool>,
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let pool = CpuPool::new(&config)?;

        Ok(Self {
            pool: Arc::new(pool),
            config,
        })
    }

    pub fn pool(&self) -> &CpuPool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

// Global runtime for simple API
static GLOBAL_RUNTIME: RwLock<Option<Arc<Runtime>>> = RwLock::new(None);

pub fn init() -> Result<()> {
    init_with_config(Config::default())
}

pub fn init_with_config(config: Config) -> Result<()> {
    let mut runtime = GLOBAL_RUNTIME.write();

    if runtime.is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let rt = Runtime::new(config)?;
    *runtime = Some(Arc::new(rt));

    Ok(())
}

/// The global runtime, if initialized.
pub fn handle() -> Result<Arc<Runtime>> {
    GLOBAL_RUNTIME
        .read()
        .as_ref()
        .cloned()
        .ok_or(Error::NotInitialized)
}

pub fn shutdown() {
    let mut runtime = GLOBAL_RUNTIME.write();
    *runtime = None;
}
