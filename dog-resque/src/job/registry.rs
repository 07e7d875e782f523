use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::debug;

use crate::{JobArgs, JobError, ResqueResult, ResqueError};
use super::{JobHandler, NamedJob};

/// Builds a handler from its arguments and queue name
pub type HandlerConstructor =
    Arc<dyn Fn(JobArgs, &str) -> Result<Box<dyn JobHandler>, JobError> + Send + Sync>;

/// Resolves a class identifier into an executable handler
pub trait JobFactory: Send + Sync {
    /// Construct the handler for `class` with `args`, reserved from `queue`
    fn create(&self, class: &str, args: JobArgs, queue: &str) -> ResqueResult<Box<dyn JobHandler>>;
}

/// Registry of handler constructors keyed by class name
pub struct JobRegistry {
    constructors: RwLock<HashMap<String, HandlerConstructor>>,
}

impl JobRegistry {
    /// Create a new job registry
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Register a typed handler under its `CLASS`
    pub fn register<J: NamedJob>(&self) -> ResqueResult<()> {
        self.register_fn(J::CLASS, |args, queue| {
            J::from_args(args, queue).map(|job| Box::new(job) as Box<dyn JobHandler>)
        })
    }

    /// Register a constructor closure under `class`
    pub fn register_fn<F>(&self, class: &str, constructor: F) -> ResqueResult<()>
    where
        F: Fn(JobArgs, &str) -> Result<Box<dyn JobHandler>, JobError> + Send + Sync + 'static,
    {
        let mut constructors = self.constructors.write();
        if constructors.contains_key(class) {
            return Err(ResqueError::invalid_argument(format!(
                "Job class '{}' already registered",
                class
            )));
        }

        constructors.insert(class.to_string(), Arc::new(constructor));
        debug!("Registered job class: {}", class);
        Ok(())
    }

    /// Check if a class is registered
    pub fn is_registered(&self, class: &str) -> bool {
        self.constructors.read().contains_key(class)
    }

    /// Get all registered classes, sorted
    pub fn registered_classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.constructors.read().keys().cloned().collect();
        classes.sort();
        classes
    }

    fn constructor(&self, class: &str) -> Option<HandlerConstructor> {
        self.constructors.read().get(class).cloned()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Default factory: looks classes up in a `JobRegistry`
#[derive(Clone)]
pub struct RegistryJobFactory {
    registry: Arc<JobRegistry>,
}

impl RegistryJobFactory {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }
}

impl JobFactory for RegistryJobFactory {
    fn create(&self, class: &str, args: JobArgs, queue: &str) -> ResqueResult<Box<dyn JobHandler>> {
        let constructor = self
            .registry
            .constructor(class)
            .ok_or_else(|| ResqueError::HandlerNotFound(class.to_string()))?;

        Ok(constructor(args, queue)?)
    }
}
