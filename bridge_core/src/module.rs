use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModuleError;

/// An already-compiled interpreter with a single entry point.
#[async_trait(?Send)]
pub trait ExecutionModule {
    async fn interpret(&self, source: &str) -> Result<String, ModuleError>;
}

/// Produces an `ExecutionModule`. Loading may be slow (a network fetch, a process lookup), so
/// it's only done when a run first needs the module.
#[async_trait(?Send)]
pub trait ModuleLoader {
    type Module: ExecutionModule;

    async fn load(&self) -> Result<Self::Module, ModuleError>;
}

/// Memoizes the first successful load. Failed loads are not remembered, so the next
/// `acquire` tries again.
pub struct ModuleCache<L: ModuleLoader> {
    loader: L,
    module: RefCell<Option<Rc<L::Module>>>,
    attempts: Cell<usize>,
}

impl<L: ModuleLoader> ModuleCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            module: RefCell::new(None),
            attempts: Cell::new(0),
        }
    }

    pub async fn acquire(&self) -> Result<Rc<L::Module>, ModuleError> {
        let cached = self.module.borrow().clone();
        if let Some(module) = cached {
            debug!("execution module cache hit");
            return Ok(module);
        }

        self.attempts.set(self.attempts.get() + 1);
        debug!(attempt = self.attempts.get(), "loading execution module");
        let module = Rc::new(self.loader.load().await?);
        *self.module.borrow_mut() = Some(Rc::clone(&module));
        Ok(module)
    }

    pub fn is_loaded(&self) -> bool {
        self.module.borrow().is_some()
    }

    /// How many times the loader has been asked for a module, successful or not.
    pub fn load_attempts(&self) -> usize {
        self.attempts.get()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}
