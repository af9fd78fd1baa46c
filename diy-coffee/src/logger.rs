use diy_di::Injectable;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Collects messages of all coffee making steps.
#[derive(Injectable, Default)]
#[inject(singleton)]
pub struct CoffeeLogger {
    #[inject(default)]
    logs: Mutex<Vec<String>>,
}

impl CoffeeLogger {
    pub fn log<M: Into<String>>(&self, message: M) {
        let message = message.into();
        info!("{message}");

        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
