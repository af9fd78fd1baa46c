use crate::logger::CoffeeLogger;
use diy_di::instance_provider::InstancePtr;
use diy_di::Injectable;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait Heater: Send + Sync {
    fn on(&self);

    fn off(&self);

    fn is_hot(&self) -> bool;
}

#[derive(Injectable)]
#[inject(singleton)]
pub struct ElectricHeater {
    logger: InstancePtr<CoffeeLogger>,
    #[inject(default)]
    heating: AtomicBool,
}

impl Heater for ElectricHeater {
    fn on(&self) {
        self.heating.store(true, Ordering::SeqCst);
        self.logger.log("~ ~ ~ heating ~ ~ ~");
    }

    fn off(&self) {
        self.heating.store(false, Ordering::SeqCst);
        self.logger.log("~ ~ ~ cooling ~ ~ ~");
    }

    fn is_hot(&self) -> bool {
        self.heating.load(Ordering::SeqCst)
    }
}
