use crate::heater::Heater;
use crate::logger::CoffeeLogger;
use diy_di::inject::Inject;
use diy_di::instance_provider::InstancePtr;
use diy_di::register_injectable;

pub trait Pump: Send + Sync {
    fn pump(&self);
}

/// Pumps water only while the heater is hot.
pub struct Thermosiphon {
    logger: InstancePtr<CoffeeLogger>,
    heater: InstancePtr<dyn Heater>,
}

impl Inject for Thermosiphon {
    type Parameters = (InstancePtr<CoffeeLogger>, InstancePtr<dyn Heater>);

    fn inject((logger, heater): Self::Parameters) -> Self {
        Self { logger, heater }
    }
}

register_injectable!(Thermosiphon);

impl Pump for Thermosiphon {
    fn pump(&self) {
        if self.heater.is_hot() {
            self.logger.log("=> => pumping => =>");
        }
    }
}
