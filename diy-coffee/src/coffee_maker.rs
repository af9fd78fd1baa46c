use crate::heater::Heater;
use crate::logger::CoffeeLogger;
use crate::pump::Pump;
use diy_di::injectable;
use diy_di::instance_provider::InstancePtr;

pub struct CoffeeMaker {
    logger: InstancePtr<CoffeeLogger>,
    heater: InstancePtr<dyn Heater>,
    pump: InstancePtr<dyn Pump>,
}

#[injectable]
impl CoffeeMaker {
    #[inject]
    pub fn new(
        logger: InstancePtr<CoffeeLogger>,
        heater: InstancePtr<dyn Heater>,
        pump: InstancePtr<dyn Pump>,
    ) -> Self {
        Self {
            logger,
            heater,
            pump,
        }
    }

    pub fn brew(&self) {
        self.heater.on();
        self.pump.pump();
        self.logger.log(" [_]P coffee! [_]P ");
        self.heater.off();
    }

    pub fn logger(&self) -> &InstancePtr<CoffeeLogger> {
        &self.logger
    }

    pub fn heater(&self) -> &InstancePtr<dyn Heater> {
        &self.heater
    }

    pub fn pump(&self) -> &InstancePtr<dyn Pump> {
        &self.pump
    }
}
