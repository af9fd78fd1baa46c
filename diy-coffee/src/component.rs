use crate::coffee_maker::CoffeeMaker;
use crate::heater::{ElectricHeater, Heater};
use crate::logger::CoffeeLogger;
use crate::pump::{Pump, Thermosiphon};
use diy_di::instance_provider::InstancePtr;
use diy_di::{binds, component};

pub struct CoffeeBinds;

#[binds]
impl CoffeeBinds {
    pub fn bind_heater(heater: InstancePtr<ElectricHeater>) -> InstancePtr<dyn Heater> {
        heater
    }

    pub fn bind_pump(pump: InstancePtr<Thermosiphon>) -> InstancePtr<dyn Pump> {
        pump
    }
}

#[component(modules(CoffeeBinds))]
pub trait CoffeeComponent {
    fn coffee_maker(&self) -> InstancePtr<CoffeeMaker>;

    fn logger(&self) -> InstancePtr<CoffeeLogger>;

    fn pump(&self) -> InstancePtr<dyn Pump>;
}
