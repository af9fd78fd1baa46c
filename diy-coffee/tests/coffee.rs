use diy_coffee::coffee_graph;
use diy_coffee::coffee_maker::CoffeeMaker;
use diy_coffee::component::CoffeeComponent;
use diy_coffee::logger::CoffeeLogger;
use diy_coffee::pump::Pump;
use diy_coffee::GeneratedCoffeeComponent;
use diy_di::instance_provider::{InstancePtr, TypedInstanceResolver};

const BREW_LOGS: [&str; 4] = [
    "~ ~ ~ heating ~ ~ ~",
    "=> => pumping => =>",
    " [_]P coffee! [_]P ",
    "~ ~ ~ cooling ~ ~ ~",
];

#[test]
fn should_brew_with_generated_component() {
    let component = GeneratedCoffeeComponent::new();
    component.coffee_maker().brew();

    assert_eq!(component.logger().logs(), BREW_LOGS);
}

#[test]
fn should_brew_with_object_graph() {
    let mut graph = coffee_graph();
    graph.resolve_typed::<CoffeeMaker>().unwrap().brew();

    assert_eq!(
        graph.resolve_typed::<CoffeeLogger>().unwrap().logs(),
        BREW_LOGS
    );
}

#[test]
fn should_share_singletons_in_generated_component() {
    let component = GeneratedCoffeeComponent::new();
    let first = component.coffee_maker();
    let second = component.coffee_maker();

    assert!(!InstancePtr::ptr_eq(&first, &second));
    assert!(InstancePtr::ptr_eq(first.logger(), &component.logger()));
    assert!(InstancePtr::ptr_eq(first.heater(), second.heater()));
}

#[test]
fn should_share_singletons_in_object_graph() {
    let mut graph = coffee_graph();
    let first = graph.resolve_typed::<CoffeeMaker>().unwrap();
    let second = graph.resolve_typed::<CoffeeMaker>().unwrap();

    assert!(!InstancePtr::ptr_eq(&first, &second));
    assert!(InstancePtr::ptr_eq(
        first.logger(),
        &graph.resolve_typed::<CoffeeLogger>().unwrap()
    ));
    assert!(InstancePtr::ptr_eq(first.heater(), second.heater()));
}

#[test]
fn should_not_share_singletons_between_contexts() {
    let first = GeneratedCoffeeComponent::new();
    let second = GeneratedCoffeeComponent::new();
    assert!(!InstancePtr::ptr_eq(&first.logger(), &second.logger()));

    let mut first = coffee_graph();
    let mut second = coffee_graph();
    assert!(!InstancePtr::ptr_eq(
        &first.resolve_typed::<CoffeeLogger>().unwrap(),
        &second.resolve_typed::<CoffeeLogger>().unwrap()
    ));
}

#[test]
fn should_create_fresh_pumps() {
    let component = GeneratedCoffeeComponent::new();
    let first = component.pump();
    let second = component.pump();
    assert!(!InstancePtr::ptr_eq(&first, &second));

    let mut graph = coffee_graph();
    let first = graph.resolve_typed::<dyn Pump>().unwrap();
    let second = graph.resolve_typed::<dyn Pump>().unwrap();
    assert!(!InstancePtr::ptr_eq(&first, &second));
}

#[test]
fn should_give_each_maker_its_own_pump() {
    let component = GeneratedCoffeeComponent::new();
    let first = component.coffee_maker();
    let second = component.coffee_maker();
    assert!(!InstancePtr::ptr_eq(first.pump(), second.pump()));

    let mut graph = coffee_graph();
    let first = graph.resolve_typed::<CoffeeMaker>().unwrap();
    let second = graph.resolve_typed::<CoffeeMaker>().unwrap();
    assert!(!InstancePtr::ptr_eq(first.pump(), second.pump()));
}

#[test]
fn should_not_pump_cold_water() {
    let component = GeneratedCoffeeComponent::new();
    component.pump().pump();

    assert!(component.logger().logs().is_empty());
}
