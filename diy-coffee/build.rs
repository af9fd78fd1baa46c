use diy_di_compiler::generator::Generator;
use std::env;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let generator = Generator::from_environment()?
        .with_source("src/logger.rs", "crate::logger")
        .with_source("src/heater.rs", "crate::heater")
        .with_source("src/pump.rs", "crate::pump")
        .with_source("src/coffee_maker.rs", "crate::coffee_maker")
        .with_source("src/component.rs", "crate::component");

    for path in generator.source_paths() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    generator.generate_to_file(out_dir.join("coffee_component.rs"))?;

    Ok(())
}
