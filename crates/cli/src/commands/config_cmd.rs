//! `draftsmith config` — show or initialize the configuration.

use draftsmith_config::AppConfig;

pub fn run(init: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if init {
        if config_path.exists() {
            println!("Config already exists: {}", config_path.display());
        } else {
            std::fs::create_dir_all(&config_dir)?;
            std::fs::write(&config_path, AppConfig::default_toml())?;
            println!("✅ Wrote default config: {}", config_path.display());
        }
        return Ok(());
    }

    let config = AppConfig::load()?;
    println!("Config file: {}", config_path.display());
    println!();
    println!("Provider:   {}", config.default_provider);
    println!("Model:      {}", config.default_model);
    println!(
        "API key:    {}",
        if config.has_api_key() { "set" } else { "not set" }
    );
    println!("Persona:    {}", config.persona.name);
    println!(
        "Formatting: max {} attempt(s), accept at {:.0}%",
        config.formatting.max_retries,
        config.formatting.accept_threshold * 100.0
    );

    Ok(())
}
