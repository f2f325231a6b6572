//! `officeclaw models`: List allowed models and aliases.

use officeclaw_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Provider: {} ({})", config.default_provider, config.provider_url());
    println!();
    println!("Allowed models:");
    for model in &config.models {
        let marker = if model.id == config.default_model { "*" } else { " " };
        match &model.routing {
            Some(routing) => println!("  {marker} {}  (routing: {routing})", model.id),
            None => println!("  {marker} {}", model.id),
        }
    }

    if !config.model_aliases.is_empty() {
        let mut aliases: Vec<_> = config.model_aliases.iter().collect();
        aliases.sort();
        println!();
        println!("Aliases:");
        for (alias, id) in aliases {
            println!("    {alias:<16} -> {id}");
        }
    }
    Ok(())
}
