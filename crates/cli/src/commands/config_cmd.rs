//! `officeclaw config`: Show configuration.

use officeclaw_config::AppConfig;

pub fn show(default: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(default)?);
    Ok(())
}

fn render(default: bool) -> Result<String, Box<dyn std::error::Error>> {
    if default {
        return Ok(AppConfig::default_toml());
    }
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let path = AppConfig::config_dir().join("config.toml");
    Ok(format!("# {}\n{}", path.display(), config.redacted_toml()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_back() {
        let text = render(true).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.default_model, AppConfig::default().default_model);
    }
}
