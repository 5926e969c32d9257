//! `ecargraph config`: Configuration management commands.

use super::Overrides;

pub fn validate(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match overrides.load() {
        Ok(config) => {
            println!("  Config parsed and validated");
            println!();
            println!("  Alpha:       {}", config.alpha);
            println!("  Zero:        {}", config.zero);
            println!("  Alpha HTTP:  {}", config.alpha_http);
            println!("  Loader:      {} ({})", config.loader.binary, config.loader.format);
            println!("  Xidmap:      {}", config.loader.xidmap);
            println!(
                "  Filter:      {}",
                config.filter.as_deref().unwrap_or("none")
            );
        }
        Err(e) => {
            println!("  Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = overrides
        .load()
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = overrides.config_path();
    println!("{}", config_path.display());
    if !config_path.exists() {
        println!("(not present, defaults apply)");
    }
    Ok(())
}
