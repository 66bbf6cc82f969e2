use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, Config, ImagesConfig, ServerConfig};
use crate::scoring::{validate_scoring, CappedTerm, ScoringConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Keep asking until `parse` accepts the input
fn prompt_parsed<T, F>(message: &str, default: &str, parse: F) -> Result<T>
where
    F: Fn(&str) -> Result<T, String>,
{
    loop {
        let input = prompt_with_default(message, default)?;
        match parse(&input) {
            Ok(value) => return Ok(value),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

fn parse_weight(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err("must be a non-negative number".to_string()),
    }
}

/// Ask for a capped term's weight, keeping its cap
fn prompt_term(label: &str, term: CappedTerm) -> Result<CappedTerm> {
    let weight = prompt_parsed(
        &format!("{} weight (counts up to {} items)", label, term.cap),
        &term.weight.to_string(),
        parse_weight,
    )?;
    Ok(CappedTerm::new(term.cap, weight))
}

fn optional(input: String) -> Option<String> {
    if input.is_empty() || input == "none" {
        None
    } else {
        Some(input)
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("oilboard configuration");
    println!("======================");
    println!();

    let defaults = Config::default();

    // 1. Catalog
    println!("The catalog is the JSON file produced by `oilboard merge` (or `scrape pages`).");
    let data_file = PathBuf::from(prompt_with_default(
        "Catalog file",
        &defaults.data_file.display().to_string(),
    )?);

    // 2. Server
    println!();
    let bind = prompt_with_default("Address to listen on", &defaults.server.bind)?;
    let port = prompt_parsed("Port", &defaults.server.port.to_string(), |s| {
        s.parse::<u16>()
            .map_err(|_| "must be a port number between 0 and 65535".to_string())
    })?;
    let open_browser = prompt_yes_no("Open the dashboard in a browser on start?", false)?;

    // 3. Images
    println!();
    println!("Oil images are searched on Google, Unsplash, then Bing. Google and Unsplash need keys;");
    println!("leave them empty to skip a provider or to use the OILBOARD_* environment variables.");
    let google_api_key = optional(prompt_with_default("Google API key", "none")?);
    let google_cse_id = if google_api_key.is_some() {
        optional(prompt_with_default("Google custom search engine id", "none")?)
    } else {
        None
    };
    let unsplash_access_key = optional(prompt_with_default("Unsplash access key", "none")?);
    let refresh_after = prompt_parsed(
        "Refresh cached images after",
        &defaults.images.refresh_after,
        |s| {
            humantime::parse_duration(s)
                .map(|_| s.to_string())
                .map_err(|e| e.to_string())
        },
    )?;

    // 4. Scoring
    println!();
    let scoring = if prompt_yes_no("Adjust scoring weights? (n accepts defaults)", false)? {
        let stock = ScoringConfig::default();
        println!("Each list counts up to a cap; a full list earns the whole weight.");
        let scoring = ScoringConfig {
            therapeutic: prompt_term("Therapeutic properties", stock.therapeutic)?,
            emotional: prompt_term("Emotional effects", stock.emotional)?,
            components: prompt_term("Main components", stock.components)?,
            blends: prompt_term("Blend partners", stock.blends)?,
            most_blended_bonus: prompt_parsed(
                "Bonus for the most blended oil",
                &stock.most_blended_bonus.to_string(),
                parse_weight,
            )?,
            ..stock
        };
        if let Err(errors) = validate_scoring(&scoring) {
            anyhow::bail!("Invalid scoring configuration: {}", errors.join("; "));
        }
        scoring
    } else {
        ScoringConfig::default()
    };

    // 5. Config path
    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    // Check if file already exists
    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 6. Write config
    let config = Config {
        data_file,
        server: ServerConfig {
            bind,
            port,
            open_browser,
        },
        images: ImagesConfig {
            refresh_after,
            google_api_key,
            google_cse_id,
            unsplash_access_key,
            ..ImagesConfig::default()
        },
        scoring,
    };
    write_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `oilboard` to start the dashboard.");

    Ok(())
}

/// Serialize `config` as YAML and write it atomically, creating parent directories
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("2.5"), Ok(2.5));
        assert!(parse_weight("-1").is_err());
        assert!(parse_weight("inf").is_err());
        assert!(parse_weight("lots").is_err());
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(String::new()), None);
        assert_eq!(optional("none".to_string()), None);
        assert_eq!(optional("abc".to_string()), Some("abc".to_string()));
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = std::env::temp_dir().join("oilboard-test-init");
        let path = dir.join("config.yaml");
        let _ = std::fs::remove_file(&path);

        let mut config = Config::default();
        config.server.port = 7777;
        config.images.unsplash_access_key = Some("key".to_string());
        write_config(&path, &config).unwrap();

        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }
}
