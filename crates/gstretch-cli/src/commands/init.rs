use std::path::PathBuf;

use gstretch_core::config::{user_config_dir, StretchConfig, CONFIG_FILENAMES};

/// Write the built-in defaults to a configuration file.
///
/// Defaults to `~/gstretch/gstretch.yml`. Safe to run multiple times - won't
/// overwrite an existing file unless `force` is true.
pub fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<(), String> {
    let target = match path {
        Some(path) => path,
        None => user_config_dir()
            .ok_or("Could not determine home directory")?
            .join(CONFIG_FILENAMES[0]),
    };

    if target.exists() && !force {
        println!(
            "Skipped: {} (already exists, use --force to overwrite)",
            target.display()
        );
        return Ok(());
    }

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
    }

    let yaml = StretchConfig::default().to_yaml()?;
    std::fs::write(&target, yaml)
        .map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;

    println!("Configuration written to: {}", target.display());
    println!("Edit this file to change the default stretch parameters.");
    Ok(())
}
