//! The `taxi` management binary.
//!
//! ```bash
//! taxi --settings taxi.toml migrate
//! taxi createdriver --username jdoe --password 'Cobalt-Fern-71' \
//!     --license-number ABC12345 --first-name John --last-name Doe
//! ```

use anyhow::Context;
use taxi_cli::command::{CommandRegistry, SETTINGS_ARG};
use taxi_cli::commands::register_builtin_commands;
use taxi_core::settings_loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry.build_cli().get_matches();

    let settings = match matches.get_one::<String>(SETTINGS_ARG) {
        Some(path) => settings_loader::from_file_with_env(path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => settings_loader::from_env().context("loading settings from the environment")?,
    };
    taxi_core::logging::setup_logging(&settings);

    registry.execute(&matches, &settings).await?;
    Ok(())
}
