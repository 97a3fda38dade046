//! The `createmanufacturer` management command.

use async_trait::async_trait;
use taxi::{Manufacturer, ManufacturerRepository};
use taxi_core::{Settings, TaxiResult};

use super::required_arg;
use crate::command::ManagementCommand;

/// Adds a manufacturer that cars can then reference.
pub struct CreateManufacturerCommand;

#[async_trait]
impl ManagementCommand for CreateManufacturerCommand {
    fn name(&self) -> &'static str {
        "createmanufacturer"
    }

    fn help(&self) -> &'static str {
        "Add a car manufacturer"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("name")
                .long("name")
                .required(true)
                .help("Manufacturer name, unique"),
        )
        .arg(
            clap::Arg::new("country")
                .long("country")
                .required(true)
                .help("Country of origin"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let name = required_arg(matches, "name")?;
        let country = required_arg(matches, "country")?;

        let store = taxi::store::open(settings).await?;
        let manufacturer = store
            .create_manufacturer(Manufacturer::new(name, country))
            .await?;

        tracing::info!(name, "manufacturer created");
        println!(
            "Created manufacturer {} (id {})",
            manufacturer.name,
            manufacturer.id.unwrap_or_default()
        );
        Ok(())
    }
}
