//! The `createcar` management command.

use async_trait::async_trait;
use taxi::forms::CarCreationForm;
use taxi_core::{Settings, TaxiResult};
use taxi_forms::form::Form;

use super::{form_data, required_arg, required_pk, validate_and_save};
use crate::command::ManagementCommand;

/// Adds a car, optionally assigning drivers.
pub struct CreateCarCommand;

#[async_trait]
impl ManagementCommand for CreateCarCommand {
    fn name(&self) -> &'static str {
        "createcar"
    }

    fn help(&self) -> &'static str {
        "Add a car"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("model")
                .long("model")
                .required(true)
                .help("Car model"),
        )
        .arg(
            clap::Arg::new("manufacturer")
                .long("manufacturer")
                .required(true)
                .value_parser(clap::value_parser!(i64))
                .help("Manufacturer id"),
        )
        .arg(
            clap::Arg::new("driver")
                .long("driver")
                .action(clap::ArgAction::Append)
                .value_parser(clap::value_parser!(i64))
                .help("Driver id; repeat for several drivers"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let manufacturer = required_pk(matches, "manufacturer")?.to_string();
        let drivers: Vec<String> = matches
            .get_many::<i64>("driver")
            .map(|ids| ids.map(ToString::to_string).collect())
            .unwrap_or_default();

        let mut pairs = vec![
            ("model", required_arg(matches, "model")?),
            ("manufacturer", manufacturer.as_str()),
        ];
        pairs.extend(drivers.iter().map(|pk| ("drivers", pk.as_str())));
        let data = form_data(pairs)?;

        let store = taxi::store::open(settings).await?;
        let mut form = CarCreationForm::new(store).await?;
        form.bind(&data);
        let car = validate_and_save(&mut form).await?;

        println!(
            "Created car {} (id {}) with {} driver(s)",
            car.model,
            car.id.unwrap_or_default(),
            car.drivers.len()
        );
        Ok(())
    }
}
