//! The `updatelicense` management command.

use async_trait::async_trait;
use taxi::forms::DriverLicenseUpdateForm;
use taxi_core::{Settings, TaxiResult};
use taxi_forms::form::Form;

use super::{form_data, required_arg, required_pk, validate_and_save};
use crate::command::ManagementCommand;

/// Changes the license number of an existing driver.
pub struct UpdateLicenseCommand;

#[async_trait]
impl ManagementCommand for UpdateLicenseCommand {
    fn name(&self) -> &'static str {
        "updatelicense"
    }

    fn help(&self) -> &'static str {
        "Change a driver's license number"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("driver")
                .long("driver")
                .required(true)
                .value_parser(clap::value_parser!(i64))
                .help("Driver id"),
        )
        .arg(
            clap::Arg::new("license-number")
                .long("license-number")
                .required(true)
                .help("The new license number"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let pk = required_pk(matches, "driver")?;
        let data = form_data([("license_number", required_arg(matches, "license-number")?)])?;

        let store = taxi::store::open(settings).await?;
        let mut form = DriverLicenseUpdateForm::load(store, pk).await?;
        form.bind(&data);
        let driver = validate_and_save(&mut form).await?;

        println!(
            "Driver {} now holds license {}",
            driver.username(),
            driver.license_number
        );
        Ok(())
    }
}
