//! The `createdriver` management command.

use async_trait::async_trait;
use taxi::forms::DriverCreationForm;
use taxi_core::{Settings, TaxiResult};
use taxi_forms::form::Form;

use super::{form_data, required_arg, validate_and_save};
use crate::command::ManagementCommand;

/// Registers a driver account.
///
/// The arguments are submitted to the driver creation form, so the username,
/// password, and license number rules all apply. The password is used for
/// both password fields.
pub struct CreateDriverCommand;

#[async_trait]
impl ManagementCommand for CreateDriverCommand {
    fn name(&self) -> &'static str {
        "createdriver"
    }

    fn help(&self) -> &'static str {
        "Register a driver"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("username")
                .long("username")
                .required(true)
                .help("Login name"),
        )
        .arg(
            clap::Arg::new("password")
                .long("password")
                .required(true)
                .help("Account password"),
        )
        .arg(
            clap::Arg::new("license-number")
                .long("license-number")
                .required(true)
                .help("Three uppercase letters and five digits, e.g. ABC12345"),
        )
        .arg(
            clap::Arg::new("first-name")
                .long("first-name")
                .required(true)
                .help("Given name"),
        )
        .arg(
            clap::Arg::new("last-name")
                .long("last-name")
                .required(true)
                .help("Family name"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let password = required_arg(matches, "password")?;
        let data = form_data([
            ("username", required_arg(matches, "username")?),
            ("password1", password),
            ("password2", password),
            ("license_number", required_arg(matches, "license-number")?),
            ("first_name", required_arg(matches, "first-name")?),
            ("last_name", required_arg(matches, "last-name")?),
        ])?;

        let store = taxi::store::open(settings).await?;
        let mut form = DriverCreationForm::from_settings(store, settings);
        form.bind(&data);
        let driver = validate_and_save(&mut form).await?;

        println!(
            "Created driver {} (id {}, license {})",
            driver.username(),
            driver.id().unwrap_or_default(),
            driver.license_number
        );
        Ok(())
    }
}
