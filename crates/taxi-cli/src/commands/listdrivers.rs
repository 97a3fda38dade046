//! The `listdrivers` management command.

use async_trait::async_trait;
use serde::Serialize;
use taxi::{Driver, DriverRepository};
use taxi_core::{Settings, TaxiResult};

use super::to_json;
use crate::command::ManagementCommand;

/// The public columns of one driver. The password hash is never printed.
#[derive(Debug, Serialize)]
pub struct DriverRow<'a> {
    pub id: i64,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub license_number: &'a str,
}

impl<'a> From<&'a Driver> for DriverRow<'a> {
    fn from(driver: &'a Driver) -> Self {
        Self {
            id: driver.id().unwrap_or_default(),
            username: &driver.user.username,
            first_name: &driver.user.first_name,
            last_name: &driver.user.last_name,
            license_number: &driver.license_number,
        }
    }
}

/// Renders drivers as tab-separated lines, or as JSON.
pub fn render_drivers(drivers: &[Driver], json: bool) -> TaxiResult<String> {
    let rows: Vec<DriverRow<'_>> = drivers.iter().map(DriverRow::from).collect();
    if json {
        return to_json(&rows);
    }
    Ok(rows
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{} {}",
                r.id, r.username, r.license_number, r.first_name, r.last_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Prints every driver.
pub struct ListDriversCommand;

#[async_trait]
impl ManagementCommand for ListDriversCommand {
    fn name(&self) -> &'static str {
        "listdrivers"
    }

    fn help(&self) -> &'static str {
        "List drivers"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print JSON instead of text"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> TaxiResult<()> {
        let store = taxi::store::open(settings).await?;
        let drivers = store.list_drivers().await?;
        let output = render_drivers(&drivers, matches.get_flag("json"))?;
        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(pk: i64, username: &str, license: &str) -> Driver {
        let mut driver = Driver::new(username, license);
        driver.user.id = Some(pk);
        driver.user.first_name = "Ann".into();
        driver.user.last_name = "Lee".into();
        driver
    }

    #[test]
    fn test_render_text() {
        let drivers = vec![driver(1, "ann", "ABC12345")];
        assert_eq!(
            render_drivers(&drivers, false).unwrap(),
            "1\tann\tABC12345\tAnn Lee"
        );
        assert_eq!(render_drivers(&[], false).unwrap(), "");
    }

    #[test]
    fn test_render_json_hides_password() {
        let drivers = vec![driver(1, "ann", "ABC12345")];
        let output = render_drivers(&drivers, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["license_number"], "ABC12345");
        assert!(value[0].get("password").is_none());
    }
}
