//! The `listcars` management command.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use taxi::{Car, CarRepository, Manufacturer, ManufacturerRepository};
use taxi_core::{Settings, TaxiResult};

use super::to_json;
use crate::command::ManagementCommand;

/// One car with its manufacturer resolved to a name.
#[derive(Debug, Serialize)]
pub struct CarRow<'a> {
    pub id: i64,
    pub model: &'a str,
    pub manufacturer: &'a str,
    pub drivers: &'a [i64],
}

/// Renders cars as tab-separated lines, or as JSON.
pub fn render_cars(cars: &[Car], manufacturers: &[Manufacturer], json: bool) -> TaxiResult<String> {
    let names: HashMap<i64, &str> = manufacturers
        .iter()
        .filter_map(|m| Some((m.id?, m.name.as_str())))
        .collect();
    let rows: Vec<CarRow<'_>> = cars
        .iter()
        .map(|car| CarRow {
            id: car.id.unwrap_or_default(),
            model: &car.model,
            manufacturer: names.get(&car.manufacturer_id).copied().unwrap_or("?"),
            drivers: &car.drivers,
        })
        .collect();
    if json {
        return to_json(&rows);
    }
    Ok(rows
        .iter()
        .map(|r| {
            let drivers: Vec<String> = r.drivers.iter().map(ToString::to_string).collect();
            format!(
                "{}\t{} {}\tdrivers: [{}]",
                r.id,
                r.manufacturer,
                r.model,
                drivers.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Prints every car with its manufacturer and driver ids.
pub struct ListCarsCommand;

#[async_trait]
impl ManagementCommand for ListCarsCommand {
    fn name(&self) -> &'static str {
        "listcars"
    }

    fn help(&self) -> &'static str {
        "List cars"
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
        let cars = store.list_cars().await?;
        let manufacturers = store.list_manufacturers().await?;
        let output = render_cars(&cars, &manufacturers, matches.get_flag("json"))?;
        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    }
}
