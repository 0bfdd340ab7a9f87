use clap::Args;
use colored::Colorize;
use temps_query_resource_graph::{CloudEndpoints, CLOUDS};

const CLOUD_WIDTH: usize = 20;
const API_WIDTH: usize = 40;

#[derive(Args)]
pub struct CloudsCommand {
    /// Print as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Header cells are padded before styling so escape codes do not count
/// towards the column width.
fn header() -> String {
    format!(
        "{} {} {}",
        format!("{:<w$}", "CLOUD", w = CLOUD_WIDTH).bold(),
        format!("{:<w$}", "API", w = API_WIDTH).bold(),
        "PORTAL".bold()
    )
}

fn row(endpoints: &CloudEndpoints) -> String {
    format!(
        "{:<cw$} {:<aw$} {}",
        endpoints.cloud,
        endpoints.api_url,
        endpoints.portal_url,
        cw = CLOUD_WIDTH,
        aw = API_WIDTH
    )
}

impl CloudsCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&CLOUDS)?);
            return Ok(());
        }

        println!("{}", header());
        for endpoints in CLOUDS.iter() {
            println!("{}", row(endpoints));
        }

        Ok(())
    }
}
