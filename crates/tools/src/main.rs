use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scene::{PartnerCategory, PartnerMatch};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render Indonesian inter-province trade routes")]
struct Args {
    /// How partner text is matched to a province (longest-prefix or first-token)
    #[arg(long, global = true, default_value_t = PartnerMatch::default())]
    partner_match: PartnerMatch,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the dashboard page with the map to an HTML file
    Render {
        /// Trade table (.xlsx, .xls, .ods or .csv)
        trade: PathBuf,
        /// Province boundaries (GeoJSON FeatureCollection)
        boundaries: PathBuf,
        /// Output HTML file
        out: PathBuf,
    },

    /// Print the join and route report as JSON
    Report {
        trade: PathBuf,
        boundaries: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Render {
            trade,
            boundaries,
            out,
        } => {
            let report = tools::render_page(&trade, &boundaries, &out, args.partner_match)?;
            println!(
                "{}: {} of {} provinces, {} purchase / {} sale routes",
                out.display(),
                report.join.matched.len(),
                report.join.trade_rows,
                report.resolved_count(PartnerCategory::Purchase),
                report.resolved_count(PartnerCategory::Sale),
            );
        }
        Command::Report { trade, boundaries } => {
            println!(
                "{}",
                tools::report_json(&trade, &boundaries, args.partner_match)?
            );
        }
    }
    Ok(())
}
