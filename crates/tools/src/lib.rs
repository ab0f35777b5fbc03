//! Offline rendering of the trade map: the same pipeline the server runs,
//! written to a standalone HTML file.

use std::fs;
use std::path::Path;

use anyhow::Context;
use formats::{TradeTable, load_boundaries, load_trade_table};
use layers::html::DashboardPage;
use scene::{PartnerMatch, TradeReport, TradeScene};
use tracing::info;

pub struct Rendered {
    pub trade: TradeTable,
    pub scene: TradeScene,
}

pub fn build_scene(
    trade_path: &Path,
    boundary_path: &Path,
    mode: PartnerMatch,
) -> anyhow::Result<Rendered> {
    let trade = load_trade_table(trade_path)?;
    let boundaries = load_boundaries(boundary_path)?;
    let scene = TradeScene::build(&trade, &boundaries, mode);
    Ok(Rendered { trade, scene })
}

pub fn render_page(
    trade_path: &Path,
    boundary_path: &Path,
    out_path: &Path,
    mode: PartnerMatch,
) -> anyhow::Result<TradeReport> {
    let rendered = build_scene(trade_path, boundary_path, mode)?;
    let html = DashboardPage::new(&rendered.trade, &rendered.scene)
        .render()
        .context("serialize map document")?;
    fs::write(out_path, html).with_context(|| format!("write {}", out_path.display()))?;
    info!(out = %out_path.display(), "wrote trade map page");
    Ok(rendered.scene.report)
}

pub fn report_json(
    trade_path: &Path,
    boundary_path: &Path,
    mode: PartnerMatch,
) -> anyhow::Result<String> {
    let rendered = build_scene(trade_path, boundary_path, mode)?;
    serde_json::to_string_pretty(&rendered.scene.report).context("serialize report")
}

#[cfg(test)]
mod tests {
    use super::{render_page, report_json};
    use scene::{PartnerCategory, PartnerMatch};
    use std::fs;
    use std::path::PathBuf;

    fn asset(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../apps/server/assets")
            .join(name)
    }

    #[test]
    fn renders_demo_page_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("map.html");
        let report = render_page(
            &asset("Rute_Perdagangan_Provinsi.csv"),
            &asset("indonesia.geojson"),
            &out,
            PartnerMatch::LongestPrefix,
        )
        .expect("render");

        assert_eq!(report.join.matched.len(), 11);
        assert_eq!(report.resolved_count(PartnerCategory::Purchase), 11);
        let html = fs::read_to_string(&out).expect("read page");
        assert!(html.contains("L.polyline.antPath"));
        assert!(html.contains("No trade data for: PAPUA"));
    }

    #[test]
    fn report_lists_routes_as_json() {
        let json = report_json(
            &asset("Rute_Perdagangan_Provinsi.xlsx"),
            &asset("indonesia.geojson"),
            PartnerMatch::FirstToken,
        )
        .expect("report");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["partner_match"], "first-token");
        assert_eq!(value["routes"].as_array().map(Vec::len), Some(22));
    }

    #[test]
    fn missing_input_names_the_file() {
        let err = report_json(
            &asset("nope.csv"),
            &asset("indonesia.geojson"),
            PartnerMatch::default(),
        )
        .err()
        .expect("error");
        assert!(err.to_string().contains("nope.csv"));
    }
}
