//! Dashboard page: heading, the loaded trade table, join completeness and the
//! Leaflet map.

use std::fmt::Write as _;

use formats::TradeTable;
use scene::{PartnerCategory, TradeScene};
use tracing::debug;

use crate::map::{MapDocument, MapView};

pub const PAGE_TITLE: &str = "Peta Rute Perdagangan Antar Provinsi di Indonesia";
pub const MAP_HEADING: &str = "Peta Provinsi dan Jalur Perdagangan Terbesar";
pub const TABLE_CAPTION: &str = "Data Rute Perdagangan:";

const LEAFLET_VERSION: &str = "1.9.4";
const MARKERCLUSTER_VERSION: &str = "1.5.3";
const ANT_PATH_VERSION: &str = "1.3.0";

const MAP_SCRIPT: &str = r#"
(function () {
  const doc = JSON.parse(document.getElementById('map-data').textContent);
  const view = doc.view;
  const map = L.map('map', { minZoom: view.min_zoom, maxZoom: view.max_zoom })
    .setView(view.center, view.zoom_start);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);

  const popup = doc.markers.popup || { min_width: 200, max_width: 300 };
  const cluster = L.markerClusterGroup();
  doc.markers.markers.forEach(function (m) {
    L.marker(m.lat_lon)
      .bindPopup(m.popup_html, { minWidth: popup.min_width, maxWidth: popup.max_width })
      .bindTooltip(m.tooltip, { sticky: true })
      .addTo(cluster);
  });

  const routes = L.layerGroup();
  doc.routes.edges.forEach(function (e) {
    L.polyline.antPath([e.origin, e.destination], {
      color: e.style.color,
      weight: e.style.weight,
      opacity: e.style.opacity,
      dashArray: e.style.dash_array
    }).addTo(routes);
  });

  // Added in document order, one toggle per layer.
  const groups = { provinces: cluster, routes: routes };
  const overlays = {};
  doc.layers.forEach(function (layer) {
    const group = groups[layer.name];
    if (group) {
      group.addTo(map);
      overlays[layer.name] = group;
    }
  });
  L.control.layers(null, overlays).addTo(map);
})();
"#;

const PAGE_STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem auto; max-width: 1100px; color: #262730; }
h1 { font-size: 2rem; }
.table-wrap { max-height: 400px; overflow: auto; border: 1px solid #e6e9ef; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { border-bottom: 1px solid #e6e9ef; padding: 0.25rem 0.5rem; text-align: left; }
th { position: sticky; top: 0; background: #f0f2f6; }
.report { font-size: 0.9rem; }
.report .miss { color: #b00020; }
"#;

pub struct DashboardPage<'a> {
    pub trade: &'a TradeTable,
    pub scene: &'a TradeScene,
    pub view: MapView,
}

impl<'a> DashboardPage<'a> {
    pub fn new(trade: &'a TradeTable, scene: &'a TradeScene) -> Self {
        Self {
            trade,
            scene,
            view: MapView::default(),
        }
    }

    pub fn render(&self) -> Result<String, serde_json::Error> {
        let doc = MapDocument::build(self.scene, self.view);
        let data = doc.to_script_json()?;
        debug!(
            markers = doc.markers.markers.len(),
            routes = doc.routes.edges.len(),
            "rendering dashboard page"
        );

        let mut out = String::with_capacity(16 * 1024 + data.len());
        out.push_str("<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(out, "<title>{}</title>", escape_html(PAGE_TITLE));
        push_assets(&mut out);
        let _ = writeln!(out, "<style>{PAGE_STYLE}</style>\n</head>\n<body>");
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(PAGE_TITLE));

        let _ = writeln!(out, "<p>{}</p>", escape_html(TABLE_CAPTION));
        push_table(&mut out, self.trade);
        push_report(&mut out, self.scene);

        let _ = writeln!(out, "<h2>{}</h2>", escape_html(MAP_HEADING));
        let _ = writeln!(
            out,
            "<div id=\"map\" style=\"width: {}px; height: {}px;\"></div>",
            self.view.width_px, self.view.height_px
        );
        let _ = writeln!(
            out,
            "<script type=\"application/json\" id=\"map-data\">{data}</script>"
        );
        let _ = writeln!(out, "<script>{MAP_SCRIPT}</script>\n</body>\n</html>");
        Ok(out)
    }
}

fn push_assets(out: &mut String) {
    let _ = writeln!(
        out,
        "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css\">"
    );
    for css in ["MarkerCluster.css", "MarkerCluster.Default.css"] {
        let _ = writeln!(
            out,
            "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet.markercluster@{MARKERCLUSTER_VERSION}/dist/{css}\">"
        );
    }
    let _ = writeln!(
        out,
        "<script src=\"https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js\"></script>"
    );
    let _ = writeln!(
        out,
        "<script src=\"https://unpkg.com/leaflet.markercluster@{MARKERCLUSTER_VERSION}/dist/leaflet.markercluster.js\"></script>"
    );
    let _ = writeln!(
        out,
        "<script src=\"https://unpkg.com/leaflet-ant-path@{ANT_PATH_VERSION}/dist/leaflet-ant-path.js\"></script>"
    );
}

fn push_table(out: &mut String, table: &TradeTable) {
    out.push_str("<div class=\"table-wrap\"><table>\n<thead><tr><th></th>");
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", escape_html(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for (ix, row) in table.rows.iter().enumerate() {
        let _ = write!(out, "<tr><th>{ix}</th>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table></div>\n");
}

fn push_report(out: &mut String, scene: &TradeScene) {
    let report = &scene.report;
    let join = &report.join;
    out.push_str("<div class=\"report\">\n");
    let _ = writeln!(
        out,
        "<p>{} of {} provinces joined; {} purchase and {} sale routes drawn ({} matching).</p>",
        join.matched.len(),
        join.trade_rows,
        report.resolved_count(PartnerCategory::Purchase),
        report.resolved_count(PartnerCategory::Sale),
        report.partner_match,
    );

    if !join.unmatched_no_geometry.is_empty() {
        let names: Vec<&str> = join.unmatched_no_geometry.iter().map(|k| k.as_str()).collect();
        let _ = writeln!(
            out,
            "<p class=\"miss\">No boundary for: {}</p>",
            escape_html(&names.join(", "))
        );
    }
    if !join.unmatched_no_trade.is_empty() {
        let names: Vec<&str> = join.unmatched_no_trade.iter().map(|k| k.as_str()).collect();
        let _ = writeln!(
            out,
            "<p class=\"miss\">No trade data for: {}</p>",
            escape_html(&names.join(", "))
        );
    }

    if join.is_complete() {
        out.push_str("<p>Every province matched between both sources.</p>\n");
    }

    let misses: Vec<String> = report
        .missing_partner_geometry()
        .map(|r| format!("{} ({}): {}", r.origin, r.category.label(), r.text))
        .collect();
    if !misses.is_empty() {
        out.push_str("<details class=\"miss\"><summary>Partner not on map</summary><ul>\n");
        for miss in misses {
            let _ = writeln!(out, "<li>{}</li>", escape_html(&miss));
        }
        out.push_str("</ul></details>\n");
    }
    out.push_str("</div>\n");
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
