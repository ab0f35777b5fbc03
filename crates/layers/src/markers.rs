use foundation::ProvinceKey;
use scene::{JoinedTable, PartnerCategory, ProvinceRecord};
use serde::Serialize;

use crate::html::escape_html;
use crate::layer::{Layer, LayerId};
use crate::symbology::PopupStyle;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerLayer {
    id: LayerId,
    pub popup: PopupStyle,
}

/// One clustered province marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub province: ProvinceKey,
    pub lat_lon: [f64; 2],
    /// Pre-escaped HTML.
    pub popup_html: String,
    /// Pre-escaped HTML; shown on hover.
    pub tooltip: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MarkerLayerSnapshot {
    pub popup: Option<PopupStyle>,
    pub markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            popup: PopupStyle::default(),
        }
    }

    pub fn extract(&self, table: &JoinedTable) -> MarkerLayerSnapshot {
        MarkerLayerSnapshot {
            popup: Some(self.popup),
            markers: table.records().iter().map(marker_for).collect(),
        }
    }
}

fn marker_for(record: &ProvinceRecord) -> Marker {
    let name = escape_html(record.key.as_str());
    let popup_html = format!(
        "<strong>{name}</strong><br><strong>{}:</strong> {}<br><strong>{}:</strong> {}",
        PartnerCategory::Purchase.label(),
        escape_html(&record.purchase_partner),
        PartnerCategory::Sale.label(),
        escape_html(&record.sale_partner),
    );
    Marker {
        province: record.key.clone(),
        lat_lon: record.lat_lon(),
        popup_html,
        tooltip: name,
    }
}

impl Layer for MarkerLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "provinces"
    }
}
