use foundation::ProvinceKey;
use geo::{MultiPolygon, Point};
use serde::Serialize;

/// A province present in both the trade sheet and the boundary file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceRecord {
    pub key: ProvinceKey,
    pub boundary_id: Option<String>,
    pub geometry: MultiPolygon<f64>,
    /// Centroid of `geometry`, computed once when the record is joined.
    pub centroid: Point<f64>,
    pub purchase_partner: String,
    pub sale_partner: String,
}

/// Serializable view of a record without its boundary rings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceSummary {
    pub province: ProvinceKey,
    pub lon: f64,
    pub lat: f64,
    pub purchase_partner: String,
    pub sale_partner: String,
}

impl ProvinceRecord {
    pub fn summary(&self) -> ProvinceSummary {
        ProvinceSummary {
            province: self.key.clone(),
            lon: self.centroid.x(),
            lat: self.centroid.y(),
            purchase_partner: self.purchase_partner.clone(),
            sale_partner: self.sale_partner.clone(),
        }
    }

    /// `[lat, lon]`, the order map widgets expect.
    pub fn lat_lon(&self) -> [f64; 2] {
        [self.centroid.y(), self.centroid.x()]
    }
}
