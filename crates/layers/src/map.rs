use scene::TradeScene;
use serde::Serialize;

use crate::layer::{Layer, LayerInfo};
use crate::markers::{MarkerLayer, MarkerLayerSnapshot};
use crate::routes::{RouteLayer, RouteLayerSnapshot};

/// Initial camera and zoom limits of the map widget.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom_start: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [-2.5, 118.0],
            zoom_start: 5,
            min_zoom: 4,
            max_zoom: 7,
            width_px: 700,
            height_px: 500,
        }
    }
}

/// Everything the browser needs to draw the map, embedded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDocument {
    pub view: MapView,
    pub layers: Vec<LayerInfo>,
    pub markers: MarkerLayerSnapshot,
    pub routes: RouteLayerSnapshot,
}

impl MapDocument {
    pub fn build(scene: &TradeScene, view: MapView) -> Self {
        let marker_layer = MarkerLayer::new(1);
        let route_layer = RouteLayer::new(2);
        Self {
            view,
            layers: vec![marker_layer.info(), route_layer.info()],
            markers: marker_layer.extract(&scene.table),
            routes: route_layer.extract(scene),
        }
    }

    /// JSON safe to place inside a `<script>` element: no markup character
    /// survives literally, so neither `</script` nor `<!--` can appear.
    pub fn to_script_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let mut out = String::with_capacity(json.len());
        for c in json.chars() {
            match c {
                '<' => out.push_str("\\u003c"),
                '>' => out.push_str("\\u003e"),
                '&' => out.push_str("\\u0026"),
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}
