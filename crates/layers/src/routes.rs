use foundation::ProvinceKey;
use scene::{PartnerCategory, TradeScene};
use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::LineStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RouteLayer {
    id: LayerId,
}

/// A drawn partner route between two centroids, both as `[lat, lon]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEdge {
    pub from: ProvinceKey,
    pub to: ProvinceKey,
    pub category: PartnerCategory,
    pub origin: [f64; 2],
    pub destination: [f64; 2],
    pub style: LineStyle,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RouteLayerSnapshot {
    pub edges: Vec<RouteEdge>,
}

impl RouteLayerSnapshot {
    pub fn count(&self, category: PartnerCategory) -> usize {
        self.edges.iter().filter(|e| e.category == category).count()
    }
}

impl RouteLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    /// Edges for every resolved partner field; unresolved fields draw nothing.
    pub fn extract(&self, scene: &TradeScene) -> RouteLayerSnapshot {
        let mut out = RouteLayerSnapshot::default();
        for route in &scene.report.routes {
            let Some(partner) = route.partner() else {
                continue;
            };
            let Some(origin) = scene.table.get(&route.origin) else {
                continue;
            };
            let Some(destination) = scene.table.location(partner) else {
                continue;
            };
            out.edges.push(RouteEdge {
                from: route.origin.clone(),
                to: partner.clone(),
                category: route.category,
                origin: origin.lat_lon(),
                destination: [destination.y(), destination.x()],
                style: LineStyle::for_category(route.category),
            });
        }
        out
    }
}

impl Layer for RouteLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "routes"
    }
}

#[cfg(test)]
mod tests {
    use super::RouteLayer;
    use crate::symbology::LineStyle;
    use crate::test_support::scene_from;
    use foundation::ProvinceKey;
    use scene::{PartnerCategory, PartnerMatch};

    #[test]
    fn aceh_scenario_yields_single_purchase_edge() {
        let scene = scene_from(
            &[("ACEH", "SUMATERA UTARA market", "JAWA BARAT market")],
            &[("ACEH", 96.0, 4.0), ("SUMATERA UTARA", 99.0, 2.0)],
            PartnerMatch::LongestPrefix,
        );
        let snap = RouteLayer::new(2).extract(&scene);
        assert_eq!(snap.edges.len(), 1);

        let edge = &snap.edges[0];
        assert_eq!(edge.category, PartnerCategory::Purchase);
        assert_eq!(edge.from, ProvinceKey::new("ACEH"));
        assert_eq!(edge.to, ProvinceKey::new("SUMATERA UTARA"));
        assert_eq!(edge.style, LineStyle::PURCHASE);
        assert!((edge.origin[0] - 4.0).abs() < 1e-9);
        assert!((edge.destination[1] - 99.0).abs() < 1e-9);
        assert_eq!(snap.count(PartnerCategory::Sale), 0);
    }

    #[test]
    fn exact_first_token_match_yields_exactly_one_edge() {
        let scene = scene_from(
            &[("Bali", "Riau (10%)", "Jambi (5%)"), ("Riau", "", "")],
            &[("Bali", 115.0, -8.0), ("Riau", 101.0, 0.5)],
            PartnerMatch::FirstToken,
        );
        let snap = RouteLayer::new(2).extract(&scene);
        assert_eq!(snap.count(PartnerCategory::Purchase), 1);
        assert_eq!(snap.count(PartnerCategory::Sale), 0);
        assert_eq!(snap.edges[0].to, ProvinceKey::new("RIAU"));
    }
}
