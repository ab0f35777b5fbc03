use formats::{BoundaryTable, TradeTable};
use foundation::ProvinceKey;
use serde::Serialize;
use tracing::{debug, info};

use crate::join::{JoinReport, JoinedTable, join};
use crate::partner::{PartnerCategory, PartnerMatch, RouteOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResolution {
    pub origin: ProvinceKey,
    pub category: PartnerCategory,
    pub text: String,
    #[serde(flatten)]
    pub outcome: RouteOutcome,
}

impl RouteResolution {
    pub fn partner(&self) -> Option<&ProvinceKey> {
        match &self.outcome {
            RouteOutcome::Resolved { partner } => Some(partner),
            _ => None,
        }
    }
}

/// Join completeness plus the fate of every partner field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReport {
    pub partner_match: PartnerMatch,
    pub join: JoinReport,
    pub routes: Vec<RouteResolution>,
}

impl TradeReport {
    pub fn resolved_count(&self, category: PartnerCategory) -> usize {
        self.routes
            .iter()
            .filter(|r| r.category == category && r.partner().is_some())
            .count()
    }

    pub fn missing_partner_geometry(&self) -> impl Iterator<Item = &RouteResolution> {
        self.routes
            .iter()
            .filter(|r| matches!(r.outcome, RouteOutcome::NoPartnerGeometry { .. }))
    }
}

/// The joined table for one page load, with its report.
#[derive(Debug, Clone)]
pub struct TradeScene {
    pub table: JoinedTable,
    pub report: TradeReport,
}

impl TradeScene {
    pub fn build(trade: &TradeTable, boundaries: &BoundaryTable, mode: PartnerMatch) -> Self {
        let (table, join_report) = join(trade, boundaries);
        let routes = resolve_routes(&table, mode);
        let scene = Self {
            table,
            report: TradeReport {
                partner_match: mode,
                join: join_report,
                routes,
            },
        };
        info!(
            provinces = scene.table.len(),
            purchase_routes = scene.report.resolved_count(PartnerCategory::Purchase),
            sale_routes = scene.report.resolved_count(PartnerCategory::Sale),
            mode = %mode,
            "built trade scene"
        );
        scene
    }
}

/// Purchase then sale for each joined record, in table order.
pub fn resolve_routes(table: &JoinedTable, mode: PartnerMatch) -> Vec<RouteResolution> {
    let mut out = Vec::with_capacity(table.len() * 2);
    for record in table.records() {
        for category in PartnerCategory::ALL {
            let text = match category {
                PartnerCategory::Purchase => &record.purchase_partner,
                PartnerCategory::Sale => &record.sale_partner,
            };
            let outcome = table.resolve_partner(text, mode);
            if !matches!(outcome, RouteOutcome::Resolved { .. }) {
                debug!(origin = %record.key, ?category, ?outcome, "partner not drawn");
            }
            out.push(RouteResolution {
                origin: record.key.clone(),
                category,
                text: text.clone(),
                outcome,
            });
        }
    }
    out
}
