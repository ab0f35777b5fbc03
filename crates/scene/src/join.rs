use std::collections::{BTreeMap, HashMap};

use formats::{BoundaryTable, TradeRecord, TradeTable};
use foundation::ProvinceKey;
use geo::{Centroid, Point};
use serde::Serialize;
use tracing::{debug, info};

use crate::province::ProvinceRecord;

/// Provinces present in both sources, in boundary-file order.
///
/// Also carries the centroid of every province that has a boundary, which is
/// the set partner names are resolved against.
#[derive(Debug, Clone, Default)]
pub struct JoinedTable {
    records: Vec<ProvinceRecord>,
    index: HashMap<ProvinceKey, usize>,
    known: BTreeMap<ProvinceKey, Point<f64>>,
}

/// What the inner join kept and what it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub trade_rows: usize,
    pub boundary_features: usize,
    pub matched: Vec<ProvinceKey>,
    /// Trade rows whose province has no boundary.
    pub unmatched_no_geometry: Vec<ProvinceKey>,
    /// Boundaries whose province has no trade row.
    pub unmatched_no_trade: Vec<ProvinceKey>,
    /// Repeated keys after the first occurrence, which is the one kept.
    pub duplicate_trade: Vec<ProvinceKey>,
    pub duplicate_boundaries: Vec<ProvinceKey>,
    pub blank_trade_keys: usize,
    pub blank_boundary_keys: usize,
}

impl JoinReport {
    pub fn is_complete(&self) -> bool {
        self.unmatched_no_geometry.is_empty()
            && self.unmatched_no_trade.is_empty()
            && self.blank_trade_keys == 0
            && self.blank_boundary_keys == 0
    }
}

impl JoinedTable {
    pub fn records(&self) -> &[ProvinceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &ProvinceKey) -> Option<&ProvinceRecord> {
        self.index.get(key).map(|&ix| &self.records[ix])
    }

    /// Centroid of any province with a boundary, joined or not.
    pub fn location(&self, key: &ProvinceKey) -> Option<Point<f64>> {
        self.known.get(key).copied()
    }

    pub fn known_provinces(&self) -> impl Iterator<Item = &ProvinceKey> {
        self.known.keys()
    }
}

/// Normalizes both key columns and inner-joins trade rows onto boundaries.
pub fn join(trade: &TradeTable, boundaries: &BoundaryTable) -> (JoinedTable, JoinReport) {
    let mut report = JoinReport {
        trade_rows: trade.len(),
        boundary_features: boundaries.len(),
        ..JoinReport::default()
    };

    let mut trade_by_key: HashMap<ProvinceKey, &TradeRecord> = HashMap::new();
    let mut trade_order: Vec<ProvinceKey> = Vec::new();
    for record in &trade.records {
        let key = ProvinceKey::new(&record.province);
        if key.is_empty() {
            report.blank_trade_keys += 1;
            continue;
        }
        if trade_by_key.contains_key(&key) {
            report.duplicate_trade.push(key);
            continue;
        }
        trade_by_key.insert(key.clone(), record);
        trade_order.push(key);
    }

    let mut table = JoinedTable::default();
    for feature in &boundaries.features {
        let key = ProvinceKey::new(&feature.province);
        if key.is_empty() {
            report.blank_boundary_keys += 1;
            continue;
        }
        if table.known.contains_key(&key) {
            report.duplicate_boundaries.push(key);
            continue;
        }
        // The loader rejects geometries without a centroid.
        let Some(centroid) = feature.geometry.centroid() else {
            continue;
        };
        table.known.insert(key.clone(), centroid);

        let Some(record) = trade_by_key.get(&key) else {
            debug!(province = %key, "boundary has no trade row");
            report.unmatched_no_trade.push(key);
            continue;
        };

        table.index.insert(key.clone(), table.records.len());
        table.records.push(ProvinceRecord {
            key: key.clone(),
            boundary_id: feature.id.clone(),
            geometry: feature.geometry.clone(),
            centroid,
            purchase_partner: record.purchase_partner.clone(),
            sale_partner: record.sale_partner.clone(),
        });
        report.matched.push(key);
    }

    for key in trade_order {
        if !table.known.contains_key(&key) {
            debug!(province = %key, "trade row has no boundary");
            report.unmatched_no_geometry.push(key);
        }
    }

    info!(
        matched = report.matched.len(),
        no_geometry = report.unmatched_no_geometry.len(),
        no_trade = report.unmatched_no_trade.len(),
        "joined trade table with boundaries"
    );
    (table, report)
}
