//! Per flight number revenue change between the start and result schedules.

use crate::analyzers::anomaly::{Anomaly, AnomalyScope};
use crate::analyzers::grouping::GroupedCollection;
use crate::analyzers::utility::{percent_change, revenue_sum};
use crate::record::{FieldKey, FlightRecord, Stage};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Flight-number grouping as produced by the grouping engine.
pub type FlightGroups<'a> = GroupedCollection<FieldKey, &'a FlightRecord>;

/// Revenue totals of one flight number in both schedules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaModelEntry {
    pub flight_number: String,
    pub start_revenue: f64,
    pub result_revenue: f64,
    pub delta: f64,
    /// `None` when the start revenue is zero or the ratio is not finite.
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeltaModel {
    pub entries: Vec<DeltaModelEntry>,
    pub anomalies: Vec<Anomaly>,
}

/// Builds the delta model from the start and result flight-number groupings.
///
/// Entries are sorted by `percent`, largest first. Entries whose percent is
/// undefined follow all others. Ties keep the order in which the flight
/// numbers were first seen, start grouping first.
///
/// A flight number present in only one schedule gets no entry and is reported
/// as [`Anomaly::MissingVariant`]. A zero start revenue (or a ratio too large to represent) keeps the entry with
/// `percent: None` and reports [`Anomaly::UndefinedRatio`].
#[tracing::instrument(skip_all, fields(start_flights = start.len(), result_flights = result.len()))]
pub fn build_delta_model(start: &FlightGroups<'_>, result: &FlightGroups<'_>) -> DeltaModel {
    let mut model = DeltaModel::default();

    for group in start {
        let Some(result_members) = result.get(&group.key) else {
            model.anomalies.push(missing_variant(&group.key, Stage::Start));
            continue;
        };

        let flight_number = group.key.to_string();
        let start_revenue = revenue_sum(&group.members);
        let result_revenue = revenue_sum(result_members);
        let percent = percent_change(start_revenue, result_revenue);

        if percent.is_none() {
            model.anomalies.push(Anomaly::UndefinedRatio {
                flight_number: flight_number.clone(),
                start_revenue,
                result_revenue,
            });
        }

        model.entries.push(DeltaModelEntry {
            flight_number,
            start_revenue,
            result_revenue,
            delta: result_revenue - start_revenue,
            percent,
        });
    }

    for group in result {
        if !start.contains_key(&group.key) {
            model.anomalies.push(missing_variant(&group.key, Stage::Result));
        }
    }

    model.entries.sort_by(|a, b| by_percent_desc(a.percent, b.percent));

    for anomaly in &model.anomalies {
        warn!(key = anomaly.key(), %anomaly, "Delta model anomaly");
    }
    debug!(
        entries = model.entries.len(),
        anomalies = model.anomalies.len(),
        "Delta model built"
    );

    model
}

fn missing_variant(key: &FieldKey, present: Stage) -> Anomaly {
    Anomaly::MissingVariant {
        scope: AnomalyScope::FlightNumber,
        key: key.to_string(),
        present,
    }
}

fn by_percent_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
