//! Data-quality outcomes reported next to the derived views.
//!
//! None of these abort a report. Builders skip the offending item, record an
//! [`Anomaly`] and carry on with the rest of the dataset.

use crate::record::Stage;
use serde::Serialize;

/// What kind of identifier an anomaly refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyScope {
    /// A commercial flight number (`Номер рейса`).
    FlightNumber,
    /// A single occurrence (`flight_id`).
    Occurrence,
}

impl std::fmt::Display for AnomalyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyScope::FlightNumber => f.write_str("flight number"),
            AnomalyScope::Occurrence => f.write_str("occurrence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    #[error("{scope} {key} only present in the {present} schedule")]
    MissingVariant {
        scope: AnomalyScope,
        key: String,
        present: Stage,
    },

    #[error("flight {flight_number} has no defined percent change (start revenue {start_revenue}, result revenue {result_revenue})")]
    UndefinedRatio {
        flight_number: String,
        start_revenue: f64,
        result_revenue: f64,
    },

    #[error("occurrence {flight_id} has {} members ({stages:?}), expected one start and one result", .stages.len())]
    MalformedGroup { flight_id: String, stages: Vec<Stage> },
}

impl Anomaly {
    /// Identifier the anomaly was raised for.
    pub fn key(&self) -> &str {
        match self {
            Anomaly::MissingVariant { key, .. } => key,
            Anomaly::UndefinedRatio { flight_number, .. } => flight_number,
            Anomaly::MalformedGroup { flight_id, .. } => flight_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_serializes_with_kind_tag() {
        let anomaly = Anomaly::MissingVariant {
            scope: AnomalyScope::FlightNumber,
            key: "SU300".into(),
            present: Stage::Start,
        };

        let value = serde_json::to_value(&anomaly).unwrap();

        assert_eq!(value["kind"], "missing_variant");
        assert_eq!(value["scope"], "flight_number");
        assert_eq!(value["present"], "start");
        assert_eq!(anomaly.key(), "SU300");
    }

    #[test]
    fn test_undefined_ratio_message_names_both_totals() {
        let anomaly = Anomaly::UndefinedRatio {
            flight_number: "SU200".into(),
            start_revenue: 1e-310,
            result_revenue: 1e300,
        };

        let message = anomaly.to_string();

        assert!(message.contains("SU200"));
        assert!(!message.contains("zero"));
        assert!(message.contains("no defined percent change"));
        assert_eq!(anomaly.key(), "SU200");
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = Anomaly::MalformedGroup {
            flight_id: "F9".into(),
            stages: vec![Stage::Start, Stage::Start],
        };

        let message = anomaly.to_string();

        assert!(message.contains("F9"));
        assert!(message.contains("2 members"));
    }
}
