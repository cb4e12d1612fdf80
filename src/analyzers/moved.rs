//! Detection of occurrences whose schedule changed between the two variants.

use crate::analyzers::anomaly::{Anomaly, AnomalyScope};
use crate::analyzers::grouping::group_by;
use crate::record::{FlightRecord, Stage};
use serde::Serialize;
use tracing::{debug, warn};

/// Order in which the two variants of an occurrence are presented.
///
/// The optimized schedule comes first so that index 0 is always "new" and
/// index 1 is always "old".
pub const PAIR_ORDER: [Stage; 2] = [Stage::Result, Stage::Start];

/// Both variants of one occurrence, at least one of them flagged as moved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovedFlightPair<'a> {
    pub flight_id: String,
    pub result: &'a FlightRecord,
    pub start: &'a FlightRecord,
}

impl<'a> MovedFlightPair<'a> {
    /// Members in [`PAIR_ORDER`].
    pub fn as_array(&self) -> [&'a FlightRecord; 2] {
        PAIR_ORDER.map(|stage| match stage {
            Stage::Result => self.result,
            Stage::Start => self.start,
        })
    }

    /// How far the departure moved, in milliseconds. Positive means later.
    /// Saturates at the `i64` bounds.
    pub fn departure_shift_ms(&self) -> i64 {
        self.result.departure_ts.saturating_sub(self.start.departure_ts)
    }

    /// Revenue of the optimized occurrence minus the original one.
    pub fn revenue_delta(&self) -> f64 {
        self.result.revenue - self.start.revenue
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MovedFlights<'a> {
    pub pairs: Vec<MovedFlightPair<'a>>,
    pub anomalies: Vec<Anomaly>,
}

/// Pairs the start and result record of every occurrence and keeps the pairs
/// where either record has `was_moved` set.
///
/// Occurrences are visited in first-seen order. An occurrence with a single
/// record is reported as [`Anomaly::MissingVariant`]; any other shape that is
/// not exactly one start and one result record is reported as
/// [`Anomaly::MalformedGroup`]. Neither case produces a pair.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn detect_moved_flights(records: &[FlightRecord]) -> MovedFlights<'_> {
    let by_occurrence = group_by(records, |r| r.flight_id.clone());
    let mut moved = MovedFlights::default();

    for group in &by_occurrence {
        let pair = match group.members.as_slice() {
            [only] => {
                moved.anomalies.push(Anomaly::MissingVariant {
                    scope: AnomalyScope::Occurrence,
                    key: group.key.clone(),
                    present: only.stage,
                });
                continue;
            }
            [a, b] if a.stage != b.stage => {
                let (result, start) = if a.stage == Stage::Result { (*a, *b) } else { (*b, *a) };
                MovedFlightPair {
                    flight_id: group.key.clone(),
                    result,
                    start,
                }
            }
            members => {
                moved.anomalies.push(Anomaly::MalformedGroup {
                    flight_id: group.key.clone(),
                    stages: members.iter().map(|r| r.stage).collect(),
                });
                continue;
            }
        };

        if pair.result.was_moved || pair.start.was_moved {
            moved.pairs.push(pair);
        }
    }

    for anomaly in &moved.anomalies {
        warn!(key = anomaly.key(), %anomaly, "Rescheduled flight anomaly");
    }
    debug!(
        occurrences = by_occurrence.len(),
        moved = moved.pairs.len(),
        anomalies = moved.anomalies.len(),
        "Rescheduled flights detected"
    );

    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_ordered_result_first() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 100.0, false),
            FlightRecord::new("F1", "SU100", Stage::Result, 5000, 120.0, true),
        ];

        let moved = detect_moved_flights(&records);

        assert!(moved.anomalies.is_empty());
        assert_eq!(moved.pairs.len(), 1);
        let [new, old] = moved.pairs[0].as_array();
        assert_eq!(new.stage, Stage::Result);
        assert_eq!(new.departure_ts, 5000);
        assert_eq!(old.stage, Stage::Start);
        assert_eq!(old.departure_ts, 1000);
        assert_eq!(moved.pairs[0].departure_shift_ms(), 4000);
        assert_eq!(moved.pairs[0].revenue_delta(), 20.0);
    }

    #[test]
    fn test_departure_shift_saturates() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, i64::MIN, 0.0, false),
            FlightRecord::new("F1", "SU100", Stage::Result, i64::MAX, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);

        assert_eq!(moved.pairs[0].departure_shift_ms(), i64::MAX);
    }

    #[test]
    fn test_order_does_not_depend_on_input_order() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Result, 5000, 0.0, false),
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);

        assert_eq!(moved.pairs[0].result.departure_ts, 5000);
        assert_eq!(moved.pairs[0].start.departure_ts, 1000);
    }

    #[test]
    fn test_unmoved_occurrence_is_excluded() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, false),
            FlightRecord::new("F1", "SU100", Stage::Result, 1000, 0.0, false),
            FlightRecord::new("F2", "SU100", Stage::Start, 2000, 0.0, false),
            FlightRecord::new("F2", "SU100", Stage::Result, 3000, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);

        let ids: Vec<_> = moved.pairs.iter().map(|p| p.flight_id.as_str()).collect();
        assert_eq!(ids, vec!["F2"]);
        assert!(moved.anomalies.is_empty());
    }

    #[test]
    fn test_single_member_is_missing_variant() {
        let records = vec![FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, true)];

        let moved = detect_moved_flights(&records);

        assert!(moved.pairs.is_empty());
        assert_eq!(
            moved.anomalies,
            vec![Anomaly::MissingVariant {
                scope: AnomalyScope::Occurrence,
                key: "F1".into(),
                present: Stage::Start,
            }]
        );
    }

    #[test]
    fn test_duplicate_variant_is_malformed() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, true),
            FlightRecord::new("F1", "SU100", Stage::Start, 2000, 0.0, true),
            FlightRecord::new("F2", "SU200", Stage::Start, 1000, 0.0, false),
            FlightRecord::new("F2", "SU200", Stage::Result, 1000, 0.0, true),
            FlightRecord::new("F2", "SU200", Stage::Result, 1500, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);

        assert!(moved.pairs.is_empty());
        assert_eq!(
            moved.anomalies,
            vec![
                Anomaly::MalformedGroup {
                    flight_id: "F1".into(),
                    stages: vec![Stage::Start, Stage::Start],
                },
                Anomaly::MalformedGroup {
                    flight_id: "F2".into(),
                    stages: vec![Stage::Start, Stage::Result, Stage::Result],
                },
            ]
        );
    }

    #[test]
    fn test_malformed_group_does_not_stop_other_pairs() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, true),
            FlightRecord::new("F2", "SU200", Stage::Start, 1000, 0.0, false),
            FlightRecord::new("F2", "SU200", Stage::Result, 4000, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);

        assert_eq!(moved.pairs.len(), 1);
        assert_eq!(moved.pairs[0].flight_id, "F2");
        assert_eq!(moved.anomalies.len(), 1);
    }

    #[test]
    fn test_pair_serializes_both_members() {
        let records = vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 0.0, false),
            FlightRecord::new("F1", "SU100", Stage::Result, 5000, 0.0, true),
        ];

        let moved = detect_moved_flights(&records);
        let value = serde_json::to_value(&moved).unwrap();

        assert_eq!(value["pairs"][0]["flight_id"], "F1");
        assert_eq!(value["pairs"][0]["result"]["stage"], "result");
        assert_eq!(value["pairs"][0]["start"]["stage"], "start");
    }
}
