use crate::analyzers::anomaly::Anomaly;
use crate::analyzers::delta::{DeltaModel, FlightGroups, build_delta_model};
use crate::analyzers::grouping::{group_by, group_iter};
use crate::analyzers::histogram::{HistogramBin, HistogramError, histogram_by_time_field};
use crate::analyzers::moved::{MovedFlightPair, detect_moved_flights};
use crate::config::ReportConfig;
use crate::record::{FieldKey, FlightField, FlightRecord, Stage, TimeField};
use serde::Serialize;
use tracing::info;

/// Record counts of the dataset a report was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordTotals {
    pub records: usize,
    pub start_records: usize,
    pub result_records: usize,
    pub flight_numbers: usize,
    pub moved_flights: usize,
}

/// Departure histograms of one flight number in both schedules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightHistograms {
    pub flight_number: FieldKey,
    pub start_departure_minutes: Vec<HistogramBin<i64>>,
    pub result_departure_minutes: Vec<HistogramBin<i64>>,
    pub start_weekly: Vec<HistogramBin<i64>>,
    pub result_weekly: Vec<HistogramBin<i64>>,
}

/// An airport seen as departure or arrival of a start-schedule flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportEntry {
    pub airport: String,
    pub city: Option<String>,
    /// `[longitude, latitude]`
    pub coordinates: Option<[f64; 2]>,
}

/// Route of one flight number in the start schedule, with its revenue change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEntry {
    pub flight_number: String,
    /// `[longitude, latitude]` of the departure airport.
    pub from: Option<[f64; 2]>,
    /// `[longitude, latitude]` of the arrival airport.
    pub to: Option<[f64; 2]>,
    /// Percent from the delta model; `None` when the flight number has no
    /// entry there or its percent is undefined.
    pub percent: Option<f64>,
}

/// Everything derived from one dataset in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightReport<'a> {
    pub totals: RecordTotals,
    pub config: ReportConfig,
    pub flights: Vec<FlightHistograms>,
    pub delta_model: DeltaModel,
    pub moved_flights: Vec<MovedFlightPair<'a>>,
    pub airports: Vec<AirportEntry>,
    pub routes: Vec<RouteEntry>,
    pub anomalies: Vec<Anomaly>,
}

/// Splits `records` by stage and groups each side by flight number.
pub fn flight_groups_by_stage(records: &[FlightRecord]) -> (FlightGroups<'_>, FlightGroups<'_>) {
    let by_number = |r: &FlightRecord| FlightField::FlightNumber.key(r);
    let start = group_iter(records.iter().filter(|r| r.stage == Stage::Start), by_number);
    let result = group_iter(records.iter().filter(|r| r.stage == Stage::Result), by_number);
    (start, result)
}

/// Runs the whole pipeline once over `records`.
///
/// The input is only read. Running twice on the same input yields equal
/// reports.
///
/// # Errors
///
/// Returns [`HistogramError`] if a bin width in `config` is not positive.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn build_report<'a>(
    records: &'a [FlightRecord],
    config: &ReportConfig,
) -> Result<FlightReport<'a>, HistogramError> {
    let (start, result) = flight_groups_by_stage(records);
    let all_numbers = group_by(records, |r| FlightField::FlightNumber.key(r));

    let mut flights = Vec::with_capacity(all_numbers.len());
    for number in all_numbers.keys() {
        let start_members = start.get(number).unwrap_or_default();
        let result_members = result.get(number).unwrap_or_default();

        flights.push(FlightHistograms {
            flight_number: number.clone(),
            start_departure_minutes: histogram_by_time_field(
                start_members,
                TimeField::DepartureMinutes,
                config.departure_bin_minutes,
            )?,
            result_departure_minutes: histogram_by_time_field(
                result_members,
                TimeField::DepartureMinutes,
                config.departure_bin_minutes,
            )?,
            start_weekly: histogram_by_time_field(
                start_members,
                TimeField::DepartureTimestamp,
                config.weekly_bin_ms,
            )?,
            result_weekly: histogram_by_time_field(
                result_members,
                TimeField::DepartureTimestamp,
                config.weekly_bin_ms,
            )?,
        });
    }

    let delta_model = build_delta_model(&start, &result);
    let moved = detect_moved_flights(records);
    let airports = airport_directory(records);
    let routes = route_map(&start, &delta_model);

    let mut anomalies = delta_model.anomalies.clone();
    anomalies.extend(moved.anomalies.iter().cloned());

    let totals = RecordTotals {
        records: records.len(),
        start_records: start.member_count(),
        result_records: result.member_count(),
        flight_numbers: all_numbers.len(),
        moved_flights: moved.pairs.len(),
    };

    info!(
        records = totals.records,
        flight_numbers = totals.flight_numbers,
        delta_entries = delta_model.entries.len(),
        moved_flights = totals.moved_flights,
        airports = airports.len(),
        routes = routes.len(),
        anomalies = anomalies.len(),
        "Report built"
    );

    Ok(FlightReport {
        totals,
        config: *config,
        flights,
        delta_model,
        moved_flights: moved.pairs,
        airports,
        routes,
        anomalies,
    })
}

/// One route per start-schedule flight number, first-seen order.
///
/// Coordinates come from the first record of each group. The percent is
/// looked up in `delta_model` by flight number.
pub fn route_map(start: &FlightGroups<'_>, delta_model: &DeltaModel) -> Vec<RouteEntry> {
    start
        .iter()
        .filter_map(|group| {
            let first = group.members.first()?;
            let percent = delta_model
                .entries
                .iter()
                .find(|e| group.key.as_str() == Some(e.flight_number.as_str()))
                .and_then(|e| e.percent);
            Some(RouteEntry {
                flight_number: group.key.to_string(),
                from: first.departure_longitude.zip(first.departure_latitude).map(|(lon, lat)| [lon, lat]),
                to: first.arrival_longitude.zip(first.arrival_latitude).map(|(lon, lat)| [lon, lat]),
                percent,
            })
        })
        .collect()
}

/// Distinct airports of the start schedule, first-seen order.
///
/// Each flight contributes its departure airport, then its arrival airport.
/// The first record mentioning an airport supplies its city and coordinates.
pub fn airport_directory(records: &[FlightRecord]) -> Vec<AirportEntry> {
    let endpoints: Vec<AirportEntry> = records
        .iter()
        .filter(|r| r.stage == Stage::Start)
        .flat_map(|r| {
            [
                AirportEntry {
                    airport: r.departure_airport.clone(),
                    city: r.departure_city.clone(),
                    coordinates: r.departure_longitude.zip(r.departure_latitude).map(|(lon, lat)| [lon, lat]),
                },
                AirportEntry {
                    airport: r.arrival_airport.clone(),
                    city: r.arrival_city.clone(),
                    coordinates: r.arrival_longitude.zip(r.arrival_latitude).map(|(lon, lat)| [lon, lat]),
                },
            ]
        })
        .collect();

    group_by(&endpoints, |e| e.airport.clone())
        .into_groups()
        .into_iter()
        .filter_map(|g| g.members.first().map(|e| (*e).clone()))
        .collect()
}
