//! Flight schedule records and the typed selectors used to slice them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two schedule states a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The original schedule.
    Start,
    /// The schedule produced by the optimizer.
    Result,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Result => "result",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a flight occurrence in one schedule variant.
///
/// Serialized names follow the column names of the exported dataset, so the
/// same struct reads both the JSON export and its CSV counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub flight_id: String,
    #[serde(rename = "Дата вылета")]
    pub departure_date: i64,
    #[serde(rename = "Номер рейса")]
    pub flight_number: String,
    #[serde(rename = "Аэропорт вылета")]
    pub departure_airport: String,
    #[serde(rename = "Аэропорт прилета")]
    pub arrival_airport: String,
    #[serde(rename = "Время вылета")]
    pub departure_time: String,
    #[serde(rename = "Время прилета")]
    pub arrival_time: String,
    #[serde(rename = "Время вылета (минуты)")]
    pub departure_minutes: i64,
    #[serde(rename = "Время прилета (минуты)")]
    pub arrival_minutes: i64,
    #[serde(rename = "Время вылета_ts")]
    pub departure_ts: i64,
    pub was_moved: bool,
    pub stage: Stage,
    #[serde(rename = "Доход")]
    pub revenue: f64,

    // presentation metadata
    #[serde(rename = "Тип ВС", default)]
    pub aircraft_type: Option<String>,
    #[serde(rename = "Широта аэропорта вылета", default)]
    pub departure_latitude: Option<f64>,
    #[serde(rename = "Долгота аэропорта вылета", default)]
    pub departure_longitude: Option<f64>,
    #[serde(rename = "Широта аэропорта прилета", default)]
    pub arrival_latitude: Option<f64>,
    #[serde(rename = "Долгота аэропорта прилета", default)]
    pub arrival_longitude: Option<f64>,
    #[serde(rename = "Город аэропорта вылета", default)]
    pub departure_city: Option<String>,
    #[serde(rename = "Город аэропорта прилета", default)]
    pub arrival_city: Option<String>,
    #[serde(rename = "Страна аэропорта вылета", default)]
    pub departure_country: Option<String>,
    #[serde(rename = "Страна аэропорта прилета", default)]
    pub arrival_country: Option<String>,
    #[serde(rename = "Расстояние между аэропортами", default)]
    pub distance: Option<f64>,
    #[serde(rename = "Международный рейс", default)]
    pub international: Option<bool>,
    #[serde(rename = "Вектор движения", default)]
    pub heading: Option<f64>,
    #[serde(rename = "Популяция аэропорта вылета", default)]
    pub departure_population: Option<f64>,
    #[serde(rename = "Часовой пояс аэропорта вылета", default)]
    pub departure_timezone: Option<String>,
    #[serde(rename = "Популяция аэропорта прилета", default)]
    pub arrival_population: Option<f64>,
    #[serde(rename = "Часовой пояс аэропорта прилета", default)]
    pub arrival_timezone: Option<String>,
    #[serde(rename = "Время в пути", default)]
    pub travel_time: Option<f64>,
    #[serde(rename = "Емкость", default)]
    pub capacity: Option<f64>,
    #[serde(rename = "Пассажиры", default)]
    pub passengers: Option<f64>,
    #[serde(rename = "Бронирования", default)]
    pub bookings: Option<f64>,
    #[serde(rename = "Загруженность", default)]
    pub load_factor: Option<f64>,
    #[serde(rename = "Доход на пассажира", default)]
    pub revenue_per_passenger: Option<f64>,
}

impl FlightRecord {
    /// Builds a record carrying only the fields the aggregation pipeline reads.
    ///
    /// Labels are left empty and all presentation metadata is `None`.
    pub fn new(
        flight_id: &str,
        flight_number: &str,
        stage: Stage,
        departure_ts: i64,
        revenue: f64,
        was_moved: bool,
    ) -> Self {
        FlightRecord {
            flight_id: flight_id.to_string(),
            departure_date: departure_ts,
            flight_number: flight_number.to_string(),
            departure_airport: String::new(),
            arrival_airport: String::new(),
            departure_time: String::new(),
            arrival_time: String::new(),
            departure_minutes: 0,
            arrival_minutes: 0,
            departure_ts,
            was_moved,
            stage,
            revenue,
            aircraft_type: None,
            departure_latitude: None,
            departure_longitude: None,
            arrival_latitude: None,
            arrival_longitude: None,
            departure_city: None,
            arrival_city: None,
            departure_country: None,
            arrival_country: None,
            distance: None,
            international: None,
            heading: None,
            departure_population: None,
            departure_timezone: None,
            arrival_population: None,
            arrival_timezone: None,
            travel_time: None,
            capacity: None,
            passengers: None,
            bookings: None,
            load_factor: None,
            revenue_per_passenger: None,
        }
    }

    /// Sets the route endpoints.
    pub fn with_route(mut self, departure_airport: &str, arrival_airport: &str) -> Self {
        self.departure_airport = departure_airport.to_string();
        self.arrival_airport = arrival_airport.to_string();
        self
    }

    /// Sets the minutes-after-midnight departure and arrival times.
    pub fn with_minutes(mut self, departure_minutes: i64, arrival_minutes: i64) -> Self {
        self.departure_minutes = departure_minutes;
        self.arrival_minutes = arrival_minutes;
        self
    }
}

/// Grouping key derived from a [`FlightField`].
///
/// A record that does not carry the selected field lands under
/// [`FieldKey::Undefined`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldKey {
    Text(String),
    Undefined,
}

impl FieldKey {
    pub fn text(value: &str) -> Self {
        FieldKey::Text(value.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldKey::Text(s) => Some(s),
            FieldKey::Undefined => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Text(s) => f.write_str(s),
            FieldKey::Undefined => f.write_str("undefined"),
        }
    }
}

/// Categorical fields a [`FlightRecord`] can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightField {
    FlightId,
    FlightNumber,
    Stage,
    DepartureAirport,
    ArrivalAirport,
    AircraftType,
}

impl FlightField {
    pub fn key(&self, record: &FlightRecord) -> FieldKey {
        match self {
            FlightField::FlightId => FieldKey::text(&record.flight_id),
            FlightField::FlightNumber => FieldKey::text(&record.flight_number),
            FlightField::Stage => FieldKey::text(record.stage.as_str()),
            FlightField::DepartureAirport => FieldKey::text(&record.departure_airport),
            FlightField::ArrivalAirport => FieldKey::text(&record.arrival_airport),
            FlightField::AircraftType => record
                .aircraft_type
                .as_deref()
                .map_or(FieldKey::Undefined, FieldKey::text),
        }
    }
}

/// Integer time fields a [`FlightRecord`] can be histogrammed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    /// Minutes after midnight, local departure time.
    DepartureMinutes,
    /// Minutes after midnight, local arrival time.
    ArrivalMinutes,
    /// Epoch milliseconds of the scheduled departure.
    DepartureTimestamp,
    /// Epoch milliseconds of the departure date.
    DepartureDate,
}

impl TimeField {
    pub fn value(&self, record: &FlightRecord) -> i64 {
        match self {
            TimeField::DepartureMinutes => record.departure_minutes,
            TimeField::ArrivalMinutes => record.arrival_minutes,
            TimeField::DepartureTimestamp => record.departure_ts,
            TimeField::DepartureDate => record.departure_date,
        }
    }
}
