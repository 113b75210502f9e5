//! Core record types for airtrack.
//!
//! This module defines the entities of the flight dataset: flights,
//! aircraft, airports, and airlines. All records are immutable once
//! loaded; derived values such as departure delay are computed on
//! demand and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle status of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    /// Flight is planned but has not departed.
    Scheduled,
    /// Flight is in the air.
    Active,
    /// Flight has arrived at its destination.
    Landed,
    /// Flight was cancelled before departure.
    Cancelled,
    /// Flight was diverted to another airport.
    Diverted,
}

impl FlightStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Scheduled,
        Self::Active,
        Self::Landed,
        Self::Cancelled,
        Self::Diverted,
    ];

    /// The canonical label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Landed => "landed",
            Self::Cancelled => "cancelled",
            Self::Diverted => "diverted",
        }
    }

    /// Parse a status label, case-insensitively.
    ///
    /// Returns `None` for labels outside the enum; callers decide how to
    /// report that (the filter layer turns it into `InvalidFilterValue`).
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "active" => Some(Self::Active),
            "landed" => Some(Self::Landed),
            "cancelled" => Some(Self::Cancelled),
            "diverted" => Some(Self::Diverted),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An airline operating flights in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    /// Short identifier, e.g. "DL".
    pub id: String,
    /// Display name, e.g. "Delta Air Lines".
    pub name: String,
}

/// An airport referenced by flights as origin or destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    /// IATA-style code, e.g. "ATL".
    pub code: String,
    /// Display name.
    pub name: String,
    /// Latitude in degrees, for mapping.
    pub latitude: f64,
    /// Longitude in degrees, for mapping.
    pub longitude: f64,
}

/// An aircraft owned by an airline.
///
/// Flight count is always a derived aggregate; it is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aircraft {
    /// Tail registration, e.g. "N100DL".
    pub registration: String,
    /// Model designation, e.g. "Boeing 737-800".
    pub model: String,
    /// Owning airline id.
    pub airline_id: String,
}

/// A single flight record.
///
/// Immutable once loaded. All entity references are resolved against the
/// record store during dataset load, so lookups through them cannot dangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Flight identifier, e.g. "DL1234".
    pub number: String,
    /// Operating airline id.
    pub airline_id: String,
    /// Registration of the aircraft flying this leg.
    pub aircraft_registration: String,
    /// Origin airport code.
    pub origin: String,
    /// Destination airport code.
    pub destination: String,
    /// Scheduled departure time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_departure: Option<DateTime<Utc>>,
    /// Actual departure time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_departure: Option<DateTime<Utc>>,
    /// Scheduled arrival time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_arrival: Option<DateTime<Utc>>,
    /// Actual arrival time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_arrival: Option<DateTime<Utc>>,
    /// Current status.
    pub status: FlightStatus,
}

impl Flight {
    /// Departure delay in minutes: actual minus scheduled departure.
    ///
    /// Defined only when both timestamps are present. Flights without a
    /// defined delay are excluded from delay statistics but still count
    /// toward count-based statistics.
    #[must_use]
    pub fn departure_delay_minutes(&self) -> Option<i64> {
        match (self.actual_departure, self.scheduled_departure) {
            (Some(actual), Some(scheduled)) => {
                Some(actual.signed_duration_since(scheduled).num_minutes())
            }
            _ => None,
        }
    }
}
