//! Filter evaluator for airtrack.
//!
//! A [`FilterSpec`] is a flat conjunction of optional criteria; absent
//! criteria impose no constraint, so the empty spec matches every
//! flight. Keeping the filter a closed struct of known criteria (no
//! OR/NOT) matches the dashboard's filter-panel semantics and keeps
//! evaluation a cheap per-record check with no planning step.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Flight, FlightStatus};
use crate::store::RecordStore;

/// A conjunction of filter criteria over flight records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Restrict to flights operated by this airline id.
    pub airline: Option<String>,
    /// Restrict to flights with this status.
    pub status: Option<FlightStatus>,
    /// Restrict to flights departing from this airport code.
    pub origin: Option<String>,
    /// Restrict to flights arriving at this airport code.
    pub destination: Option<String>,
    /// Restrict to flights flown by aircraft of this model.
    pub aircraft_model: Option<String>,
    /// Restrict to flights scheduled to depart within this range,
    /// inclusive on both ends.
    pub departure_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl FilterSpec {
    /// Check whether no criteria are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set the inclusive scheduled-departure range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilterValue` when `from` is after `to`.
    pub fn set_departure_range(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<()> {
        if from > to {
            return Err(Error::invalid_filter_value(
                "date-range",
                format!("{from}..{to}"),
                "a range whose start is not after its end",
            ));
        }
        self.departure_range = Some((from, to));
        Ok(())
    }

    /// Evaluate this filter against a single flight.
    ///
    /// Criteria combine with logical AND. The aircraft-model criterion
    /// resolves the flight's aircraft through the store; the reference
    /// cannot dangle after a validated load. Flights without a scheduled
    /// departure never match a date-range criterion.
    #[must_use]
    pub fn matches(&self, store: &RecordStore, flight: &Flight) -> bool {
        if let Some(airline) = &self.airline {
            if flight.airline_id != *airline {
                return false;
            }
        }
        if let Some(status) = self.status {
            if flight.status != status {
                return false;
            }
        }
        if let Some(origin) = &self.origin {
            if flight.origin != *origin {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if flight.destination != *destination {
                return false;
            }
        }
        if let Some(model) = &self.aircraft_model {
            let matches_model = store
                .aircraft(&flight.aircraft_registration)
                .is_some_and(|plane| plane.model == *model);
            if !matches_model {
                return false;
            }
        }
        if let Some((from, to)) = self.departure_range {
            match flight.scheduled_departure {
                Some(departure) => {
                    if departure < from || departure > to {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }

    /// Pick the narrowest candidate sequence for this filter.
    ///
    /// Uses the store index of the most selective equality criterion when
    /// one is set; date ranges and model-only filters fall back to a full
    /// scan. Every candidate must still pass [`matches`](Self::matches).
    pub fn candidates<'a>(
        &self,
        store: &'a RecordStore,
    ) -> Box<dyn Iterator<Item = &'a Flight> + 'a> {
        if let Some(airline) = &self.airline {
            Box::new(store.flights_by_airline(airline))
        } else if let Some(origin) = &self.origin {
            Box::new(store.flights_by_origin(origin))
        } else if let Some(destination) = &self.destination {
            Box::new(store.flights_by_destination(destination))
        } else if let Some(status) = self.status {
            Box::new(store.flights_by_status(status))
        } else {
            Box::new(store.flights().iter())
        }
    }
}

/// Parse a status label into a [`FlightStatus`].
///
/// # Errors
///
/// Returns `InvalidFilterValue` for labels outside the enum, listing the
/// accepted domain.
pub fn parse_status(raw: &str) -> Result<FlightStatus> {
    FlightStatus::parse(raw).ok_or_else(|| {
        let domain = FlightStatus::ALL.map(FlightStatus::as_str).join(", ");
        Error::invalid_filter_value("status", raw, format!("one of: {domain}"))
    })
}

/// Parse the start of a date range.
///
/// Accepts an RFC 3339 timestamp or a plain date; a plain date means the
/// start of that day (UTC).
///
/// # Errors
///
/// Returns `InvalidFilterValue` when the value parses as neither.
pub fn parse_range_start(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    parse_point(field, raw, NaiveTime::MIN)
}

/// Parse the end of a date range.
///
/// Accepts an RFC 3339 timestamp or a plain date; a plain date means the
/// end of that day (UTC), keeping the range inclusive of the whole day.
///
/// # Errors
///
/// Returns `InvalidFilterValue` when the value parses as neither.
pub fn parse_range_end(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    parse_point(field, raw, end_of_day)
}

fn parse_point(field: &'static str, raw: &str, day_time: NaiveTime) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date.and_time(day_time).and_utc());
    }
    Err(Error::invalid_filter_value(
        field,
        raw,
        "an RFC 3339 timestamp or a YYYY-MM-DD date",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aircraft, Airline, Airport};
    use crate::store::DatasetBuilder;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn test_store() -> RecordStore {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(Airline {
                id: "DL".to_string(),
                name: "Delta Air Lines".to_string(),
            })
            .airline(Airline {
                id: "AA".to_string(),
                name: "American Airlines".to_string(),
            })
            .airport(Airport {
                code: "ATL".to_string(),
                name: "Atlanta".to_string(),
                latitude: 33.6,
                longitude: -84.4,
            })
            .airport(Airport {
                code: "JFK".to_string(),
                name: "New York JFK".to_string(),
                latitude: 40.6,
                longitude: -73.8,
            })
            .aircraft(Aircraft {
                registration: "N100DL".to_string(),
                model: "Boeing 737-800".to_string(),
                airline_id: "DL".to_string(),
            })
            .aircraft(Aircraft {
                registration: "N200AA".to_string(),
                model: "Airbus A321".to_string(),
                airline_id: "AA".to_string(),
            })
            .flight(Flight {
                number: "DL100".to_string(),
                airline_id: "DL".to_string(),
                aircraft_registration: "N100DL".to_string(),
                origin: "ATL".to_string(),
                destination: "JFK".to_string(),
                scheduled_departure: Some(ts(10, 9)),
                actual_departure: Some(ts(10, 10)),
                scheduled_arrival: None,
                actual_arrival: None,
                status: FlightStatus::Landed,
            })
            .flight(Flight {
                number: "AA200".to_string(),
                airline_id: "AA".to_string(),
                aircraft_registration: "N200AA".to_string(),
                origin: "JFK".to_string(),
                destination: "ATL".to_string(),
                scheduled_departure: Some(ts(12, 15)),
                actual_departure: None,
                scheduled_arrival: None,
                actual_arrival: None,
                status: FlightStatus::Cancelled,
            })
            .flight(Flight {
                number: "DL101".to_string(),
                airline_id: "DL".to_string(),
                aircraft_registration: "N100DL".to_string(),
                origin: "JFK".to_string(),
                destination: "ATL".to_string(),
                scheduled_departure: None,
                actual_departure: None,
                scheduled_arrival: None,
                actual_arrival: None,
                status: FlightStatus::Scheduled,
            });
        builder.build().expect("test dataset should validate")
    }

    fn matching_numbers(store: &RecordStore, spec: &FilterSpec) -> Vec<String> {
        store
            .flights()
            .iter()
            .filter(|f| spec.matches(store, f))
            .map(|f| f.number.clone())
            .collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let store = test_store();
        let spec = FilterSpec::default();
        assert!(spec.is_empty());
        for flight in store.flights() {
            assert!(spec.matches(&store, flight));
        }
    }

    #[test]
    fn test_airline_criterion() {
        let store = test_store();
        let spec = FilterSpec {
            airline: Some("DL".to_string()),
            ..FilterSpec::default()
        };
        assert_eq!(matching_numbers(&store, &spec), vec!["DL100", "DL101"]);
    }

    #[test]
    fn test_status_criterion() {
        let store = test_store();
        let spec = FilterSpec {
            status: Some(FlightStatus::Cancelled),
            ..FilterSpec::default()
        };
        assert_eq!(matching_numbers(&store, &spec), vec!["AA200"]);
    }

    #[test]
    fn test_route_criteria() {
        let store = test_store();
        let spec = FilterSpec {
            origin: Some("JFK".to_string()),
            destination: Some("ATL".to_string()),
            ..FilterSpec::default()
        };
        assert_eq!(matching_numbers(&store, &spec), vec!["AA200", "DL101"]);
    }

    #[test]
    fn test_aircraft_model_criterion() {
        let store = test_store();
        let spec = FilterSpec {
            aircraft_model: Some("Boeing 737-800".to_string()),
            ..FilterSpec::default()
        };
        assert_eq!(matching_numbers(&store, &spec), vec!["DL100", "DL101"]);
    }

    #[test]
    fn test_date_range_inclusive_on_both_ends() {
        let store = test_store();
        let mut spec = FilterSpec::default();
        // DL100 departs exactly at the start bound, AA200 exactly at the end.
        spec.set_departure_range(ts(10, 9), ts(12, 15)).unwrap();
        assert_eq!(matching_numbers(&store, &spec), vec!["DL100", "AA200"]);
    }

    #[test]
    fn test_date_range_excludes_flights_without_schedule() {
        let store = test_store();
        let mut spec = FilterSpec::default();
        spec.set_departure_range(ts(1, 0), ts(28, 0)).unwrap();
        // DL101 has no scheduled departure and is excluded.
        assert_eq!(matching_numbers(&store, &spec), vec!["DL100", "AA200"]);
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let mut spec = FilterSpec::default();
        let err = spec.set_departure_range(ts(12, 0), ts(10, 0)).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("date-range"));
    }

    #[test]
    fn test_conjunction_equals_pairwise_and() {
        let store = test_store();
        let airline_only = FilterSpec {
            airline: Some("DL".to_string()),
            ..FilterSpec::default()
        };
        let status_only = FilterSpec {
            status: Some(FlightStatus::Landed),
            ..FilterSpec::default()
        };
        let combined = FilterSpec {
            airline: Some("DL".to_string()),
            status: Some(FlightStatus::Landed),
            ..FilterSpec::default()
        };
        for flight in store.flights() {
            assert_eq!(
                combined.matches(&store, flight),
                airline_only.matches(&store, flight) && status_only.matches(&store, flight),
                "conjunction mismatch for {}",
                flight.number
            );
        }
    }

    #[test]
    fn test_candidates_agree_with_full_scan() {
        let store = test_store();
        let specs = [
            FilterSpec::default(),
            FilterSpec {
                airline: Some("AA".to_string()),
                ..FilterSpec::default()
            },
            FilterSpec {
                origin: Some("JFK".to_string()),
                status: Some(FlightStatus::Scheduled),
                ..FilterSpec::default()
            },
            FilterSpec {
                aircraft_model: Some("Airbus A321".to_string()),
                ..FilterSpec::default()
            },
        ];
        for spec in specs {
            let via_candidates: Vec<&str> = spec
                .candidates(&store)
                .filter(|f| spec.matches(&store, f))
                .map(|f| f.number.as_str())
                .collect();
            let via_scan: Vec<String> = matching_numbers(&store, &spec);
            assert_eq!(via_candidates, via_scan);
        }
    }

    #[test]
    fn test_parse_status_valid() {
        assert_eq!(parse_status("landed").unwrap(), FlightStatus::Landed);
        assert_eq!(parse_status("Diverted").unwrap(), FlightStatus::Diverted);
    }

    #[test]
    fn test_parse_status_invalid_reports_domain() {
        let err = parse_status("boarding").unwrap_err();
        assert!(err.is_input_error());
        let msg = err.to_string();
        assert!(msg.contains("boarding"));
        assert!(msg.contains("scheduled"));
        assert!(msg.contains("diverted"));
    }

    #[test]
    fn test_parse_range_start_date_only() {
        let start = parse_range_start("from", "2024-03-10").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_range_end_covers_whole_day() {
        let end = parse_range_end("to", "2024-03-10").unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_range_rfc3339() {
        let start = parse_range_start("from", "2024-03-10T08:30:00Z").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_range_invalid() {
        let err = parse_range_start("from", "yesterday").unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("from"));
    }

    #[test]
    fn test_filter_spec_serde_round_trip() {
        let spec = FilterSpec {
            airline: Some("DL".to_string()),
            status: Some(FlightStatus::Active),
            ..FilterSpec::default()
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: FilterSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
