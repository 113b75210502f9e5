//! Dataset loader for airtrack.
//!
//! Reads a flight dataset from a `SQLite` file into an in-memory
//! [`RecordStore`]. The file is opened read-only; the engine never
//! writes back. Loading fails closed: any malformed timestamp, unknown
//! status label, or dangling entity reference aborts the load with a
//! `DatasetIntegrity` error rather than producing a partial store.

pub mod schema;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Aircraft, Airline, Airport, Flight, FlightStatus};
use crate::store::{DatasetBuilder, RecordStore};

/// Load a dataset file into a record store.
///
/// # Errors
///
/// Returns `DatasetOpen` if the file cannot be opened, `DatasetQuery`
/// if a table cannot be read, and `DatasetIntegrity` for malformed or
/// inconsistent records.
pub fn load(path: impl AsRef<Path>) -> Result<RecordStore> {
    let path = path.as_ref();
    debug!("opening dataset at {}", path.display());
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| Error::DatasetOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let store = load_from(&conn)?;
    info!(
        flights = store.flight_count(),
        aircraft = store.aircraft_count(),
        airports = store.airport_count(),
        airlines = store.airline_count(),
        "dataset loaded from {}",
        path.display()
    );
    Ok(store)
}

/// Load a dataset from an already-open connection.
///
/// # Errors
///
/// Same failure modes as [`load`], minus the open step.
pub fn load_from(conn: &Connection) -> Result<RecordStore> {
    let mut builder = DatasetBuilder::new();

    let mut stmt = conn.prepare("SELECT id, name FROM airlines ORDER BY id")?;
    let airlines = stmt
        .query_map([], |row| {
            Ok(Airline {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for airline in airlines {
        builder.airline(airline);
    }

    let mut stmt =
        conn.prepare("SELECT code, name, latitude, longitude FROM airports ORDER BY code")?;
    let airports = stmt
        .query_map([], |row| {
            Ok(Airport {
                code: row.get(0)?,
                name: row.get(1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for airport in airports {
        builder.airport(airport);
    }

    let mut stmt =
        conn.prepare("SELECT registration, model, airline_id FROM aircraft ORDER BY registration")?;
    let aircraft = stmt
        .query_map([], |row| {
            Ok(Aircraft {
                registration: row.get(0)?,
                model: row.get(1)?,
                airline_id: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for plane in aircraft {
        builder.aircraft(plane);
    }

    let mut stmt = conn.prepare(
        r"
        SELECT number, airline_id, aircraft_registration, origin, destination,
               scheduled_departure, actual_departure, scheduled_arrival, actual_arrival,
               status
        FROM flights ORDER BY rowid
        ",
    )?;
    let raw_flights = stmt
        .query_map([], |row| {
            Ok(RawFlight {
                number: row.get(0)?,
                airline_id: row.get(1)?,
                aircraft_registration: row.get(2)?,
                origin: row.get(3)?,
                destination: row.get(4)?,
                scheduled_departure: row.get(5)?,
                actual_departure: row.get(6)?,
                scheduled_arrival: row.get(7)?,
                actual_arrival: row.get(8)?,
                status: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for raw in raw_flights {
        builder.flight(raw.into_flight()?);
    }

    builder.build()
}

/// A flight row as stored, before timestamp and status decoding.
struct RawFlight {
    number: String,
    airline_id: String,
    aircraft_registration: String,
    origin: String,
    destination: String,
    scheduled_departure: Option<String>,
    actual_departure: Option<String>,
    scheduled_arrival: Option<String>,
    actual_arrival: Option<String>,
    status: String,
}

impl RawFlight {
    fn into_flight(self) -> Result<Flight> {
        let status = FlightStatus::parse(&self.status).ok_or_else(|| {
            Error::integrity(format!(
                "flight '{}' has unknown status '{}'",
                self.number, self.status
            ))
        })?;
        Ok(Flight {
            scheduled_departure: parse_timestamp(
                &self.number,
                "scheduled_departure",
                self.scheduled_departure.as_deref(),
            )?,
            actual_departure: parse_timestamp(
                &self.number,
                "actual_departure",
                self.actual_departure.as_deref(),
            )?,
            scheduled_arrival: parse_timestamp(
                &self.number,
                "scheduled_arrival",
                self.scheduled_arrival.as_deref(),
            )?,
            actual_arrival: parse_timestamp(
                &self.number,
                "actual_arrival",
                self.actual_arrival.as_deref(),
            )?,
            number: self.number,
            airline_id: self.airline_id,
            aircraft_registration: self.aircraft_registration,
            origin: self.origin,
            destination: self.destination,
            status,
        })
    }
}

fn parse_timestamp(
    flight: &str,
    field: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                Error::integrity(format!(
                    "flight '{flight}' has malformed {field} '{text}'"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn fixture_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute(stmt, []).unwrap();
        }
        conn
    }

    fn insert_entities(conn: &Connection) {
        conn.execute(
            "INSERT INTO airlines (id, name) VALUES (?1, ?2)",
            params!["DL", "Delta Air Lines"],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO airports (code, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
            params!["ATL", "Atlanta Hartsfield", 33.6, -84.4],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO airports (code, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
            params!["JFK", "New York JFK", 40.6, -73.8],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO aircraft (registration, model, airline_id) VALUES (?1, ?2, ?3)",
            params!["N100DL", "Boeing 737-800", "DL"],
        )
        .unwrap();
    }

    fn insert_flight(
        conn: &Connection,
        number: &str,
        scheduled_dep: Option<&str>,
        actual_dep: Option<&str>,
        status: &str,
    ) {
        conn.execute(
            r"
            INSERT INTO flights
                (number, airline_id, aircraft_registration, origin, destination,
                 scheduled_departure, actual_departure, scheduled_arrival, actual_arrival,
                 status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, ?8)
            ",
            params![
                number,
                "DL",
                "N100DL",
                "ATL",
                "JFK",
                scheduled_dep,
                actual_dep,
                status,
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_load_complete_dataset() {
        let conn = fixture_conn();
        insert_entities(&conn);
        insert_flight(
            &conn,
            "DL100",
            Some("2024-03-15T09:00:00Z"),
            Some("2024-03-15T09:25:00Z"),
            "landed",
        );
        insert_flight(&conn, "DL101", Some("2024-03-15T12:00:00Z"), None, "cancelled");

        let store = load_from(&conn).unwrap();
        assert_eq!(store.flight_count(), 2);
        assert_eq!(store.airline_count(), 1);
        assert_eq!(store.airport_count(), 2);
        assert_eq!(store.aircraft_count(), 1);

        let flight = &store.flights()[0];
        assert_eq!(flight.number, "DL100");
        assert_eq!(flight.departure_delay_minutes(), Some(25));
        assert_eq!(flight.status, FlightStatus::Landed);
    }

    #[test]
    fn test_load_empty_dataset() {
        let conn = fixture_conn();
        let store = load_from(&conn).unwrap();
        assert_eq!(store.flight_count(), 0);
    }

    #[test]
    fn test_status_labels_parse_case_insensitively() {
        let conn = fixture_conn();
        insert_entities(&conn);
        insert_flight(&conn, "DL100", None, None, "Landed");
        let store = load_from(&conn).unwrap();
        assert_eq!(store.flights()[0].status, FlightStatus::Landed);
    }

    #[test]
    fn test_unknown_status_fails_closed() {
        let conn = fixture_conn();
        insert_entities(&conn);
        insert_flight(&conn, "DL100", None, None, "boarding");
        let err = load_from(&conn).unwrap_err();
        assert!(matches!(err, Error::DatasetIntegrity { .. }));
        assert!(err.to_string().contains("DL100"));
        assert!(err.to_string().contains("boarding"));
    }

    #[test]
    fn test_malformed_timestamp_fails_closed() {
        let conn = fixture_conn();
        insert_entities(&conn);
        insert_flight(&conn, "DL100", Some("yesterday"), None, "scheduled");
        let err = load_from(&conn).unwrap_err();
        assert!(matches!(err, Error::DatasetIntegrity { .. }));
        assert!(err.to_string().contains("scheduled_departure"));
    }

    #[test]
    fn test_dangling_airline_reference_fails_closed() {
        let conn = fixture_conn();
        insert_entities(&conn);
        conn.execute(
            r"
            INSERT INTO flights
                (number, airline_id, aircraft_registration, origin, destination,
                 scheduled_departure, actual_departure, scheduled_arrival, actual_arrival,
                 status)
            VALUES ('XX1', 'XX', 'N100DL', 'ATL', 'JFK', NULL, NULL, NULL, NULL, 'scheduled')
            ",
            [],
        )
        .unwrap();
        let err = load_from(&conn).unwrap_err();
        assert!(matches!(err, Error::DatasetIntegrity { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, Error::DatasetOpen { .. }));
    }

    #[test]
    fn test_load_file_based_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("air_tracker.db");
        {
            let conn = Connection::open(&path).unwrap();
            for stmt in schema::SCHEMA_STATEMENTS {
                conn.execute(stmt, []).unwrap();
            }
            insert_entities(&conn);
            insert_flight(&conn, "DL100", Some("2024-03-15T09:00:00Z"), None, "active");
        }
        let store = load(&path).unwrap();
        assert_eq!(store.flight_count(), 1);
    }

    #[test]
    fn test_offset_timestamps_normalize_to_utc() {
        let conn = fixture_conn();
        insert_entities(&conn);
        insert_flight(
            &conn,
            "DL100",
            Some("2024-03-15T09:00:00-04:00"),
            Some("2024-03-15T13:30:00Z"),
            "landed",
        );
        let store = load_from(&conn).unwrap();
        assert_eq!(store.flights()[0].departure_delay_minutes(), Some(30));
    }
}
