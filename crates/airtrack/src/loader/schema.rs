//! `SQLite` schema for the flight dataset file.
//!
//! The dataset is produced offline and opened read-only by the loader;
//! these statements exist so tests and tooling can create compatible
//! fixture files.

/// SQL statement to create the airlines table.
pub const CREATE_AIRLINES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS airlines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
)
";

/// SQL statement to create the airports table.
pub const CREATE_AIRPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS airports (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
)
";

/// SQL statement to create the aircraft table.
pub const CREATE_AIRCRAFT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS aircraft (
    registration TEXT PRIMARY KEY,
    model TEXT NOT NULL,
    airline_id TEXT NOT NULL
)
";

/// SQL statement to create the flights table.
///
/// Timestamps are stored as RFC 3339 text; a NULL timestamp means the
/// event has not happened or was never reported.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    number TEXT NOT NULL,
    airline_id TEXT NOT NULL,
    aircraft_registration TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    scheduled_departure TEXT,
    actual_departure TEXT,
    scheduled_arrival TEXT,
    actual_arrival TEXT,
    status TEXT NOT NULL
)
";

/// SQL statement to create an index on the operating airline.
pub const CREATE_FLIGHT_AIRLINE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_airline ON flights(airline_id)
";

/// SQL statement to create an index on the origin airport.
pub const CREATE_FLIGHT_ORIGIN_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_origin ON flights(origin)
";

/// SQL statement to create an index on the destination airport.
pub const CREATE_FLIGHT_DESTINATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_destination ON flights(destination)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_AIRLINES_TABLE,
    CREATE_AIRPORTS_TABLE,
    CREATE_AIRCRAFT_TABLE,
    CREATE_FLIGHTS_TABLE,
    CREATE_FLIGHT_AIRLINE_INDEX,
    CREATE_FLIGHT_ORIGIN_INDEX,
    CREATE_FLIGHT_DESTINATION_INDEX,
];
