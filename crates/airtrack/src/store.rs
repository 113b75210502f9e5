//! Record store for airtrack.
//!
//! The store holds the loaded dataset as an arena of flight records plus
//! auxiliary index maps built once at construction. It is read-only for
//! the lifetime of a snapshot; dataset reload replaces the whole store
//! through the [`Dataset`] handle rather than mutating it in place, so
//! the hot read path needs no locks.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Aircraft, Airline, Airport, Flight, FlightStatus};

/// Immutable store of flights, aircraft, airports, and airlines.
///
/// Indexed lookups are O(1) on the index key and yield flights in
/// insertion order without copying. Unknown keys yield an empty
/// sequence, never an error.
#[derive(Debug)]
pub struct RecordStore {
    flights: Vec<Flight>,
    airlines: HashMap<String, Airline>,
    airports: HashMap<String, Airport>,
    aircraft: HashMap<String, Aircraft>,
    by_airline: HashMap<String, Vec<usize>>,
    by_origin: HashMap<String, Vec<usize>>,
    by_destination: HashMap<String, Vec<usize>>,
    by_aircraft: HashMap<String, Vec<usize>>,
    by_status: HashMap<FlightStatus, Vec<usize>>,
}

impl RecordStore {
    fn from_validated(
        airlines: HashMap<String, Airline>,
        airports: HashMap<String, Airport>,
        aircraft: HashMap<String, Aircraft>,
        flights: Vec<Flight>,
    ) -> Self {
        let mut by_airline: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_origin: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_destination: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_aircraft: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_status: HashMap<FlightStatus, Vec<usize>> = HashMap::new();

        for (idx, flight) in flights.iter().enumerate() {
            by_airline
                .entry(flight.airline_id.clone())
                .or_default()
                .push(idx);
            by_origin
                .entry(flight.origin.clone())
                .or_default()
                .push(idx);
            by_destination
                .entry(flight.destination.clone())
                .or_default()
                .push(idx);
            by_aircraft
                .entry(flight.aircraft_registration.clone())
                .or_default()
                .push(idx);
            by_status.entry(flight.status).or_default().push(idx);
        }

        debug!(
            flights = flights.len(),
            airlines = airlines.len(),
            airports = airports.len(),
            aircraft = aircraft.len(),
            "built record store indexes"
        );

        Self {
            flights,
            airlines,
            airports,
            aircraft,
            by_airline,
            by_origin,
            by_destination,
            by_aircraft,
            by_status,
        }
    }

    /// All flights, in insertion order.
    #[must_use]
    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    /// Flights operated by the given airline, in insertion order.
    pub fn flights_by_airline<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Flight> {
        Self::indexed(&self.flights, self.by_airline.get(id))
    }

    /// Flights departing from the given airport, in insertion order.
    pub fn flights_by_origin<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Flight> {
        Self::indexed(&self.flights, self.by_origin.get(code))
    }

    /// Flights arriving at the given airport, in insertion order.
    pub fn flights_by_destination<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Flight> {
        Self::indexed(&self.flights, self.by_destination.get(code))
    }

    /// Flights flown by the given aircraft, in insertion order.
    pub fn flights_by_aircraft<'a>(&'a self, registration: &str) -> impl Iterator<Item = &'a Flight> {
        Self::indexed(&self.flights, self.by_aircraft.get(registration))
    }

    /// Flights with the given status, in insertion order.
    pub fn flights_by_status(&self, status: FlightStatus) -> impl Iterator<Item = &Flight> {
        Self::indexed(&self.flights, self.by_status.get(&status))
    }

    fn indexed<'a>(
        flights: &'a [Flight],
        indices: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Flight> {
        indices.into_iter().flatten().map(move |&i| &flights[i])
    }

    /// Look up an airline by id.
    #[must_use]
    pub fn airline(&self, id: &str) -> Option<&Airline> {
        self.airlines.get(id)
    }

    /// Look up an airport by code.
    #[must_use]
    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.airports.get(code)
    }

    /// Look up an aircraft by registration.
    #[must_use]
    pub fn aircraft(&self, registration: &str) -> Option<&Aircraft> {
        self.aircraft.get(registration)
    }

    /// All airports in the store, in no particular order.
    pub fn airports(&self) -> impl Iterator<Item = &Airport> {
        self.airports.values()
    }

    /// Number of flights in the store.
    #[must_use]
    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }

    /// Number of airlines in the store.
    #[must_use]
    pub fn airline_count(&self) -> usize {
        self.airlines.len()
    }

    /// Number of airports in the store.
    #[must_use]
    pub fn airport_count(&self) -> usize {
        self.airports.len()
    }

    /// Number of aircraft in the store.
    #[must_use]
    pub fn aircraft_count(&self) -> usize {
        self.aircraft.len()
    }
}

/// Builder that validates a dataset before producing a [`RecordStore`].
///
/// Referential integrity is checked at [`build`](Self::build): every
/// flight's airline, aircraft, origin, and destination must resolve, and
/// entity identifiers must be unique. A violation fails the whole load;
/// no store is produced from a half-valid dataset.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    airlines: Vec<Airline>,
    airports: Vec<Airport>,
    aircraft: Vec<Aircraft>,
    flights: Vec<Flight>,
}

impl DatasetBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an airline.
    pub fn airline(&mut self, airline: Airline) -> &mut Self {
        self.airlines.push(airline);
        self
    }

    /// Add an airport.
    pub fn airport(&mut self, airport: Airport) -> &mut Self {
        self.airports.push(airport);
        self
    }

    /// Add an aircraft.
    pub fn aircraft(&mut self, aircraft: Aircraft) -> &mut Self {
        self.aircraft.push(aircraft);
        self
    }

    /// Add a flight.
    pub fn flight(&mut self, flight: Flight) -> &mut Self {
        self.flights.push(flight);
        self
    }

    /// Validate the dataset and build the store.
    ///
    /// # Errors
    ///
    /// Returns `DatasetIntegrity` on duplicate identifiers or dangling
    /// references.
    pub fn build(self) -> Result<RecordStore> {
        let mut airlines = HashMap::with_capacity(self.airlines.len());
        for airline in self.airlines {
            if airlines.insert(airline.id.clone(), airline.clone()).is_some() {
                return Err(Error::integrity(format!(
                    "duplicate airline id '{}'",
                    airline.id
                )));
            }
        }

        let mut airports = HashMap::with_capacity(self.airports.len());
        for airport in self.airports {
            if airports.insert(airport.code.clone(), airport.clone()).is_some() {
                return Err(Error::integrity(format!(
                    "duplicate airport code '{}'",
                    airport.code
                )));
            }
        }

        let mut aircraft = HashMap::with_capacity(self.aircraft.len());
        for plane in self.aircraft {
            if !airlines.contains_key(&plane.airline_id) {
                return Err(Error::integrity(format!(
                    "aircraft '{}' references unknown airline '{}'",
                    plane.registration, plane.airline_id
                )));
            }
            if aircraft
                .insert(plane.registration.clone(), plane.clone())
                .is_some()
            {
                return Err(Error::integrity(format!(
                    "duplicate aircraft registration '{}'",
                    plane.registration
                )));
            }
        }

        for flight in &self.flights {
            if !airlines.contains_key(&flight.airline_id) {
                return Err(Error::integrity(format!(
                    "flight '{}' references unknown airline '{}'",
                    flight.number, flight.airline_id
                )));
            }
            if !aircraft.contains_key(&flight.aircraft_registration) {
                return Err(Error::integrity(format!(
                    "flight '{}' references unknown aircraft '{}'",
                    flight.number, flight.aircraft_registration
                )));
            }
            if !airports.contains_key(&flight.origin) {
                return Err(Error::integrity(format!(
                    "flight '{}' references unknown origin airport '{}'",
                    flight.number, flight.origin
                )));
            }
            if !airports.contains_key(&flight.destination) {
                return Err(Error::integrity(format!(
                    "flight '{}' references unknown destination airport '{}'",
                    flight.number, flight.destination
                )));
            }
        }

        info!(flights = self.flights.len(), "dataset validated");
        Ok(RecordStore::from_validated(
            airlines,
            airports,
            aircraft,
            self.flights,
        ))
    }
}

/// Shared handle to the current dataset snapshot.
///
/// Queries clone the inner `Arc` and compute against that snapshot;
/// reload builds a complete replacement store and installs it with
/// [`swap`](Self::swap). In-flight queries keep the snapshot they
/// started with and never observe a partially-updated dataset.
#[derive(Debug)]
pub struct Dataset {
    inner: RwLock<Arc<RecordStore>>,
}

impl Dataset {
    /// Wrap a freshly built store.
    #[must_use]
    pub fn new(store: RecordStore) -> Self {
        Self {
            inner: RwLock::new(Arc::new(store)),
        }
    }

    /// Get the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RecordStore> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically replace the current snapshot.
    pub fn swap(&self, store: RecordStore) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(store);
        info!("dataset snapshot replaced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn airline(id: &str, name: &str) -> Airline {
        Airline {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn airport(code: &str) -> Airport {
        Airport {
            code: code.to_string(),
            name: format!("{code} International"),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn plane(registration: &str, model: &str, airline_id: &str) -> Aircraft {
        Aircraft {
            registration: registration.to_string(),
            model: model.to_string(),
            airline_id: airline_id.to_string(),
        }
    }

    fn flight(number: &str, airline_id: &str, reg: &str, route: (&str, &str)) -> Flight {
        Flight {
            number: number.to_string(),
            airline_id: airline_id.to_string(),
            aircraft_registration: reg.to_string(),
            origin: route.0.to_string(),
            destination: route.1.to_string(),
            scheduled_departure: Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()),
            actual_departure: Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 10, 0).unwrap()),
            scheduled_arrival: None,
            actual_arrival: None,
            status: FlightStatus::Landed,
        }
    }

    fn sample_store() -> RecordStore {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta Air Lines"))
            .airline(airline("AA", "American Airlines"))
            .airport(airport("ATL"))
            .airport(airport("JFK"))
            .airport(airport("LAX"))
            .aircraft(plane("N100DL", "Boeing 737-800", "DL"))
            .aircraft(plane("N200AA", "Airbus A321", "AA"))
            .flight(flight("DL100", "DL", "N100DL", ("ATL", "JFK")))
            .flight(flight("DL101", "DL", "N100DL", ("JFK", "ATL")))
            .flight(flight("AA200", "AA", "N200AA", ("LAX", "JFK")));
        builder.build().expect("sample dataset should validate")
    }

    #[test]
    fn test_build_counts() {
        let store = sample_store();
        assert_eq!(store.flight_count(), 3);
        assert_eq!(store.airline_count(), 2);
        assert_eq!(store.airport_count(), 3);
        assert_eq!(store.aircraft_count(), 2);
    }

    #[test]
    fn test_airports_iterates_all_entries() {
        let store = sample_store();
        let mut codes: Vec<&str> = store.airports().map(|a| a.code.as_str()).collect();
        codes.sort_unstable();
        assert_eq!(codes, vec!["ATL", "JFK", "LAX"]);
    }

    #[test]
    fn test_flights_insertion_order() {
        let store = sample_store();
        let numbers: Vec<&str> = store.flights().iter().map(|f| f.number.as_str()).collect();
        assert_eq!(numbers, vec!["DL100", "DL101", "AA200"]);
    }

    #[test]
    fn test_flights_by_airline() {
        let store = sample_store();
        let numbers: Vec<&str> = store
            .flights_by_airline("DL")
            .map(|f| f.number.as_str())
            .collect();
        assert_eq!(numbers, vec!["DL100", "DL101"]);
    }

    #[test]
    fn test_flights_by_origin_and_destination() {
        let store = sample_store();
        assert_eq!(store.flights_by_origin("ATL").count(), 1);
        assert_eq!(store.flights_by_destination("JFK").count(), 2);
    }

    #[test]
    fn test_flights_by_aircraft() {
        let store = sample_store();
        assert_eq!(store.flights_by_aircraft("N100DL").count(), 2);
        assert_eq!(store.flights_by_aircraft("N200AA").count(), 1);
    }

    #[test]
    fn test_flights_by_status() {
        let store = sample_store();
        assert_eq!(store.flights_by_status(FlightStatus::Landed).count(), 3);
        assert_eq!(store.flights_by_status(FlightStatus::Cancelled).count(), 0);
    }

    #[test]
    fn test_unknown_key_yields_empty_not_error() {
        let store = sample_store();
        assert_eq!(store.flights_by_airline("ZZ").count(), 0);
        assert_eq!(store.flights_by_origin("XXX").count(), 0);
        assert_eq!(store.flights_by_aircraft("N999XX").count(), 0);
    }

    #[test]
    fn test_entity_lookups() {
        let store = sample_store();
        assert_eq!(store.airline("DL").unwrap().name, "Delta Air Lines");
        assert_eq!(store.airport("ATL").unwrap().code, "ATL");
        assert_eq!(store.aircraft("N200AA").unwrap().model, "Airbus A321");
        assert!(store.airline("ZZ").is_none());
    }

    #[test]
    fn test_build_rejects_dangling_airline() {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta"))
            .airport(airport("ATL"))
            .airport(airport("JFK"))
            .aircraft(plane("N100DL", "737", "DL"))
            .flight(flight("XX1", "XX", "N100DL", ("ATL", "JFK")));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("unknown airline 'XX'"));
    }

    #[test]
    fn test_build_rejects_dangling_aircraft() {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta"))
            .airport(airport("ATL"))
            .airport(airport("JFK"))
            .flight(flight("DL1", "DL", "N404XX", ("ATL", "JFK")));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("unknown aircraft 'N404XX'"));
    }

    #[test]
    fn test_build_rejects_dangling_airport() {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta"))
            .airport(airport("ATL"))
            .aircraft(plane("N100DL", "737", "DL"))
            .flight(flight("DL1", "DL", "N100DL", ("ATL", "XXX")));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("unknown destination airport 'XXX'"));
    }

    #[test]
    fn test_build_rejects_duplicate_airline() {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta"))
            .airline(airline("DL", "Delta again"));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("duplicate airline id 'DL'"));
    }

    #[test]
    fn test_build_rejects_duplicate_registration() {
        let mut builder = DatasetBuilder::new();
        builder
            .airline(airline("DL", "Delta"))
            .aircraft(plane("N100DL", "737", "DL"))
            .aircraft(plane("N100DL", "A321", "DL"));
        let err = builder.build().unwrap_err();
        assert!(err
            .to_string()
            .contains("duplicate aircraft registration 'N100DL'"));
    }

    #[test]
    fn test_build_rejects_aircraft_with_unknown_airline() {
        let mut builder = DatasetBuilder::new();
        builder.aircraft(plane("N100DL", "737", "DL"));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("unknown airline 'DL'"));
    }

    #[test]
    fn test_empty_dataset_builds() {
        let store = DatasetBuilder::new().build().unwrap();
        assert_eq!(store.flight_count(), 0);
        assert_eq!(store.flights_by_status(FlightStatus::Active).count(), 0);
    }

    #[test]
    fn test_dataset_snapshot_swap() {
        let dataset = Dataset::new(sample_store());
        let before = dataset.snapshot();
        assert_eq!(before.flight_count(), 3);

        dataset.swap(DatasetBuilder::new().build().unwrap());

        // The old snapshot is unaffected; new snapshots see the swap.
        assert_eq!(before.flight_count(), 3);
        assert_eq!(dataset.snapshot().flight_count(), 0);
    }

    #[test]
    fn test_snapshot_is_shared() {
        let dataset = Dataset::new(sample_store());
        let a = dataset.snapshot();
        let b = dataset.snapshot();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
