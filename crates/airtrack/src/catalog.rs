//! Query catalog for airtrack.
//!
//! Each catalog entry is a named, parameterized composition of a filter
//! specification and an aggregation request — one of the dashboard's
//! canned analyses. The presentation layer only ever calls through
//! [`Catalog::run`]; it never talks to the filter evaluator or the
//! aggregation engine directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::aggregate::{aggregate, AggregationRequest, GroupKey, Metric, ROUTE_SEPARATOR};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{self, FilterSpec};
use crate::store::RecordStore;

/// A single cell in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A text value.
    Text(String),
    /// An integer value.
    Integer(i64),
    /// A numeric value, already rounded for display.
    Float(f64),
    /// Marker for "no data" (e.g. an average over zero defined delays).
    NoData,
}

impl Value {
    /// Build a display value from an optional average, rounding to one
    /// decimal place. Ranking happens upstream on unrounded values.
    #[must_use]
    pub fn average(mean: Option<f64>) -> Self {
        match mean {
            Some(v) => Self::Float((v * 10.0).round() / 10.0),
            None => Self::NoData,
        }
    }

    fn count(count: u64) -> Self {
        Self::Integer(i64::try_from(count).unwrap_or(i64::MAX))
    }

    /// Convert to a JSON value; `NoData` becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::NoData => serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:.1}"),
            Self::NoData => write!(f, "no data"),
        }
    }
}

/// One result row; cells line up with the entry's column schema.
pub type Row = Vec<Value>;

/// An ordered sequence of result rows with a stable column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names, fixed per query.
    pub columns: &'static [&'static str],
    /// Result rows, in ranking order.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Render the result as a JSON array of objects.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let cells = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| ((*column).to_string(), value.to_json()))
                    .collect::<serde_json::Map<String, serde_json::Value>>();
                serde_json::Value::Object(cells)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// Description of one parameter accepted by a catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Parameter name as passed by the caller.
    pub name: &'static str,
    /// Default value when omitted, if any.
    pub default: Option<&'static str>,
    /// What the parameter does.
    pub description: &'static str,
}

/// Metadata for one catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct QueryEntry {
    /// The entry name, as passed to [`Catalog::run`].
    pub name: &'static str,
    /// One-line description of the analysis.
    pub summary: &'static str,
    /// Column schema of the result rows.
    pub columns: &'static [&'static str],
    /// Accepted parameters. All entries also accept nothing.
    pub params: &'static [ParamSpec],
}

const FILTER_PARAMS: [ParamSpec; 7] = [
    ParamSpec {
        name: "airline",
        default: None,
        description: "restrict to flights of this airline id",
    },
    ParamSpec {
        name: "status",
        default: None,
        description: "restrict to flights with this status",
    },
    ParamSpec {
        name: "origin",
        default: None,
        description: "restrict to flights departing from this airport code",
    },
    ParamSpec {
        name: "destination",
        default: None,
        description: "restrict to flights arriving at this airport code",
    },
    ParamSpec {
        name: "model",
        default: None,
        description: "restrict to flights flown by aircraft of this model",
    },
    ParamSpec {
        name: "from",
        default: None,
        description: "start of the scheduled-departure range (inclusive)",
    },
    ParamSpec {
        name: "to",
        default: None,
        description: "end of the scheduled-departure range (inclusive)",
    },
];

macro_rules! entry_params {
    ($($extra:expr),*) => {
        &[
            $($extra,)*
            FILTER_PARAMS[0],
            FILTER_PARAMS[1],
            FILTER_PARAMS[2],
            FILTER_PARAMS[3],
            FILTER_PARAMS[4],
            FILTER_PARAMS[5],
            FILTER_PARAMS[6],
        ]
    };
}

const ENTRIES: [QueryEntry; 7] = [
    QueryEntry {
        name: "airline-delay-ranking",
        summary: "average departure delay per airline, worst first",
        columns: &["airline", "name", "flights", "avg_delay_min"],
        params: entry_params![ParamSpec {
            name: "limit",
            default: Some("(configured default limit)"),
            description: "maximum number of airlines returned",
        }],
    },
    QueryEntry {
        name: "top-aircraft-models",
        summary: "flight count per aircraft model, busiest first",
        columns: &["model", "flights"],
        params: entry_params![ParamSpec {
            name: "limit",
            default: Some("(configured default limit)"),
            description: "maximum number of models returned",
        }],
    },
    QueryEntry {
        name: "busy-aircraft",
        summary: "aircraft flying strictly more than a threshold of flights",
        columns: &["registration", "model", "airline", "flights"],
        params: entry_params![ParamSpec {
            name: "min-flights",
            default: Some("(configured busy threshold, 5)"),
            description: "strict lower bound on flight count",
        }],
    },
    QueryEntry {
        name: "airport-traffic",
        summary: "departures and arrivals per airport, busiest first",
        columns: &["airport", "name", "departures", "arrivals", "total"],
        params: entry_params![
            ParamSpec {
                name: "min-departures",
                default: None,
                description: "keep only airports with strictly more departures",
            },
            ParamSpec {
                name: "limit",
                default: Some("(configured default limit)"),
                description: "maximum number of airports returned",
            }
        ],
    },
    QueryEntry {
        name: "top-destinations",
        summary: "arriving-flight count per destination airport",
        columns: &["airport", "name", "arrivals"],
        params: entry_params![ParamSpec {
            name: "limit",
            default: Some("3"),
            description: "maximum number of destinations returned",
        }],
    },
    QueryEntry {
        name: "status-breakdown",
        summary: "flight count per status over the filtered set",
        columns: &["status", "flights"],
        params: entry_params![],
    },
    QueryEntry {
        name: "route-model-variety",
        summary: "city pairs served by strictly more than a threshold of aircraft models",
        columns: &["origin", "destination", "models", "flights"],
        params: entry_params![
            ParamSpec {
                name: "min-models",
                default: Some("2"),
                description: "strict lower bound on distinct aircraft models",
            },
            ParamSpec {
                name: "limit",
                default: Some("(configured default limit)"),
                description: "maximum number of routes returned",
            }
        ],
    },
];

/// Parameter map passed to [`Catalog::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Create an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The catalog of canned analytical queries.
#[derive(Debug, Clone)]
pub struct Catalog {
    scan_budget: usize,
    default_limit: usize,
    busy_threshold: u64,
}

impl Catalog {
    /// Create a catalog with explicit limits.
    #[must_use]
    pub const fn new(scan_budget: usize, default_limit: usize, busy_threshold: u64) -> Self {
        Self {
            scan_budget,
            default_limit,
            busy_threshold,
        }
    }

    /// Create a catalog from the application configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(
            config.query.scan_budget,
            config.query.default_limit,
            config.query.busy_flight_threshold,
        )
    }

    /// All catalog entries, for discovery and help output.
    #[must_use]
    pub const fn entries() -> &'static [QueryEntry] {
        &ENTRIES
    }

    /// Names of all catalog entries.
    #[must_use]
    pub fn known_names() -> Vec<&'static str> {
        ENTRIES.iter().map(|e| e.name).collect()
    }

    /// Run a catalog entry by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownQuery` for names outside the catalog,
    /// `InvalidParameter`/`InvalidFilterValue` for malformed parameters,
    /// and `QueryTooExpensive` when the scan budget is exceeded. On error
    /// no partial rows are returned.
    pub fn run(&self, store: &RecordStore, name: &str, params: &QueryParams) -> Result<QueryResult> {
        let entry = ENTRIES
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::unknown_query(name, &Self::known_names()))?;

        for supplied in params.names() {
            if !entry.params.iter().any(|p| p.name == supplied) {
                let accepted = entry
                    .params
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(Error::invalid_parameter(
                    entry.name,
                    supplied,
                    format!("unexpected parameter (accepted: {accepted})"),
                ));
            }
        }

        info!(query = entry.name, "running catalog query");
        let filter = build_filter(params)?;
        match entry.name {
            "airline-delay-ranking" => self.airline_delay_ranking(store, entry, &filter, params),
            "top-aircraft-models" => self.top_aircraft_models(store, entry, &filter, params),
            "busy-aircraft" => self.busy_aircraft(store, entry, &filter, params),
            "airport-traffic" => self.airport_traffic(store, entry, &filter, params),
            "top-destinations" => self.top_destinations(store, entry, &filter, params),
            "status-breakdown" => self.status_breakdown(store, entry, &filter),
            "route-model-variety" => self.route_model_variety(store, entry, &filter, params),
            _ => unreachable!("entry table and dispatch are maintained together"),
        }
    }

    fn airline_delay_ranking(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let limit = usize_param(entry.name, params, "limit", self.default_limit)?;
        let request = AggregationRequest {
            group_by: GroupKey::Airline,
            metric: Metric::AverageDelay,
            count_over: None,
            top_n: Some(limit),
        };
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| {
                let name = store
                    .airline(&g.key)
                    .map_or_else(|| g.key.clone(), |a| a.name.clone());
                vec![
                    Value::Text(g.key),
                    Value::Text(name),
                    Value::count(g.count),
                    Value::average(g.mean_delay),
                ]
            })
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn top_aircraft_models(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let limit = usize_param(entry.name, params, "limit", self.default_limit)?;
        let request = AggregationRequest {
            group_by: GroupKey::AircraftModel,
            metric: Metric::Count,
            count_over: None,
            top_n: Some(limit),
        };
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| vec![Value::Text(g.key), Value::count(g.count)])
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn busy_aircraft(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let threshold = u64_param(entry.name, params, "min-flights", self.busy_threshold)?;
        let request = AggregationRequest {
            group_by: GroupKey::AircraftRegistration,
            metric: Metric::Count,
            count_over: Some(threshold),
            top_n: None,
        };
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| {
                let (model, airline) = store.aircraft(&g.key).map_or_else(
                    || (g.key.clone(), String::new()),
                    |plane| (plane.model.clone(), plane.airline_id.clone()),
                );
                vec![
                    Value::Text(g.key),
                    Value::Text(model),
                    Value::Text(airline),
                    Value::count(g.count),
                ]
            })
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn airport_traffic(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let limit = usize_param(entry.name, params, "limit", self.default_limit)?;
        let min_departures = match params.get("min-departures") {
            Some(_) => Some(u64_param(entry.name, params, "min-departures", 0)?),
            None => None,
        };

        let departures = aggregate(
            store,
            filter,
            &AggregationRequest::count_by(GroupKey::OriginAirport),
            self.scan_budget,
            entry.name,
        )?;
        let arrivals = aggregate(
            store,
            filter,
            &AggregationRequest::count_by(GroupKey::DestinationAirport),
            self.scan_budget,
            entry.name,
        )?;

        // Seed every known airport so ones with no matching flights still
        // report zero traffic instead of vanishing from the ranking.
        let mut traffic: BTreeMap<String, (u64, u64)> = store
            .airports()
            .map(|airport| (airport.code.clone(), (0, 0)))
            .collect();
        for g in departures {
            traffic.entry(g.key).or_default().0 = g.count;
        }
        for g in arrivals {
            traffic.entry(g.key).or_default().1 = g.count;
        }

        let mut entries: Vec<(String, u64, u64)> = traffic
            .into_iter()
            .filter(|&(_, (dep, _))| min_departures.map_or(true, |min| dep > min))
            .map(|(code, (dep, arr))| (code, dep, arr))
            .collect();
        entries.sort_by(|a, b| {
            (b.1 + b.2)
                .cmp(&(a.1 + a.2))
                .then_with(|| a.0.cmp(&b.0))
        });
        entries.truncate(limit);

        let rows = entries
            .into_iter()
            .map(|(code, dep, arr)| {
                let name = store
                    .airport(&code)
                    .map_or_else(|| code.clone(), |a| a.name.clone());
                vec![
                    Value::Text(code),
                    Value::Text(name),
                    Value::count(dep),
                    Value::count(arr),
                    Value::count(dep + arr),
                ]
            })
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn top_destinations(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let limit = usize_param(entry.name, params, "limit", 3)?;
        let request = AggregationRequest {
            group_by: GroupKey::DestinationAirport,
            metric: Metric::Count,
            count_over: None,
            top_n: Some(limit),
        };
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| {
                let name = store
                    .airport(&g.key)
                    .map_or_else(|| g.key.clone(), |a| a.name.clone());
                vec![Value::Text(g.key), Value::Text(name), Value::count(g.count)]
            })
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn route_model_variety(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
        params: &QueryParams,
    ) -> Result<QueryResult> {
        let threshold = u64_param(entry.name, params, "min-models", 2)?;
        let limit = usize_param(entry.name, params, "limit", self.default_limit)?;
        let request = AggregationRequest {
            group_by: GroupKey::Route,
            metric: Metric::DistinctModels,
            count_over: Some(threshold),
            top_n: Some(limit),
        };
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| {
                let (origin, destination) = g
                    .key
                    .split_once(ROUTE_SEPARATOR)
                    .map_or((g.key.as_str(), ""), |(origin, destination)| {
                        (origin, destination)
                    });
                vec![
                    Value::Text(origin.to_string()),
                    Value::Text(destination.to_string()),
                    Value::count(g.distinct_models.unwrap_or(0)),
                    Value::count(g.count),
                ]
            })
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }

    fn status_breakdown(
        &self,
        store: &RecordStore,
        entry: &QueryEntry,
        filter: &FilterSpec,
    ) -> Result<QueryResult> {
        let request = AggregationRequest::count_by(GroupKey::Status);
        let groups = aggregate(store, filter, &request, self.scan_budget, entry.name)?;
        let rows = groups
            .into_iter()
            .map(|g| vec![Value::Text(g.key), Value::count(g.count)])
            .collect();
        Ok(QueryResult {
            columns: entry.columns,
            rows,
        })
    }
}

/// Build the shared filter specification from query parameters.
fn build_filter(params: &QueryParams) -> Result<FilterSpec> {
    let mut spec = FilterSpec::default();
    if let Some(airline) = params.get("airline") {
        spec.airline = Some(airline.to_string());
    }
    if let Some(status) = params.get("status") {
        spec.status = Some(filter::parse_status(status)?);
    }
    if let Some(origin) = params.get("origin") {
        spec.origin = Some(origin.to_string());
    }
    if let Some(destination) = params.get("destination") {
        spec.destination = Some(destination.to_string());
    }
    if let Some(model) = params.get("model") {
        spec.aircraft_model = Some(model.to_string());
    }
    let from = params
        .get("from")
        .map(|raw| filter::parse_range_start("from", raw))
        .transpose()?;
    let to = params
        .get("to")
        .map(|raw| filter::parse_range_end("to", raw))
        .transpose()?;
    if from.is_some() || to.is_some() {
        spec.set_departure_range(
            from.unwrap_or(DateTime::<Utc>::MIN_UTC),
            to.unwrap_or(DateTime::<Utc>::MAX_UTC),
        )?;
    }
    Ok(spec)
}

fn usize_param(query: &str, params: &QueryParams, name: &str, default: usize) -> Result<usize> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            Error::invalid_parameter(query, name, format!("'{raw}' is not a non-negative integer"))
        }),
    }
}

fn u64_param(query: &str, params: &QueryParams, name: &str, default: u64) -> Result<u64> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            Error::invalid_parameter(query, name, format!("'{raw}' is not a non-negative integer"))
        }),
    }
}
