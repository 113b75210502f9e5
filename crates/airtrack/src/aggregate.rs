//! Aggregation engine for airtrack.
//!
//! Takes a filtered sequence of flights and an [`AggregationRequest`] and
//! produces grouped results: counts, average delays, top-N rankings, and
//! threshold filters over freshly computed aggregates. Averages are kept
//! unrounded here; display rounding happens in row rendering so ranking
//! never inherits tie artifacts from rounding.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::model::Flight;
use crate::store::RecordStore;

/// The key flights are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    /// Group by operating airline id.
    Airline,
    /// Group by flight status.
    Status,
    /// Group by origin airport code.
    OriginAirport,
    /// Group by destination airport code.
    DestinationAirport,
    /// Group by aircraft model designation.
    AircraftModel,
    /// Group by aircraft tail registration.
    AircraftRegistration,
    /// Group by origin/destination pair.
    Route,
}

/// Separator between the two airport codes in a [`GroupKey::Route`] value.
pub const ROUTE_SEPARATOR: &str = "->";

impl GroupKey {
    /// All group keys, in display order.
    pub const ALL: [Self; 7] = [
        Self::Airline,
        Self::Status,
        Self::OriginAirport,
        Self::DestinationAirport,
        Self::AircraftModel,
        Self::AircraftRegistration,
        Self::Route,
    ];

    /// The canonical label for this group key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Airline => "airline",
            Self::Status => "status",
            Self::OriginAirport => "origin-airport",
            Self::DestinationAirport => "destination-airport",
            Self::AircraftModel => "aircraft-model",
            Self::AircraftRegistration => "aircraft-registration",
            Self::Route => "route",
        }
    }

    /// Parse a group key label.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAggregationSpec` for labels outside the enum.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == raw)
            .ok_or_else(|| {
                let domain = Self::ALL.map(Self::as_str).join(", ");
                Error::invalid_aggregation_spec("group-by", raw, format!("one of: {domain}"))
            })
    }

    /// Extract the group key value for a flight.
    fn value_for(self, store: &RecordStore, flight: &Flight) -> String {
        match self {
            Self::Airline => flight.airline_id.clone(),
            Self::Status => flight.status.as_str().to_string(),
            Self::OriginAirport => flight.origin.clone(),
            Self::DestinationAirport => flight.destination.clone(),
            // The aircraft reference cannot dangle after a validated load;
            // fall back to the registration rather than panic regardless.
            Self::AircraftModel => store
                .aircraft(&flight.aircraft_registration)
                .map_or_else(|| flight.aircraft_registration.clone(), |p| p.model.clone()),
            Self::AircraftRegistration => flight.aircraft_registration.clone(),
            Self::Route => format!(
                "{}{ROUTE_SEPARATOR}{}",
                flight.origin, flight.destination
            ),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ranking metric computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Number of flights in the group.
    Count,
    /// Mean departure delay over flights with a defined delay.
    AverageDelay,
    /// Number of distinct aircraft models flown within the group.
    DistinctModels,
}

impl Metric {
    /// The canonical label for this metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::AverageDelay => "average-delay",
            Self::DistinctModels => "distinct-models",
        }
    }

    /// Parse a metric label.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAggregationSpec` for labels outside the enum.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "count" => Ok(Self::Count),
            "average-delay" => Ok(Self::AverageDelay),
            "distinct-models" => Ok(Self::DistinctModels),
            _ => Err(Error::invalid_aggregation_spec(
                "metric",
                raw,
                "one of: count, average-delay, distinct-models",
            )),
        }
    }
}

/// A grouped aggregation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequest {
    /// How flights are grouped.
    pub group_by: GroupKey,
    /// The ranking metric.
    pub metric: Metric,
    /// Keep only groups whose flight count is strictly greater than this.
    ///
    /// Applied to the freshly computed count aggregate, never to raw
    /// flights, so the threshold always reflects the current filter. Under
    /// the distinct-models metric the threshold applies to the distinct
    /// model count instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_over: Option<u64>,
    /// Keep only the first N groups after ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
}

impl AggregationRequest {
    /// A plain count aggregation over the given group key.
    #[must_use]
    pub const fn count_by(group_by: GroupKey) -> Self {
        Self {
            group_by,
            metric: Metric::Count,
            count_over: None,
            top_n: None,
        }
    }
}

/// One group in an aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    /// The group key value (airline id, airport code, model, ...).
    pub key: String,
    /// Number of flights in the group.
    pub count: u64,
    /// Mean departure delay in minutes, unrounded.
    ///
    /// `None` when no flight in the group has a defined delay; a group
    /// of undefined delays reports "no data", never a numeric zero.
    pub mean_delay: Option<f64>,
    /// Number of distinct aircraft models in the group.
    ///
    /// Tracked only when the distinct-models metric is requested; `None`
    /// otherwise.
    pub distinct_models: Option<u64>,
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    delay_sum: i64,
    delay_count: u64,
    models: BTreeSet<String>,
}

/// Run an aggregation over the flights selected by `filter`.
///
/// Every flight examined counts against `scan_budget` (0 = unlimited);
/// `query` names the catalog entry for error context. Results are ordered
/// descending by the unrounded metric with a stable ascending lexicographic
/// tie-break on the group key; groups whose average delay is undefined rank
/// after all defined groups.
///
/// # Errors
///
/// Returns `QueryTooExpensive` when the scan budget is exceeded.
pub fn aggregate(
    store: &RecordStore,
    filter: &FilterSpec,
    request: &AggregationRequest,
    scan_budget: usize,
    query: &str,
) -> Result<Vec<GroupRow>> {
    let mut scanned = 0usize;
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();

    for flight in filter.candidates(store) {
        scanned += 1;
        if scan_budget > 0 && scanned > scan_budget {
            return Err(Error::too_expensive(query, scanned, scan_budget));
        }
        if !filter.matches(store, flight) {
            continue;
        }
        let key = request.group_by.value_for(store, flight);
        let acc = groups.entry(key).or_default();
        acc.count += 1;
        if let Some(delay) = flight.departure_delay_minutes() {
            acc.delay_sum += delay;
            acc.delay_count += 1;
        }
        if request.metric == Metric::DistinctModels {
            acc.models
                .insert(GroupKey::AircraftModel.value_for(store, flight));
        }
    }

    debug!(query, scanned, groups = groups.len(), "aggregation scan done");

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, acc)| {
            #[allow(clippy::cast_precision_loss)]
            let mean_delay =
                (acc.delay_count > 0).then(|| acc.delay_sum as f64 / acc.delay_count as f64);
            let distinct_models = (request.metric == Metric::DistinctModels)
                .then(|| u64::try_from(acc.models.len()).unwrap_or(u64::MAX));
            GroupRow {
                key,
                count: acc.count,
                mean_delay,
                distinct_models,
            }
        })
        .collect();

    if let Some(threshold) = request.count_over {
        rows.retain(|row| match request.metric {
            Metric::DistinctModels => row.distinct_models.unwrap_or(0) > threshold,
            Metric::Count | Metric::AverageDelay => row.count > threshold,
        });
    }

    rows.sort_by(|a, b| match request.metric {
        Metric::Count => b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)),
        Metric::AverageDelay => match (a.mean_delay, b.mean_delay) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.key.cmp(&b.key)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.key.cmp(&b.key),
        },
        Metric::DistinctModels => b
            .distinct_models
            .unwrap_or(0)
            .cmp(&a.distinct_models.unwrap_or(0))
            .then_with(|| a.key.cmp(&b.key)),
    });

    if let Some(n) = request.top_n {
        rows.truncate(n);
    }

    Ok(rows)
}
