//! Consumption records, the fetch dispatch, and the guarded result state.
//!
//! A session triggers [`ConsumptionFetcher::fetch_for_role`] whenever the
//! resolved role or name inputs change. Both product streams are fetched
//! concurrently; each stream's outcome is applied to [`ConsumptionState`]
//! independently, through a generation check that drops results from
//! superseded fetches.

use crate::error::Result;
use crate::relay::{RegionScope, Relay, RelayTarget};
use crate::roles::{ManagedNameSet, Role};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The two billed product lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Subscription,
    Marketplace,
}

impl Stream {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Marketplace => "marketplace",
        }
    }

    /// Both streams, in dispatch order.
    #[must_use]
    pub fn all() -> [Stream; 2] {
        [Self::Subscription, Self::Marketplace]
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fiscal-year month keys, April through March, as they appear on the wire.
pub const FISCAL_MONTHS: [&str; 12] = [
    "april", "may", "june", "july", "aug", "sep", "oct", "nov", "dec", "jan", "feb", "march",
];

// Backend rows carry explicit nulls for months with no usage.
fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// One row of billing data for one customer.
///
/// Owned by whichever view fetched it; never mutated after fetch, replaced
/// wholesale by the next fetch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    #[serde(default)]
    pub sno: u32,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub account_manager: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub enrollment_number: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub markup: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub april: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub may: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub june: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub july: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub aug: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sep: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub oct: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub nov: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub dec: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub jan: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub feb: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub march: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: f64,
}

impl ConsumptionRecord {
    /// Consumption for a fiscal month index (0 = April, 11 = March).
    ///
    /// Out-of-range indices read as zero.
    #[must_use]
    pub fn month(&self, index: usize) -> f64 {
        match index {
            0 => self.april,
            1 => self.may,
            2 => self.june,
            3 => self.july,
            4 => self.aug,
            5 => self.sep,
            6 => self.oct,
            7 => self.nov,
            8 => self.dec,
            9 => self.jan,
            10 => self.feb,
            11 => self.march,
            _ => 0.0,
        }
    }

    /// Consumption for a wire-format month key, if the key is known.
    #[must_use]
    pub fn month_named(&self, name: &str) -> Option<f64> {
        FISCAL_MONTHS
            .iter()
            .position(|m| *m == name)
            .map(|i| self.month(i))
    }

    /// Sum of an inclusive fiscal-month index range.
    #[must_use]
    pub fn range_total(&self, start: usize, end: usize) -> f64 {
        if start > end {
            return 0.0;
        }
        (start..=end.min(11)).map(|i| self.month(i)).sum()
    }
}

/// The fetched rows for both streams, guarded by a fetch generation.
///
/// `begin_fetch` bumps the generation; `apply` only lands rows whose
/// generation is still current, so a slow, superseded fetch can never
/// overwrite a newer one. A failed or stale fetch leaves the previous rows
/// in place.
#[derive(Debug, Default)]
pub struct ConsumptionState {
    generation: AtomicU64,
    subscription: RwLock<Vec<ConsumptionRecord>>,
    marketplace: RwLock<Vec<ConsumptionRecord>>,
}

impl ConsumptionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, invalidating any still-pending older fetch.
    pub fn begin_fetch(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current fetch generation.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Apply fetched rows if `generation` is still current.
    ///
    /// Returns whether the rows were applied.
    pub async fn apply(
        &self,
        generation: u64,
        stream: Stream,
        rows: Vec<ConsumptionRecord>,
    ) -> bool {
        if self.current_generation() != generation {
            tracing::debug!(
                target: "consumption.state",
                %stream,
                generation,
                current = self.current_generation(),
                "dropping stale fetch result"
            );
            return false;
        }
        let mut slot = match stream {
            Stream::Subscription => self.subscription.write().await,
            Stream::Marketplace => self.marketplace.write().await,
        };
        *slot = rows;
        true
    }

    /// Snapshot of the current rows for one stream.
    pub async fn rows(&self, stream: Stream) -> Vec<ConsumptionRecord> {
        match stream {
            Stream::Subscription => self.subscription.read().await.clone(),
            Stream::Marketplace => self.marketplace.read().await.clone(),
        }
    }
}

/// Role-parameterized dispatch onto the relay.
#[derive(Clone)]
pub struct ConsumptionFetcher {
    relay: Arc<dyn Relay>,
    state: Arc<ConsumptionState>,
}

impl ConsumptionFetcher {
    #[must_use]
    pub fn new(relay: Arc<dyn Relay>, state: Arc<ConsumptionState>) -> Self {
        Self { relay, state }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<ConsumptionState> {
        &self.state
    }

    /// Fetch both streams for the given role and apply whatever arrives.
    ///
    /// The two requests race independently; a failure on one stream is
    /// logged and leaves that stream's previous rows untouched. There is no
    /// retry; the next input change issues the next fetch.
    pub async fn fetch_for_role(&self, role: Role, name: &str, managed: &ManagedNameSet) {
        let generation = self.state.begin_fetch();
        let (subscription, marketplace) = tokio::join!(
            self.fetch_stream(Stream::Subscription, role, name, managed),
            self.fetch_stream(Stream::Marketplace, role, name, managed),
        );

        for (stream, outcome) in [
            (Stream::Subscription, subscription),
            (Stream::Marketplace, marketplace),
        ] {
            match outcome {
                Ok(rows) => {
                    self.state.apply(generation, stream, rows).await;
                }
                Err(error) => {
                    tracing::error!(
                        target: "consumption.fetch",
                        %stream,
                        role = %role,
                        %error,
                        "stream fetch failed; keeping previous rows"
                    );
                }
            }
        }
    }

    async fn fetch_stream(
        &self,
        stream: Stream,
        role: Role,
        name: &str,
        managed: &ManagedNameSet,
    ) -> Result<Vec<ConsumptionRecord>> {
        // Manager must win over the individual-contributor fallback.
        let (target, data) = match role {
            Role::Manager => (
                RelayTarget::ByManager(stream),
                Some(json!({ "names": managed.names() })),
            ),
            Role::RegionalAdminEast => (
                RelayTarget::Regional {
                    stream,
                    scope: RegionScope::East,
                },
                None,
            ),
            Role::RegionalAdminWest => (
                RelayTarget::Regional {
                    stream,
                    scope: RegionScope::West,
                },
                None,
            ),
            Role::GlobalAdmin => (RelayTarget::FetchAll(stream), None),
            Role::IndividualContributor => (
                RelayTarget::ByIndividual {
                    stream,
                    name: name.to_string(),
                },
                None,
            ),
        };

        let response = self.relay.invoke(target, data).await?;
        Ok(serde_json::from_value(response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(april: f64, may: f64) -> ConsumptionRecord {
        ConsumptionRecord {
            april,
            may,
            ..Default::default()
        }
    }

    #[test]
    fn records_tolerate_null_months() {
        let record: ConsumptionRecord = serde_json::from_str(
            r#"{
                "customer_name": "Acme",
                "region": "North",
                "account_manager": "Jane Doe",
                "enrollment_number": 88123,
                "april": 10.5,
                "may": null,
                "total": 10.5
            }"#,
        )
        .unwrap();
        assert_eq!(record.april, 10.5);
        assert_eq!(record.may, 0.0);
        assert_eq!(record.month_named("april"), Some(10.5));
        assert_eq!(record.month_named("smarch"), None);
    }

    #[test]
    fn range_total_is_inclusive_and_clamped() {
        let record = record_with(1.0, 2.0);
        assert_eq!(record.range_total(0, 0), 1.0);
        assert_eq!(record.range_total(0, 1), 3.0);
        assert_eq!(record.range_total(0, 40), 3.0);
        assert_eq!(record.range_total(5, 1), 0.0);
    }

    #[tokio::test]
    async fn stale_generation_does_not_overwrite() {
        let state = ConsumptionState::new();

        let older = state.begin_fetch();
        let newer = state.begin_fetch();

        assert!(
            state
                .apply(newer, Stream::Subscription, vec![record_with(9.0, 0.0)])
                .await
        );
        assert!(
            !state
                .apply(older, Stream::Subscription, vec![record_with(1.0, 0.0)])
                .await
        );

        let rows = state.rows(Stream::Subscription).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].april, 9.0);
    }

    #[tokio::test]
    async fn streams_are_independent() {
        let state = ConsumptionState::new();
        let generation = state.begin_fetch();

        assert!(
            state
                .apply(generation, Stream::Marketplace, vec![record_with(4.0, 0.0)])
                .await
        );
        assert!(state.rows(Stream::Subscription).await.is_empty());
        assert_eq!(state.rows(Stream::Marketplace).await.len(), 1);
    }
}
