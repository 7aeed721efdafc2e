use serde::{Deserialize, Serialize};

/// One row of the hourly (or per-day) traffic table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub period: String,
    pub received: u64,
    pub sent: u64,
}

/// A host, sender or recipient together with its message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedEntry {
    pub label: String,
    pub count: u64,
}

impl CountedEntry {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Whole-report totals. A `None` field was not present in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TotalKind {
    Received,
    Sent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub hourly: Vec<HourlyBucket>,
    pub hosts: Vec<CountedEntry>,
    pub senders: Vec<CountedEntry>,
    pub recipients: Vec<CountedEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
}

impl Report {
    /// Records a total, creating the totals record on first use.
    /// A later line for the same kind replaces the earlier value.
    pub fn record_total(&mut self, kind: TotalKind, value: u64) {
        let totals = self.totals.get_or_insert_with(Totals::default);
        match kind {
            TotalKind::Received => totals.received = Some(value),
            TotalKind::Sent => totals.sent = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hourly.is_empty()
            && self.hosts.is_empty()
            && self.senders.is_empty()
            && self.recipients.is_empty()
            && self.totals.is_none()
    }
}

/// A parsed report together with where its text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source: String,
    pub report: Report,
}
