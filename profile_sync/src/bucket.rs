//! bucket.rs: discrete UI labels for continuous profile numbers
//!
//! The UI never shows raw counts for experience or students; it shows a small
//! set of named ranges. Each [`BucketTable`] is one ordered list of
//! `(label, inclusive upper bound, representative value)` and is the only place
//! either direction is defined:
//! - value → label: first bucket whose upper bound is `>= value` (the last bucket is open)
//! - label → value: the bucket's representative value
//!
//! Representatives always fall inside their own bucket, so
//! `label_for(value_for(label)) == label` for every label.

/// One named range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Label shown in the UI and stored in the aggregate.
    pub label: &'static str,
    /// Inclusive upper bound; `None` for the open-ended last bucket.
    pub upper: Option<i32>,
    /// Integer written back when the UI selects this bucket.
    pub representative: i32,
}

/// Ordered, bidirectional label table.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable {
    buckets: &'static [Bucket],
}

impl BucketTable {
    /// Wrap an ordered bucket list (ascending upper bounds, open bucket last).
    pub const fn new(buckets: &'static [Bucket]) -> Self {
        Self { buckets }
    }

    /// All buckets in order.
    pub fn buckets(&self) -> &'static [Bucket] {
        self.buckets
    }

    /// Label for a stored value. Values below the first bound fall in the first bucket.
    pub fn label_for(&self, value: i32) -> &'static str {
        self.buckets
            .iter()
            .find(|b| b.upper.is_none_or(|upper| value <= upper))
            .or(self.buckets.last())
            .map(|b| b.label)
            .unwrap_or("")
    }

    /// Representative value for a label; `None` for empty or unknown labels.
    pub fn value_for(&self, label: &str) -> Option<i32> {
        let label = label.trim();
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.representative)
    }

    /// `label_for` lifted over an optional stored value; absent maps to `""`.
    pub fn label_for_opt(&self, value: Option<i32>) -> String {
        value.map(|v| self.label_for(v).to_string()).unwrap_or_default()
    }
}

/// Years of experience.
pub const EXPERIENCE_YEARS: BucketTable = BucketTable::new(&[
    Bucket { label: "under-1", upper: Some(0), representative: 0 },
    Bucket { label: "1-2", upper: Some(2), representative: 2 },
    Bucket { label: "3-5", upper: Some(5), representative: 5 },
    Bucket { label: "6-10", upper: Some(10), representative: 10 },
    Bucket { label: "over-10", upper: None, representative: 15 },
]);

/// Total students coached.
pub const TOTAL_STUDENTS: BucketTable = BucketTable::new(&[
    Bucket { label: "up-to-5", upper: Some(5), representative: 5 },
    Bucket { label: "6-20", upper: Some(20), representative: 20 },
    Bucket { label: "21-50", upper: Some(50), representative: 50 },
    Bucket { label: "51-100", upper: Some(100), representative: 100 },
    Bucket { label: "101-200", upper: Some(200), representative: 200 },
    Bucket { label: "over-200", upper: None, representative: 250 },
]);

const RESPONSE_TIME_SUFFIX: &str = "-hours";

/// Response time label, `"{n}-hours"`.
pub fn response_time_label(hours: Option<i32>) -> String {
    hours
        .map(|h| format!("{h}{RESPONSE_TIME_SUFFIX}"))
        .unwrap_or_default()
}

/// Parse a `"{n}-hours"` label back into hours.
pub fn response_time_hours(label: &str) -> Option<i32> {
    label
        .trim()
        .strip_suffix(RESPONSE_TIME_SUFFIX)
        .and_then(|n| n.trim().parse::<i32>().ok())
}
