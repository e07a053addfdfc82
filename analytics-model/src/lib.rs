//! Shared models for the analytics reader crates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two backing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    Items,
    Counters,
}

impl Source {
    pub fn table(self) -> &'static str {
        match self {
            Source::Items => "items",
            Source::Counters => "counters",
        }
    }
}

/// Which table(s) a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceSelector {
    Items,
    Counters,
    Both,
}

impl SourceSelector {
    pub fn includes(self, source: Source) -> bool {
        match self {
            SourceSelector::Items => source == Source::Items,
            SourceSelector::Counters => source == Source::Counters,
            SourceSelector::Both => true,
        }
    }

    /// Selected tables, always in items-then-counters order.
    pub fn sources(self) -> &'static [Source] {
        match self {
            SourceSelector::Items => &[Source::Items],
            SourceSelector::Counters => &[Source::Counters],
            SourceSelector::Both => &[Source::Items, Source::Counters],
        }
    }
}

/// How compiled predicates are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    All,
    Any,
}

impl MatchMode {
    pub fn separator(self) -> &'static str {
        match self {
            MatchMode::All => " AND ",
            MatchMode::Any => " OR ",
        }
    }
}

/// A filterable field; each maps 1:1 to a fixed column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryField {
    Title,
    DateTime,
    DeviceId,
    Platform,
    AppName,
    AppVersion,
    SystemVersion,
}

impl QueryField {
    pub fn column(self) -> &'static str {
        match self {
            QueryField::Title => "description",
            QueryField::DateTime => "timestamp",
            QueryField::DeviceId => "device_id",
            QueryField::Platform => "platform",
            QueryField::AppName => "app_name",
            QueryField::AppVersion => "app_version",
            QueryField::SystemVersion => "system_version",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            QueryField::Title | QueryField::DeviceId | QueryField::Platform | QueryField::AppName => {
                ValueKind::Text
            }
            QueryField::AppVersion | QueryField::SystemVersion => ValueKind::Version,
            QueryField::DateTime => ValueKind::Date,
        }
    }
}

/// Value family a field belongs to; determines the comparison family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Version,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringOp {
    Equals,
    Contains,
    BeginsWith,
    EndsWith,
}

/// Version values compare as raw strings, not parsed numbers (legacy
/// behavior: `'10.0' < '2.0'` is true).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericOp {
    LessThan,
    LessOrEqual,
    Equals,
    GreaterThan,
    GreaterOrEqual,
}

/// Day-granularity comparisons against a full timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOp {
    Before,
    BeforeOrEqual,
    Same,
    After,
    AfterOrEqual,
}

/// Comparison operator, tagged by value family so a criterion can never
/// carry an operator from the wrong family without it being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Text(StringOp),
    Version(NumericOp),
    Date(DateOp),
}

impl Comparison {
    pub fn kind(self) -> ValueKind {
        match self {
            Comparison::Text(_) => ValueKind::Text,
            Comparison::Version(_) => ValueKind::Version,
            Comparison::Date(_) => ValueKind::Date,
        }
    }

    /// Default operator for a family, used when a criterion's field
    /// changes family and the operator must be re-derived.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Text => Comparison::Text(StringOp::Equals),
            ValueKind::Version => Comparison::Version(NumericOp::Equals),
            ValueKind::Date => Comparison::Date(DateOp::Same),
        }
    }
}

/// One user-specified filter condition.
///
/// Invariant: `comparison.kind() == field.kind()`. The constructors and
/// `with_field` maintain it; the predicate compiler re-checks it and
/// fails fast on a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriterion {
    pub field: QueryField,
    pub comparison: Comparison,
    pub value: String,
    /// Stable identity so a criterion can be replaced in place while
    /// the user edits it.
    pub id: Uuid,
}

impl FilterCriterion {
    /// Fresh criterion with the family-default operator and an empty value.
    pub fn new(field: QueryField) -> Self {
        Self {
            field,
            comparison: Comparison::default_for(field.kind()),
            value: String::new(),
            id: Uuid::new_v4(),
        }
    }

    pub fn text(field: QueryField, op: StringOp, value: impl Into<String>) -> Self {
        Self {
            field,
            comparison: Comparison::Text(op),
            value: value.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn version(field: QueryField, op: NumericOp, value: impl Into<String>) -> Self {
        Self {
            field,
            comparison: Comparison::Version(op),
            value: value.into(),
            id: Uuid::new_v4(),
        }
    }

    pub fn date(op: DateOp, value: NaiveDate) -> Self {
        Self {
            field: QueryField::DateTime,
            comparison: Comparison::Date(op),
            value: value.format("%Y-%m-%d").to_string(),
            id: Uuid::new_v4(),
        }
    }

    /// Same criterion targeting a different field. When the new field
    /// belongs to another family the operator is re-derived to that
    /// family's default, preserving the family invariant.
    pub fn with_field(&self, field: QueryField) -> Self {
        let comparison = if field.kind() == self.comparison.kind() {
            self.comparison
        } else {
            Comparison::default_for(field.kind())
        };
        Self {
            field,
            comparison,
            value: self.value.clone(),
            id: self.id,
        }
    }

    /// Criteria with blank values are ignored by searches.
    pub fn has_value(&self) -> bool {
        !self.value.trim().is_empty()
    }

    pub fn matches_family(&self) -> bool {
        self.comparison.kind() == self.field.kind()
    }
}

/// One decoded result row, tagged with its source table and primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRow {
    pub source: Source,
    pub id: i64,
    pub columns: BTreeMap<String, String>,
}

impl AnalyticsRow {
    /// Build a row from a column-keyed map as returned by the endpoint
    /// in dictionary mode. Only `items` rows carry a `details` column,
    /// so its presence tags the source. Null column values decode as
    /// "N/A"; an unparseable `id` decodes as 0 (legacy defaults).
    pub fn from_columns(columns: BTreeMap<String, Option<String>>) -> Self {
        let source = if columns.contains_key("details") {
            Source::Items
        } else {
            Source::Counters
        };
        let id = columns
            .get("id")
            .and_then(|v| v.as_deref())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|(k, v)| (k, v.unwrap_or_else(|| "N/A".to_string())))
            .collect();
        Self { source, id, columns }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

/// Persisted filter set: everything needed to re-run a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub criteria: Vec<FilterCriterion>,
    pub match_mode: MatchMode,
    pub sources: SourceSelector,
    pub is_limited: bool,
    pub page_limit: u64,
}
