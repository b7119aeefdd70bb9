use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

pub const METRIC_NAME_LABEL: &str = "__name__";
pub const HOST_LABEL: &str = "host";
pub const INSTANCE_LABEL: &str = "instance";

/// One series returned by a query: its metric name, remaining labels and latest value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    /// The `__name__` label. Absent for series produced by expressions that drop the name.
    pub name: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub value: Option<SampleValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleValue {
    pub timestamp: DateTime<Utc>,
    pub value: String,
}

impl MetricSample {
    pub fn new(metric: BTreeMap<String, String>, value: Option<SampleValue>) -> Self {
        let mut labels = metric;
        let name = labels.remove(METRIC_NAME_LABEL);
        Self { name, labels, value }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn host(&self) -> Option<&str> {
        self.label(HOST_LABEL)
    }

    /// The host portion of the `instance` label, i.e., without the `:port` suffix.
    pub fn instance_host(&self) -> Option<&str> {
        self.label(INSTANCE_LABEL)
            .and_then(|instance| instance.split(':').next())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub(crate) enum QueryData {
    Vector(Vec<VectorSeries>),
    Matrix(Vec<MatrixSeries>),
    Scalar(WireValue),
    String(WireValue),
}

impl QueryData {
    pub const fn result_type(&self) -> &'static str {
        match self {
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
            Self::Scalar(_) => "scalar",
            Self::String(_) => "string",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VectorSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: WireValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatrixSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<WireValue>,
}

/// `[<unix seconds>, "<value>"]`
#[derive(Debug, Deserialize)]
pub(crate) struct WireValue(pub f64, pub String);

impl WireValue {
    pub fn into_sample_value(self) -> Option<SampleValue> {
        let secs = self.0.trunc() as i64;
        let nanos = (self.0.fract() * 1_000_000_000_f64).round() as u32;
        Utc.timestamp_opt(secs, nanos)
            .single()
            .map(|timestamp| SampleValue { timestamp, value: self.1 })
    }
}

impl From<VectorSeries> for MetricSample {
    fn from(series: VectorSeries) -> Self {
        Self::new(series.metric, series.value.into_sample_value())
    }
}

impl From<MatrixSeries> for MetricSample {
    fn from(series: MatrixSeries) -> Self {
        let latest = series.values.into_iter().last().and_then(WireValue::into_sample_value);
        Self::new(series.metric, latest)
    }
}
