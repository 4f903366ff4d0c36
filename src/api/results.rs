use super::types::{ColumnData, ColumnType, JobResult};
use serde::{Deserialize, Serialize};

/// Profiling figures extracted from the engine's JSON profile output.
///
/// The engine writes a free-form profile document; only these fields are
/// lifted out for the client, everything else is ignored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileStats {
    #[serde(default)]
    pub total_bytes_written: i64,
    #[serde(default)]
    pub total_bytes_read: i64,
    #[serde(default)]
    pub rows_returned: i64,
    #[serde(default)]
    pub latency: f64,
    #[serde(default)]
    pub cpu_time: f64,
}

/// Timings observed around one query, as reported to the client.
///
/// `execute_ms` and `query_ms` come from the worker; `total_ms` is the
/// submit handler's own submission-to-result measurement.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryTimings {
    pub execute_ms: u64,
    pub query_ms: u64,
    pub total_ms: u64,
}

/// The payload returned to the submitting client: result columns plus
/// profiling and timing information.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResults {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_types: Vec<ColumnType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_data: Vec<ColumnData>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub profile: ProfileStats,
    pub timings: QueryTimings,
}

impl QueryResults {
    /// Projects a successful worker result into the client payload,
    /// parsing the engine profile when one was produced.
    pub fn from_result(result: JobResult, total_ms: u64) -> anyhow::Result<Self> {
        let profile = match &result.profile {
            Some(raw) => serde_json::from_value(raw.clone())?,
            None => ProfileStats::default(),
        };

        Ok(Self {
            column_names: result.column_names,
            column_types: result.column_types,
            column_data: result.column_data,
            error: String::new(),
            profile,
            timings: QueryTimings {
                execute_ms: result.timings.execute_ms,
                query_ms: result.timings.query_ms,
                total_ms,
            },
        })
    }

    /// An error-only payload for a failed execution.
    pub fn from_error(error: String) -> Self {
        Self {
            error,
            ..Self::default()
        }
    }
}
