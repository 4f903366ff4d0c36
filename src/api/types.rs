use serde::de::Error as DeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier of one submitted query.
/// Wrapper around a UUID string so ids stay opaque and collision-resistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier a worker receives at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Priority carried on a query.
///
/// Reserved metadata in this revision: it travels with the job but the
/// dispatcher hands out work strictly first come, first served.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOW: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(10);
    pub const HIGH: Priority = Priority(20);
}

/// Lifecycle state of a job.
///
/// The proxy only ever sets `Pending` and `Running`; the terminal states
/// belong to the worker's return payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Scalar query parameter.
///
/// The accepted set is deliberately closed: integers, floats, strings,
/// booleans and null. Arrays and objects fail deserialization and are
/// rejected at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A query submission from a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub user_id: String,
    pub query: String,
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub disable_profiling: bool,
}

/// One query travelling from the submit handler to a worker.
///
/// Created and owned by the submit handler; the dispatcher hands a clone
/// to exactly one worker mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub user_id: String,
    pub query: String,
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
    #[serde(default)]
    pub priority: Priority,
    pub status: JobStatus,
    #[serde(default)]
    pub disable_profiling: bool,
    /// Epoch millis at submission.
    pub created_at: u64,
    /// Epoch millis when a worker accepted the job; 0 until then.
    #[serde(default)]
    pub dispatched_at: u64,
    pub updated_at: u64,
}

impl Job {
    pub fn from_request(req: QueryRequest) -> Self {
        let now = now_ms();
        Self {
            id: JobId::new(),
            user_id: req.user_id,
            query: req.query,
            params: req.params,
            priority: req.priority,
            status: JobStatus::Pending,
            disable_profiling: req.disable_profiling,
            created_at: now,
            dispatched_at: 0,
            updated_at: now,
        }
    }
}

/// Declared type and nullability of one result column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub nullable: bool,
}

/// One result column decoded into its declared type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ColumnData {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Text(Vec<String>),
    Bool(Vec<bool>),
}

impl ColumnData {
    /// Decodes a raw JSON column according to its declared type name.
    fn decode(type_name: &str, raw: serde_json::Value) -> Result<Self, String> {
        let typed = match type_name {
            "INTEGER" => serde_json::from_value(raw).map(Self::Int32),
            "BIGINT" => serde_json::from_value(raw).map(Self::Int64),
            "REAL" | "FLOAT" => serde_json::from_value(raw).map(Self::Float32),
            "DOUBLE" | "FLOAT8" => serde_json::from_value(raw).map(Self::Float64),
            "TEXT" | "VARCHAR" => serde_json::from_value(raw).map(Self::Text),
            "BOOLEAN" => serde_json::from_value(raw).map(Self::Bool),
            other => return Err(format!("unsupported column type: {other}")),
        };
        typed.map_err(|e| format!("column of type {type_name} did not decode: {e}"))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int32(col) => col.len(),
            Self::Int64(col) => col.len(),
            Self::Float32(col) => col.len(),
            Self::Float64(col) => col.len(),
            Self::Text(col) => col.len(),
            Self::Bool(col) => col.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Worker-observed timings attached to a result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerTimings {
    #[serde(default)]
    pub execute_ms: u64,
    #[serde(default)]
    pub query_ms: u64,
}

/// The outcome of one query's execution, posted back by a worker.
///
/// The dispatch core treats everything except `error` as opaque and only
/// re-projects it for the client. Column data is decoded into typed vectors
/// driven by the declared column types.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct JobResult {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_types: Vec<ColumnType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_data: Vec<ColumnData>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// Raw profile JSON emitted by the worker's engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<serde_json::Value>,
    #[serde(default)]
    pub timings: WorkerTimings,
}

/// Wire shape of [`JobResult`] before the columns are decoded.
#[derive(Deserialize)]
struct RawJobResult {
    #[serde(default)]
    column_names: Vec<String>,
    #[serde(default)]
    column_types: Vec<ColumnType>,
    #[serde(default)]
    column_data: Vec<serde_json::Value>,
    #[serde(default)]
    error: String,
    #[serde(default)]
    profile: Option<serde_json::Value>,
    #[serde(default)]
    timings: WorkerTimings,
}

impl<'de> Deserialize<'de> for JobResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawJobResult::deserialize(deserializer)?;

        if raw.column_data.len() != raw.column_types.len() {
            return Err(D::Error::custom(format!(
                "{} column types declared but {} data columns present",
                raw.column_types.len(),
                raw.column_data.len()
            )));
        }

        let mut column_data = Vec::with_capacity(raw.column_types.len());
        for (column_type, value) in raw.column_types.iter().zip(raw.column_data) {
            let column =
                ColumnData::decode(&column_type.type_name, value).map_err(D::Error::custom)?;
            column_data.push(column);
        }

        Ok(Self {
            column_names: raw.column_names,
            column_types: raw.column_types,
            column_data,
            error: raw.error,
            profile: raw.profile,
            timings: raw.timings,
        })
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
