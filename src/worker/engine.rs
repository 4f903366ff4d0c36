//! Query Engines
//!
//! The proxy treats workers as opaque executors; this module is the seam
//! where a real embedded analytical engine would sit. `ScalarEngine` is a
//! deliberately small stand-in: it evaluates literal projections of the
//! form `SELECT <expr>, <expr>, ...` with `$name` parameter substitution,
//! which is enough to exercise the dispatch path end to end.

use crate::api::types::{ColumnData, ColumnType, Job, JobResult, ParamValue, WorkerTimings};
use anyhow::{anyhow, Result};
use std::time::Instant;

/// Executes one job and produces its result payload.
///
/// Implementations report execution failures through `Err`; the worker
/// loop folds those into the result's `error` field before posting.
pub trait QueryEngine: Send + Sync + 'static {
    fn execute(&self, job: &Job) -> Result<JobResult>;
}

/// Literal-projection engine.
///
/// Supports `SELECT` over integer, float, single-quoted string, boolean
/// and `$param` expressions, with optional `AS` aliases. One row comes
/// back per query; every expression becomes its own column.
pub struct ScalarEngine;

impl ScalarEngine {
    fn eval(expr: &str, job: &Job) -> Result<ParamValue> {
        let expr = expr.trim();
        if let Some(name) = expr.strip_prefix('$') {
            return job
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("unknown parameter: {name}"));
        }
        if expr.eq_ignore_ascii_case("null") {
            return Ok(ParamValue::Null);
        }
        if expr.eq_ignore_ascii_case("true") {
            return Ok(ParamValue::Bool(true));
        }
        if expr.eq_ignore_ascii_case("false") {
            return Ok(ParamValue::Bool(false));
        }
        if let Some(text) = expr
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Ok(ParamValue::Text(text.to_string()));
        }
        if let Ok(value) = expr.parse::<i64>() {
            return Ok(ParamValue::Int(value));
        }
        if let Ok(value) = expr.parse::<f64>() {
            return Ok(ParamValue::Float(value));
        }
        Err(anyhow!("unsupported expression: {expr}"))
    }

    fn column(value: ParamValue) -> Result<(ColumnType, ColumnData)> {
        let (type_name, data) = match value {
            ParamValue::Int(v) => ("BIGINT", ColumnData::Int64(vec![v])),
            ParamValue::Float(v) => ("DOUBLE", ColumnData::Float64(vec![v])),
            ParamValue::Text(v) => ("VARCHAR", ColumnData::Text(vec![v])),
            ParamValue::Bool(v) => ("BOOLEAN", ColumnData::Bool(vec![v])),
            ParamValue::Null => return Err(anyhow!("cannot project an untyped NULL")),
        };
        Ok((
            ColumnType {
                type_name: type_name.to_string(),
                nullable: false,
            },
            data,
        ))
    }
}

impl QueryEngine for ScalarEngine {
    fn execute(&self, job: &Job) -> Result<JobResult> {
        let started = Instant::now();

        let statement = job.query.trim().trim_end_matches(';').trim();
        let projection = statement
            .strip_prefix("SELECT ")
            .or_else(|| statement.strip_prefix("select "))
            .ok_or_else(|| anyhow!("only literal SELECT projections are supported"))?;

        let mut column_names = Vec::new();
        let mut column_types = Vec::new();
        let mut column_data = Vec::new();

        for part in projection.split(',') {
            let part = part.trim();
            let (expr, name) = match part
                .split_once(" AS ")
                .or_else(|| part.split_once(" as "))
            {
                Some((expr, alias)) => (expr.trim(), alias.trim().to_string()),
                None => (part, part.to_string()),
            };

            let value = Self::eval(expr, job)?;
            let (column_type, data) = Self::column(value)?;
            column_names.push(name);
            column_types.push(column_type);
            column_data.push(data);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let profile = if job.disable_profiling {
            None
        } else {
            Some(serde_json::json!({
                "rows_returned": 1,
                "latency": elapsed_ms as f64 / 1000.0,
                "cpu_time": elapsed_ms as f64 / 1000.0,
                "total_bytes_read": 0,
                "total_bytes_written": 0,
            }))
        };

        Ok(JobResult {
            column_names,
            column_types,
            column_data,
            error: String::new(),
            profile,
            timings: WorkerTimings {
                execute_ms: 0,
                query_ms: elapsed_ms,
            },
        })
    }
}
