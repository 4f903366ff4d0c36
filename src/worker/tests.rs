//! Worker Module Tests
//!
//! Covers the scalar engine's projection rules; the client round-trips are
//! exercised against a live router in the proxy scenario tests.

#[cfg(test)]
mod tests {
    use crate::api::results::ProfileStats;
    use crate::api::types::{ColumnData, Job, ParamValue, QueryRequest};
    use crate::worker::engine::{QueryEngine, ScalarEngine};
    use std::collections::HashMap;

    fn job_with_params(query: &str, params: HashMap<String, ParamValue>) -> Job {
        Job::from_request(QueryRequest {
            user_id: "test-user".to_string(),
            query: query.to_string(),
            params,
            priority: Default::default(),
            disable_profiling: false,
        })
    }

    fn job(query: &str) -> Job {
        job_with_params(query, HashMap::new())
    }

    // ============================================================
    // TEST 1: Literal projections
    // ============================================================

    #[test]
    fn test_select_single_integer() {
        let result = ScalarEngine.execute(&job("SELECT 1")).expect("execute");

        assert_eq!(result.column_names, vec!["1"]);
        assert_eq!(result.column_types[0].type_name, "BIGINT");
        assert_eq!(result.column_data[0], ColumnData::Int64(vec![1]));
        assert!(result.error.is_empty());
    }

    #[test]
    fn test_select_mixed_literals_with_aliases() {
        let result = ScalarEngine
            .execute(&job("SELECT 42 AS answer, 1.5 AS rate, 'ok' AS label, true AS flag;"))
            .expect("execute");

        assert_eq!(result.column_names, vec!["answer", "rate", "label", "flag"]);
        assert_eq!(result.column_data[0], ColumnData::Int64(vec![42]));
        assert_eq!(result.column_data[1], ColumnData::Float64(vec![1.5]));
        assert_eq!(result.column_data[2], ColumnData::Text(vec!["ok".to_string()]));
        assert_eq!(result.column_data[3], ColumnData::Bool(vec![true]));
    }

    #[test]
    fn test_select_lowercase_keyword() {
        let result = ScalarEngine.execute(&job("select 3")).expect("execute");
        assert_eq!(result.column_data[0], ColumnData::Int64(vec![3]));
    }

    // ============================================================
    // TEST 2: Parameter substitution
    // ============================================================

    #[test]
    fn test_parameter_substitution() {
        let mut params = HashMap::new();
        params.insert("pax_count".to_string(), ParamValue::Int(2));

        let result = ScalarEngine
            .execute(&job_with_params("SELECT $pax_count AS pax", params))
            .expect("execute");

        assert_eq!(result.column_names, vec!["pax"]);
        assert_eq!(result.column_data[0], ColumnData::Int64(vec![2]));
    }

    #[test]
    fn test_unknown_parameter_is_an_error() {
        let err = ScalarEngine.execute(&job("SELECT $missing")).unwrap_err();
        assert!(err.to_string().contains("unknown parameter"));
    }

    // ============================================================
    // TEST 3: Rejected statements
    // ============================================================

    #[test]
    fn test_non_select_statement_is_an_error() {
        let err = ScalarEngine.execute(&job("DROP TABLE t")).unwrap_err();
        assert!(err.to_string().contains("SELECT"));
    }

    #[test]
    fn test_unsupported_expression_is_an_error() {
        let err = ScalarEngine.execute(&job("SELECT a + b")).unwrap_err();
        assert!(err.to_string().contains("unsupported expression"));
    }

    // ============================================================
    // TEST 4: Profiling output
    // ============================================================

    #[test]
    fn test_profile_emitted_and_parseable() {
        let result = ScalarEngine.execute(&job("SELECT 1")).expect("execute");

        let raw = result.profile.expect("profiling enabled by default");
        let stats: ProfileStats = serde_json::from_value(raw).expect("profile parses");
        assert_eq!(stats.rows_returned, 1);
    }

    #[test]
    fn test_profile_suppressed_when_disabled() {
        let mut disabled = job("SELECT 1");
        disabled.disable_profiling = true;

        let result = ScalarEngine.execute(&disabled).expect("execute");
        assert!(result.profile.is_none());
    }
}
