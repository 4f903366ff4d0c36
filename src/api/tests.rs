//! Wire Type Tests
//!
//! Round-trip laws for the request vocabulary and the typed columnar
//! decode of worker results.

#[cfg(test)]
mod tests {
    use crate::api::results::QueryResults;
    use crate::api::types::{
        ColumnData, ColumnType, JobId, JobResult, ParamValue, Priority, QueryRequest,
        WorkerTimings,
    };
    use std::collections::HashMap;

    // ============================================================
    // TEST 1: QueryRequest round trip
    // ============================================================

    #[test]
    fn test_query_request_round_trip() {
        let mut params = HashMap::new();
        params.insert("count".to_string(), ParamValue::Int(2));
        params.insert("rate".to_string(), ParamValue::Float(0.5));
        params.insert("city".to_string(), ParamValue::Text("Las Palmas".to_string()));
        params.insert("flag".to_string(), ParamValue::Bool(true));
        params.insert("missing".to_string(), ParamValue::Null);

        let request = QueryRequest {
            user_id: "u1".to_string(),
            query: "SELECT $count".to_string(),
            params,
            priority: Priority::HIGH,
            disable_profiling: true,
        };

        let json = serde_json::to_string(&request).expect("serialization failed");
        let restored: QueryRequest = serde_json::from_str(&json).expect("deserialization failed");

        assert_eq!(request, restored);
    }

    #[test]
    fn test_query_request_optional_fields_default() {
        let restored: QueryRequest =
            serde_json::from_str(r#"{"user_id": "u1", "query": "SELECT 1"}"#)
                .expect("minimal body should parse");

        assert!(restored.params.is_empty());
        assert_eq!(restored.priority, Priority::LOW);
        assert!(!restored.disable_profiling);
    }

    #[test]
    fn test_query_request_requires_user_and_query() {
        assert!(serde_json::from_str::<QueryRequest>(r#"{"query": "SELECT 1"}"#).is_err());
        assert!(serde_json::from_str::<QueryRequest>(r#"{"user_id": "u1"}"#).is_err());
    }

    // ============================================================
    // TEST 2: ParamValue scalar boundary
    // ============================================================

    #[test]
    fn test_params_reject_non_scalar_values() {
        let nested_array = r#"{"user_id": "u1", "query": "q", "params": {"bad": [1, 2]}}"#;
        assert!(serde_json::from_str::<QueryRequest>(nested_array).is_err());

        let nested_object = r#"{"user_id": "u1", "query": "q", "params": {"bad": {"x": 1}}}"#;
        assert!(serde_json::from_str::<QueryRequest>(nested_object).is_err());
    }

    #[test]
    fn test_param_value_accepts_each_scalar() {
        let body = r#"{"a": 1, "b": 1.5, "c": "s", "d": false, "e": null}"#;
        let params: HashMap<String, ParamValue> =
            serde_json::from_str(body).expect("scalar params should parse");

        assert_eq!(params["a"], ParamValue::Int(1));
        assert_eq!(params["b"], ParamValue::Float(1.5));
        assert_eq!(params["c"], ParamValue::Text("s".to_string()));
        assert_eq!(params["d"], ParamValue::Bool(false));
        assert_eq!(params["e"], ParamValue::Null);
    }

    // ============================================================
    // TEST 3: JobResult typed column decode
    // ============================================================

    #[test]
    fn test_job_result_decodes_columns_by_declared_type() {
        let body = r#"{
            "column_names": ["a", "b", "c"],
            "column_types": [{"type":"BIGINT"}, {"type":"TEXT"}, {"type":"BOOLEAN"}, {"type":"FLOAT"}],
            "column_data": [
                [1, 2, 3],
                ["foo", "bar", "baz"],
                [true, false, true],
                [1.2, 3.4, 5.6]
            ]
        }"#;

        let result: JobResult = serde_json::from_str(body).expect("fixture should decode");

        assert_eq!(result.column_names, vec!["a", "b", "c"]);
        assert_eq!(result.column_data[0], ColumnData::Int64(vec![1, 2, 3]));
        assert_eq!(
            result.column_data[1],
            ColumnData::Text(vec!["foo".to_string(), "bar".to_string(), "baz".to_string()])
        );
        assert_eq!(result.column_data[2], ColumnData::Bool(vec![true, false, true]));
        assert_eq!(result.column_data[3], ColumnData::Float32(vec![1.2, 3.4, 5.6]));
    }

    #[test]
    fn test_job_result_rejects_unknown_column_type() {
        let body = r#"{"column_types": [{"type":"BLOB"}], "column_data": [[1]]}"#;
        let err = serde_json::from_str::<JobResult>(body).unwrap_err();
        assert!(err.to_string().contains("unsupported column type"));
    }

    #[test]
    fn test_job_result_rejects_mismatched_column_counts() {
        let body = r#"{"column_types": [{"type":"BIGINT"}], "column_data": []}"#;
        assert!(serde_json::from_str::<JobResult>(body).is_err());
    }

    #[test]
    fn test_job_result_error_only_payload() {
        let result: JobResult =
            serde_json::from_str(r#"{"error": "table not found"}"#).expect("error payload");

        assert_eq!(result.error, "table not found");
        assert!(result.column_names.is_empty());
        assert!(result.column_data.is_empty());
        assert!(result.profile.is_none());
    }

    #[test]
    fn test_job_result_round_trip() {
        let result = JobResult {
            column_names: vec!["n".to_string()],
            column_types: vec![ColumnType {
                type_name: "BIGINT".to_string(),
                nullable: false,
            }],
            column_data: vec![ColumnData::Int64(vec![42])],
            error: String::new(),
            profile: Some(serde_json::json!({"rows_returned": 1})),
            timings: WorkerTimings {
                execute_ms: 7,
                query_ms: 3,
            },
        };

        let json = serde_json::to_string(&result).expect("serialization failed");
        let restored: JobResult = serde_json::from_str(&json).expect("deserialization failed");

        assert_eq!(result, restored);
    }

    // ============================================================
    // TEST 4: Client projection
    // ============================================================

    #[test]
    fn test_query_results_fold_in_engine_profile() {
        let result = JobResult {
            column_names: vec!["n".to_string()],
            column_types: vec![ColumnType {
                type_name: "BIGINT".to_string(),
                nullable: false,
            }],
            column_data: vec![ColumnData::Int64(vec![1])],
            error: String::new(),
            profile: Some(serde_json::json!({
                "rows_returned": 1,
                "latency": 0.25,
                "cpu_time": 0.1,
                "total_bytes_read": 4096,
                "total_bytes_written": 0,
                "operator_tree": {"ignored": true}
            })),
            timings: WorkerTimings {
                execute_ms: 12,
                query_ms: 9,
            },
        };

        let results = QueryResults::from_result(result, 250).expect("projection should succeed");

        assert_eq!(results.profile.rows_returned, 1);
        assert_eq!(results.profile.total_bytes_read, 4096);
        assert_eq!(results.timings.execute_ms, 12);
        assert_eq!(results.timings.query_ms, 9);
        assert_eq!(results.timings.total_ms, 250);
    }

    #[test]
    fn test_query_results_error_payload_omits_columns() {
        let results = QueryResults::from_error("boom".to_string());
        let json = serde_json::to_value(&results).expect("serialization failed");

        assert_eq!(json["error"], "boom");
        assert!(json.get("column_names").is_none());
        assert!(json.get("column_data").is_none());
    }

    // ============================================================
    // TEST 5: Identifiers
    // ============================================================

    #[test]
    fn test_job_ids_are_unique() {
        let first = JobId::new();
        let second = JobId::new();
        assert_ne!(first.0, second.0);
    }
}
