//! The datasource adapter: resolves template variables in query text and
//! drives discovery (metric-find) calls through the execution channel.
//!
//! The channel is an injected seam. Errors it raises cross this layer
//! untouched; empty or short responses are a legitimate "no matches" outcome
//! and come back as an empty list.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::query::{DataQuery, MetricFindValue, QueryRequest, QueryResponse, METRIC_FIND_REF_ID};
use crate::template::{resolve_query_text, ScopedVars, TemplateResolver};

/// The opaque execution channel: accepts an envelope, returns frames or an
/// error. Connectivity, authentication and timeouts all live behind it.
pub trait ExecutionChannel {
    fn query(
        &self,
        request: QueryRequest,
    ) -> impl Future<Output = Result<QueryResponse>> + Send;
}

/// Health probe outcome, mirrored by the facade's `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

/// Probe statement issued by `check_health`. The remote store answers it with
/// a single-row timestamp if the connection is alive.
pub const HEALTH_PROBE_SQL: &str = "select current timestamp from sysibm.sysdummy1";

pub struct Datasource<C, R> {
    channel: C,
    resolver: R,
}

impl<C: ExecutionChannel, R: TemplateResolver> Datasource<C, R> {
    pub fn new(channel: C, resolver: R) -> Self {
        Datasource { channel, resolver }
    }

    /// Return a copy of `query` with its text fully resolved against `scope`.
    /// Absent text normalizes to the empty string; the input is untouched.
    pub fn apply_template_variables(&self, query: &DataQuery, scope: &ScopedVars) -> DataQuery {
        DataQuery {
            ref_id: query.ref_id.clone(),
            query_text: Some(resolve_query_text(
                &self.resolver,
                query.query_text.as_deref(),
                scope,
            )),
            hide: query.hide,
        }
    }

    /// Run a discovery query and flatten the first field of the first frame
    /// into ordered labels. `options` is accepted for forward compatibility
    /// and ignored.
    pub async fn metric_find(
        &self,
        query: &DataQuery,
        scope: &ScopedVars,
        _options: Option<Value>,
    ) -> Result<Vec<MetricFindValue>> {
        let text = resolve_query_text(&self.resolver, query.query_text.as_deref(), scope);
        let request = QueryRequest {
            targets: vec![DataQuery::new(METRIC_FIND_REF_ID, Some(text))],
        };
        debug!(target: "tabsource", "metric_find: submitting discovery envelope");

        let res = self.channel.query(request).await?;

        let field = match res.data.first().and_then(|frame| frame.first_field()) {
            Some(field) => field,
            // no frames, or a frame with no fields: valid "no matches"
            None => return Ok(Vec::new()),
        };
        Ok(field
            .values
            .iter()
            .map(|v| MetricFindValue { text: v.to_string() })
            .collect())
    }

    /// Probe the backing store through the channel and report ok/error.
    pub async fn check_health(&self) -> HealthStatus {
        let request = QueryRequest {
            targets: vec![DataQuery::new("health", Some(HEALTH_PROBE_SQL.to_string()))],
        };
        match self.channel.query(request).await {
            Ok(res) => {
                let detail = res
                    .data
                    .first()
                    .and_then(|f| f.first_field())
                    .and_then(|f| f.values.first())
                    .map(|v| v.to_string());
                let message = match detail {
                    Some(ts) => format!("Check successful; current timestamp = {}", ts),
                    None => "Check successful".to_string(),
                };
                HealthStatus { status: "ok".to_string(), message }
            }
            Err(e) => HealthStatus { status: "error".to_string(), message: e.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::frame::{Field, FieldValue, Frame};
    use crate::template::StandardResolver;

    /// Canned channel: records every envelope it receives and replays a fixed
    /// outcome.
    struct MockChannel {
        requests: Mutex<Vec<QueryRequest>>,
        outcome: Result<QueryResponse, String>,
    }

    impl MockChannel {
        fn ok(data: Vec<Frame>) -> Self {
            MockChannel {
                requests: Mutex::new(Vec::new()),
                outcome: Ok(QueryResponse { data }),
            }
        }

        fn err(msg: &str) -> Self {
            MockChannel { requests: Mutex::new(Vec::new()), outcome: Err(msg.to_string()) }
        }

        fn seen(&self) -> Vec<QueryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ExecutionChannel for MockChannel {
        async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
            self.requests.lock().unwrap().push(request);
            match &self.outcome {
                Ok(r) => Ok(r.clone()),
                Err(m) => Err(anyhow::Error::new(ChannelDown(m.clone()))),
            }
        }
    }

    #[derive(Debug)]
    struct ChannelDown(String);

    impl std::fmt::Display for ChannelDown {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "channel down: {}", self.0)
        }
    }

    impl std::error::Error for ChannelDown {}

    fn ds(channel: MockChannel) -> Datasource<MockChannel, StandardResolver> {
        Datasource::new(channel, StandardResolver)
    }

    fn one_field_frame(values: Vec<FieldValue>) -> Frame {
        Frame::with_fields("response", vec![Field::new("name", values)])
    }

    #[tokio::test]
    async fn envelope_has_single_reserved_target() {
        let d = ds(MockChannel::ok(vec![]));
        let q = DataQuery::new("A", Some("select name from t1".to_string()));
        let _ = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();

        let seen = d.channel.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].targets.len(), 1);
        assert_eq!(seen[0].targets[0].ref_id, METRIC_FIND_REF_ID);
        assert_eq!(
            seen[0].targets[0].query_text.as_deref(),
            Some("select name from t1")
        );
    }

    #[tokio::test]
    async fn empty_data_yields_empty_list() {
        let d = ds(MockChannel::ok(vec![]));
        let q = DataQuery::new("A", Some("select 1".to_string()));
        let out = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn frame_without_fields_yields_empty_list() {
        let d = ds(MockChannel::ok(vec![Frame::new("response")]));
        let q = DataQuery::new("A", Some("select 1".to_string()));
        let out = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn values_map_to_ordered_labels() {
        let d = ds(MockChannel::ok(vec![one_field_frame(vec![
            FieldValue::Int(10),
            FieldValue::Int(20),
            FieldValue::Int(30),
        ])]));
        let q = DataQuery::new("A", Some("select v from t".to_string()));
        let out = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        let texts: Vec<&str> = out.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["10", "20", "30"]);
    }

    #[tokio::test]
    async fn nulls_are_coerced_not_skipped() {
        let d = ds(MockChannel::ok(vec![one_field_frame(vec![
            FieldValue::Str("a".into()),
            FieldValue::Null,
            FieldValue::Str("c".into()),
        ])]));
        let q = DataQuery::new("A", Some("select v from t".to_string()));
        let out = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].text, "null");
    }

    #[tokio::test]
    async fn only_first_field_is_inspected() {
        let frame = Frame::with_fields(
            "response",
            vec![
                Field::new("name", vec![FieldValue::Str("a".into())]),
                Field::new("value", vec![FieldValue::Int(1), FieldValue::Int(2)]),
            ],
        );
        let d = ds(MockChannel::ok(vec![frame]));
        let q = DataQuery::new("A", Some("select * from t".to_string()));
        let out = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "a");
    }

    #[tokio::test]
    async fn channel_error_propagates_unwrapped() {
        let d = ds(MockChannel::err("boom"));
        let q = DataQuery::new("A", Some("select 1".to_string()));
        let err = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap_err();
        let down = err.downcast_ref::<ChannelDown>().expect("original error type");
        assert_eq!(down.0, "boom");
    }

    #[tokio::test]
    async fn repeated_calls_are_idempotent() {
        let d = ds(MockChannel::ok(vec![one_field_frame(vec![
            FieldValue::Str("x".into()),
            FieldValue::Str("y".into()),
        ])]));
        let q = DataQuery::new("A", Some("select v from t".to_string()));
        let first = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        let second = d.metric_find(&q, &ScopedVars::new(), None).await.unwrap();
        assert_eq!(first, second);

        let seen = d.channel.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn discovery_resolves_template_variables() {
        let d = ds(MockChannel::ok(vec![]));
        let scope: ScopedVars = [("table", "t1")].iter().copied().collect();
        let q = DataQuery::new("A", Some("select name from $table".to_string()));
        let _ = d.metric_find(&q, &scope, None).await.unwrap();
        assert_eq!(
            d.channel.seen()[0].targets[0].query_text.as_deref(),
            Some("select name from t1")
        );
    }

    #[test]
    fn apply_template_variables_normalizes_missing_text() {
        let d = ds(MockChannel::ok(vec![]));
        let q = DataQuery::new("A", None);
        let resolved = d.apply_template_variables(&q, &ScopedVars::new());
        assert_eq!(resolved.query_text.as_deref(), Some(""));
        // input untouched
        assert_eq!(q.query_text, None);
    }

    #[tokio::test]
    async fn check_health_reports_probe_row() {
        let d = ds(MockChannel::ok(vec![one_field_frame(vec![FieldValue::Str(
            "2024-01-01 00:00:00".into(),
        )])]));
        let h = d.check_health().await;
        assert_eq!(h.status, "ok");
        assert!(h.message.contains("2024-01-01 00:00:00"));
    }

    #[tokio::test]
    async fn check_health_surfaces_channel_error() {
        let d = ds(MockChannel::err("no route"));
        let h = d.check_health().await;
        assert_eq!(h.status, "error");
        assert!(h.message.contains("no route"));
    }
}
