//! Wire types for the query protocol: the request envelope submitted to the
//! execution channel and the response it returns. Field names follow the
//! host's JSON conventions (camelCase).

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Reserved ref id tagging discovery envelopes. Never assigned to an
/// ordinary query, so the backend and any request-scoped caching can
/// special-case metric-find traffic.
pub const METRIC_FIND_REF_ID: &str = "metricFindQuery";

/// A single user-authored query target.
///
/// `query_text` is opaque to this layer; it may be absent, and resolution
/// normalizes absence to the empty string. Hidden targets are carried on the
/// wire but skipped by the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub ref_id: String,
    #[serde(default)]
    pub query_text: Option<String>,
    #[serde(default)]
    pub hide: bool,
}

impl DataQuery {
    pub fn new<S: Into<String>>(ref_id: S, query_text: Option<String>) -> Self {
        DataQuery { ref_id: ref_id.into(), query_text, hide: false }
    }
}

/// The envelope submitted to the execution channel: an ordered list of
/// targets. Discovery envelopes always contain exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub targets: Vec<DataQuery>,
}

/// The tabular response: an ordered list of frames, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<Frame>,
}

/// One label emitted for dashboard variable population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFindValue {
    pub text: String,
}
