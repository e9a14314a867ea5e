//! tabsource: a connector between dashboard hosts and remote tabular data
//! sources. Resolves template variables in query text, dispatches request
//! envelopes over an execution channel, and flattens discovery results into
//! label lists for variable population. Also ships the backend-side HTTP
//! facade that answers those envelopes via an injected SQL executor.

pub mod channel;
pub mod datasource;
pub mod error;
pub mod frame;
pub mod query;
pub mod server;
pub mod settings;
pub mod template;
