use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tabsource::channel::HttpChannel;
use tabsource::datasource::Datasource;
use tabsource::query::DataQuery;
use tabsource::template::{ScopedVars, StandardResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let base = std::env::var("TABSOURCE_URL").unwrap_or_else(|_| "http://127.0.0.1:7878".to_string());
    let query_text = std::env::args().nth(1);
    let Some(query_text) = query_text else {
        eprintln!("usage: tabsource <query text>   (TABSOURCE_URL selects the backend)");
        std::process::exit(2);
    };

    info!(target: "tabsource", "discovery against {}", base);

    let channel = HttpChannel::new(&base)?;
    let datasource = Datasource::new(channel, StandardResolver);
    let query = DataQuery::new("A", Some(query_text));
    let entries = datasource.metric_find(&query, &ScopedVars::new(), None).await?;

    for entry in &entries {
        println!("{}", entry.text);
    }
    info!(target: "tabsource", "{} discovery entries", entries.len());
    Ok(())
}
