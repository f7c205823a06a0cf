use anyhow::Result;
use rollcall_core::ingest::{resolve_identities, IdentityResolver};
use rollcall_core::source::{GoogleKnowledgeGraph, MediaWiki};
use rollcall_core::Config;

use super::context::{http_client, open_store};
use super::report::print_stage;

pub async fn run(config: &Config, all: bool) -> Result<()> {
    let http = http_client(config)?;
    let graph = GoogleKnowledgeGraph::from_config(http.clone(), &config.source)?;
    let wiki = MediaWiki::from_config(http, &config.source)?;
    let primary = open_store(&config.stores.primary).await?;

    let resolver = IdentityResolver::new(&graph, &wiki);
    let report = resolve_identities(&resolver, &primary, &config.pipeline, all).await?;
    print_stage(&report);

    Ok(())
}
