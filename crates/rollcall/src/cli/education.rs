use anyhow::Result;
use rollcall_core::ingest::{
    extract_education, EducationExtractor, EducationSources, VoteSmartBiography,
};
use rollcall_core::Config;

use super::context::{http_client, open_store};
use super::report::print_stage;

pub async fn run(config: &Config, use_votesmart: bool) -> Result<()> {
    let http = http_client(config)?;
    let primary = open_store(&config.stores.primary).await?;

    let extractor = EducationExtractor::new(config.pipeline.max_degree_len);
    let votesmart = if use_votesmart {
        Some(VoteSmartBiography::new(config.source.votesmart_biography_root.as_str())?)
    } else {
        None
    };
    let sources = EducationSources {
        fetcher: &http,
        extractor: &extractor,
        votesmart: votesmart.as_ref(),
    };

    let report = extract_education(&sources, &primary, &config.pipeline).await?;
    print_stage(&report);

    Ok(())
}
