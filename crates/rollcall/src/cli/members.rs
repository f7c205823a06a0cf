use anyhow::Result;
use rollcall_core::ingest::ingest_members;
use rollcall_core::source::ProPublica;
use rollcall_core::Config;

use super::context::{http_client, open_store};
use super::report::print_stage;

pub async fn run(config: &Config) -> Result<()> {
    let api = ProPublica::from_config(http_client(config)?, &config.source)?;
    let primary = open_store(&config.stores.primary).await?;

    let report = ingest_members(&api, &primary, &config.pipeline).await?;
    print_stage(&report);

    Ok(())
}
