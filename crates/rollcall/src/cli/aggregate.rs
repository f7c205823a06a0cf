use anyhow::Result;
use rollcall_core::{Aggregator, Config};

use super::context::open_store;
use super::report::print_aggregate;

pub async fn run(config: &Config) -> Result<()> {
    let primary = open_store(&config.stores.primary).await?;
    let secondary = open_store(&config.stores.secondary).await?;

    let report = Aggregator::new(&primary, &config.pipeline)
        .run(&secondary, config.pipeline.batch_size)
        .await?;
    print_aggregate(&report);

    Ok(())
}
