//! Purchase-order command.

use crate::cli::OrderArgs;
use crate::commands::Engine;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use partmap_engine::{cancellation, BatchResolver, LineItemFilter, PurchaseOrder};
use std::fs;
use std::sync::Arc;
use tracing::warn;

/// Execute the order command.
///
/// Ctrl-C cancels the batch: pending arbitrations fall back to review and
/// lines not yet started are reported as cancelled.
pub async fn execute_order(args: OrderArgs, engine: Engine, config: &Config, formatter: &Formatter) -> Result<()> {
    let contents = fs::read_to_string(&args.file)?;
    let order = PurchaseOrder::from_json_str(&contents)?;

    let batch = BatchResolver::new(Arc::new(engine), config.policy.clone(), config.batch.clone())?;

    let (handle, token) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling remaining lines");
            handle.cancel();
        }
    });

    let report = batch.resolve_order(&order, &LineItemFilter::default(), token).await;
    interrupt.abort();

    println!("{}", formatter.format_order(&report)?);
    Ok(())
}
