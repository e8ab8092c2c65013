//! Part and entity resolution commands.

use crate::cli::{EntityArgs, PartArgs};
use crate::commands::Engine;
use crate::error::Result;
use crate::output::Formatter;
use partmap_domain::ExternalReference;
use partmap_engine::PolicyConfig;

/// Execute the part command.
pub async fn execute_part(args: PartArgs, engine: &Engine, policy: &PolicyConfig, formatter: &Formatter) -> Result<()> {
    let reference = ExternalReference::part_with_description(args.identifier.clone(), args.description);
    let result = engine.resolve(&reference, policy).await?;
    println!("{}", formatter.format_result(&args.identifier, &result)?);
    Ok(())
}

/// Execute the entity command.
pub async fn execute_entity(
    args: EntityArgs,
    engine: &Engine,
    policy: &PolicyConfig,
    formatter: &Formatter,
) -> Result<()> {
    let reference = ExternalReference::entity(args.name.clone(), args.address_block());
    let result = engine.resolve(&reference, policy).await?;
    println!("{}", formatter.format_result(&args.name, &result)?);
    Ok(())
}
