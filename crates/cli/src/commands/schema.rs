//! `ecargraph setup` / `ecargraph drop`: Schema administration.

use ecargraph_core::Error;
use ecargraph_graph::{DgraphHttpAdmin, SCHEMA, SchemaAdmin};

use super::Context;

pub async fn setup(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let admin = DgraphHttpAdmin::from_config(&ctx.config)?;
    apply_schema(&admin).await?;
    println!("Schema applied at {}", admin.endpoint());
    Ok(())
}

pub async fn drop(ctx: &Context, confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        return Err(Error::config("refusing to drop all data without --confirm").into());
    }
    let admin = DgraphHttpAdmin::from_config(&ctx.config)?;
    drop_all(&admin).await?;
    println!("All data dropped at {}", admin.endpoint());
    Ok(())
}

pub(crate) async fn apply_schema(admin: &dyn SchemaAdmin) -> ecargraph_core::Result<()> {
    admin.apply_schema(SCHEMA).await?;
    Ok(())
}

pub(crate) async fn drop_all(admin: &dyn SchemaAdmin) -> ecargraph_core::Result<()> {
    admin.drop_all().await?;
    Ok(())
}
