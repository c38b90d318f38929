use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;
use stratoflow_cloud::{CloudProvider, ResourceStatus};

pub async fn handle_list() -> anyhow::Result<()> {
    let project = Project::find()?;
    let state = project::state_manager_for(project.as_ref())?.load().await?;

    if state.resources.is_empty() {
        println!("{}", "ステートにリソースはありません".dimmed());
        return Ok(());
    }

    for (address, resource) in &state.resources {
        let tainted = if resource.status == ResourceStatus::Tainted {
            format!(" {}", "(tainted)".red())
        } else {
            String::new()
        };
        println!("{}  {}{}", address.cyan(), resource.id.dimmed(), tainted);
    }
    Ok(())
}

pub async fn handle_show(address: &str) -> anyhow::Result<()> {
    let project = Project::find()?;
    let state = project::state_manager_for(project.as_ref())?.load().await?;
    let resource = state
        .get_resource(address)
        .ok_or_else(|| anyhow::anyhow!("{} はステートにありません", address))?;

    let schema = project::schema_provider()?
        .resource(&resource.resource_type)
        .map(|r| r.schema());

    println!("{}", address.bold());
    println!("  id: {}", resource.id.cyan());
    println!("  状態: {}", resource.status);
    println!("  作成: {}", resource.created_at.to_rfc3339());
    println!("  更新: {}", resource.updated_at.to_rfc3339());
    if !resource.dependencies.is_empty() {
        println!("  依存: {}", resource.dependencies.join(", "));
    }

    println!();
    for (key, value) in &resource.attributes {
        let sensitive = schema.as_ref().is_some_and(|s| s.is_sensitive(key));
        let value = if sensitive {
            "(sensitive)".dimmed().to_string()
        } else {
            utils::format_value(value)
        };
        println!("  {} = {}", key, value);
    }
    Ok(())
}

pub async fn handle_rm(address: &str) -> anyhow::Result<()> {
    let project = Project::find()?;
    let store = project::state_manager_for(project.as_ref())?;

    let lock = store.acquire_lock("state rm").await?;
    let mut state = store.load().await?;
    if state.remove_resource(address).is_none() {
        anyhow::bail!("{} はステートにありません", address);
    }
    store.save(&mut state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!("✓ {} をステートから外しました", address).green().bold()
    );
    println!("  リモートのリソースは削除されていません");
    Ok(())
}
