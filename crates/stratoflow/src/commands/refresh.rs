use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub async fn handle() -> anyhow::Result<()> {
    let project = Project::load()?;
    let engine = project::build_engine(Some(&project.stack))?;
    project::ensure_authenticated(&engine).await?;

    let store = project.state_manager();
    let lock = store.acquire_lock("refresh").await?;
    let mut state = store.load().await?;

    println!("{}", "リソースを再読み込み中...".blue());
    let report = engine.refresh(&project.stack, &mut state).await?;
    store.save(&mut state).await?;
    lock.release().await?;

    utils::print_refresh_report(&report);
    println!("{}", "✓ ステートを更新しました".green().bold());
    Ok(())
}
