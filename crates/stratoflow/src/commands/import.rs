use crate::project::{self, Project};
use colored::Colorize;

pub async fn handle(address: &str, id: &str) -> anyhow::Result<()> {
    let project = Project::load()?;
    let engine = project::build_engine(Some(&project.stack))?;
    project::ensure_authenticated(&engine).await?;

    let store = project.state_manager();
    let lock = store.acquire_lock("import").await?;
    let mut state = store.load().await?;

    println!("{} {} を取り込み中...", address.cyan(), id.dimmed());
    engine.import(&project.stack, &mut state, address, id).await?;
    store.save(&mut state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!("✓ {} を {} として取り込みました", id, address).green().bold()
    );
    println!("  次回の plan で設定との差分を確認してください");
    Ok(())
}
