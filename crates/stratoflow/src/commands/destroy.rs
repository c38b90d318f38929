use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub async fn handle(yes: bool, target: Option<&str>) -> anyhow::Result<()> {
    // 設定ファイルを消した後でもステートから削除できる
    let project = Project::find()?;
    let stack = project.as_ref().map(|p| &p.stack);
    let store = project::state_manager_for(project.as_ref())?;

    let lock = store.acquire_lock("destroy").await?;
    let mut state = store.load().await?;
    if state.resources.is_empty() {
        println!("{}", "削除対象のリソースはありません".dimmed());
        lock.release().await?;
        return Ok(());
    }

    let engine = project::build_engine(stack)?;
    project::ensure_authenticated(&engine).await?;

    let plan = engine.plan_destroy(&state, target)?;
    utils::print_plan(&plan);

    println!();
    println!(
        "{}",
        "⚠ これらのリソースは完全に削除されます".yellow().bold()
    );
    if !yes && !utils::confirm("削除しますか？")? {
        println!("{}", "キャンセルしました".yellow());
        lock.release().await?;
        return Ok(());
    }

    println!("{}", "削除中...".blue().bold());
    let result = engine.destroy(stack, &plan, &mut state, &store).await?;
    lock.release().await?;
    utils::print_apply_result(&result);

    if !result.is_success() {
        anyhow::bail!("{}件のリソースの削除に失敗しました", result.failed.len());
    }
    Ok(())
}
