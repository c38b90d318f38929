use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub async fn handle(yes: bool, no_refresh: bool) -> anyhow::Result<()> {
    let project = Project::load()?;
    let engine = project::build_engine(Some(&project.stack))?;
    project::ensure_authenticated(&engine).await?;

    let store = project.state_manager();
    let lock = store.acquire_lock("apply").await?;
    let mut state = store.load().await?;

    if !no_refresh && !state.resources.is_empty() {
        println!("{}", "リソースを再読み込み中...".blue());
        let report = engine.refresh(&project.stack, &mut state).await?;
        utils::print_refresh_report(&report);
    }

    println!("{}", "変更内容を計算中...".blue());
    let plan = engine.plan(&project.stack, &state).await?;
    utils::print_plan(&plan);

    if plan.has_changes {
        println!();
        if !yes && !utils::confirm("この計画を適用しますか？")? {
            println!("{}", "キャンセルしました".yellow());
            lock.release().await?;
            return Ok(());
        }
        println!("{}", "適用中...".blue().bold());
    }

    let result = engine.apply(&project.stack, &plan, &mut state, &store).await?;
    lock.release().await?;

    if plan.has_changes {
        utils::print_apply_result(&result);
    }
    if !state.outputs.is_empty() {
        println!();
        println!("{}", "出力:".bold());
        utils::print_outputs(&state.outputs);
    }

    if !result.is_success() {
        anyhow::bail!("{}件のリソースの適用に失敗しました", result.failed.len());
    }
    Ok(())
}
