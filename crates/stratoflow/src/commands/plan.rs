use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub async fn handle(no_refresh: bool) -> anyhow::Result<()> {
    let project = Project::load()?;
    let engine = project::build_engine(Some(&project.stack))?;
    project::ensure_authenticated(&engine).await?;

    // plan はステートを書き換えない
    let mut state = project.state_manager().load().await?;
    if !no_refresh && !state.resources.is_empty() {
        println!("{}", "リソースを再読み込み中...".blue());
        let report = engine.refresh(&project.stack, &mut state).await?;
        utils::print_refresh_report(&report);
    }

    println!("{}", "変更内容を計算中...".blue());
    let plan = engine.plan(&project.stack, &state).await?;
    utils::print_plan(&plan);

    Ok(())
}
