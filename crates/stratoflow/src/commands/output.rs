use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub async fn handle(name: Option<&str>) -> anyhow::Result<()> {
    let project = Project::find()?;
    let state = project::state_manager_for(project.as_ref())?.load().await?;

    match name {
        // 名前指定時はスクリプトから使えるよう値だけを出す
        Some(name) => {
            let output = state
                .outputs
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("出力 '{}' が見つかりません", name))?;
            println!("{}", utils::format_raw(&output.value));
        }
        None if state.outputs.is_empty() => {
            println!("{}", "出力はありません（apply 後に表示されます）".dimmed());
        }
        None => utils::print_outputs(&state.outputs),
    }

    Ok(())
}
