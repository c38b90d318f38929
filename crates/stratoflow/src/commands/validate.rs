use crate::project::{self, Project};
use crate::utils;
use colored::Colorize;

pub fn handle() -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());

    let project = Project::load()?;
    println!(
        "スタックファイル: {}",
        project.stack_file.display().to_string().cyan()
    );

    let engine = project::build_engine(Some(&project.stack))?;
    let diagnostics = engine.validate(&project.stack);
    utils::print_diagnostics(&diagnostics);

    if diagnostics.has_errors() {
        anyhow::bail!("設定エラー: {}件", diagnostics.errors().count());
    }

    let stack = &project.stack;
    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  プロジェクト: {}", stack.name.cyan());
    println!("  リソース: {}個", stack.resources.len());
    for resource in &stack.resources {
        println!("    - {}", resource.address().cyan());
    }
    if !stack.data_sources.is_empty() {
        println!("  データソース: {}個", stack.data_sources.len());
        for data in &stack.data_sources {
            println!("    - {}", data.address().cyan());
        }
    }
    if !stack.outputs.is_empty() {
        println!("  出力: {}個", stack.outputs.len());
    }

    Ok(())
}
