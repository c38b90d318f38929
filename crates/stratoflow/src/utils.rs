use colored::Colorize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use stratoflow_cloud::{
    Action, ActionType, ApplyResult, Diagnostics, OutputState, Plan, RefreshReport,
};
use stratoflow_core::is_unknown;

/// [y/N] で確認する
pub fn confirm(message: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", message);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// 値を表示用の文字列にする
pub fn format_value(value: &Value) -> String {
    match value {
        v if is_unknown(v) => "(known after apply)".to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// 出力値はクォートなしで表示
pub fn format_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn colored_symbol(action_type: ActionType) -> colored::ColoredString {
    let symbol = action_type.symbol();
    match action_type {
        ActionType::Create => symbol.green(),
        ActionType::Update => symbol.yellow(),
        ActionType::Replace => symbol.magenta(),
        ActionType::Delete => symbol.red(),
        ActionType::Read => symbol.cyan(),
        ActionType::NoOp => symbol.normal(),
    }
}

fn print_action(action: &Action) {
    let header = match &action.resource_id {
        Some(id) => format!("{} ({})", action.address.bold(), id.dimmed()),
        None => action.address.bold().to_string(),
    };
    println!("  {} {}", colored_symbol(action.action_type), header);

    if let Some(reason) = &action.reason {
        println!("      {}", format!("# {}", reason).dimmed());
    }

    if action.action_type == ActionType::Delete {
        return;
    }

    for change in &action.changes {
        let new = if change.sensitive {
            "(sensitive)".to_string()
        } else {
            change.new.as_ref().map(format_value).unwrap_or_else(|| "null".to_string())
        };
        let forces = if change.force_new {
            format!(" {}", "# 再作成が必要".red())
        } else {
            String::new()
        };

        match (&change.old, action.action_type) {
            (Some(old), ActionType::Update | ActionType::Replace) => {
                let old = if change.sensitive {
                    "(sensitive)".to_string()
                } else {
                    format_value(old)
                };
                println!("      {}: {} → {}{}", change.attribute, old, new, forces);
            }
            _ => println!("      {}: {}{}", change.attribute, new, forces),
        }
    }
}

/// 実行計画を表示
pub fn print_plan(plan: &Plan) {
    println!();
    if !plan.has_changes {
        println!("{}", "✓ 変更はありません。リモートは設定と一致しています".green());
        return;
    }

    println!("{}", "実行計画:".bold());
    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        print_action(action);
    }

    println!();
    println!("計画: {}", plan.summary().to_string().bold());
}

/// 適用結果を表示
pub fn print_apply_result(result: &ApplyResult) {
    println!();
    for success in &result.succeeded {
        println!(
            "  {} {}: {}",
            "✓".green(),
            success.address.cyan(),
            success.action_type
        );
    }
    for failure in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.address.cyan(),
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    for skipped in &result.skipped {
        println!("  {} {}: スキップ", "-".yellow(), skipped.cyan());
    }

    println!();
    let summary = format!(
        "成功 {}件 / 失敗 {}件 / スキップ {}件 ({:.1}秒)",
        result.succeeded.len(),
        result.failed.len(),
        result.skipped.len(),
        result.duration_ms as f64 / 1000.0
    );
    if result.is_success() {
        println!("{}", format!("✓ 完了: {}", summary).green().bold());
    } else {
        println!("{}", format!("✗ 一部失敗: {}", summary).red().bold());
    }
}

/// 再読み込み結果を表示
pub fn print_refresh_report(report: &RefreshReport) {
    println!(
        "  {}件を再読み込み、{}件をステートから削除",
        report.refreshed.len(),
        report.removed.len()
    );
    for address in &report.removed {
        println!("    {} {} (リモートに存在しません)", "-".red(), address.cyan());
    }
}

/// 出力値を一覧表示
pub fn print_outputs(outputs: &BTreeMap<String, OutputState>) {
    for (name, output) in outputs {
        let value = if output.sensitive {
            "(sensitive)".dimmed().to_string()
        } else {
            format_value(&output.value)
        };
        println!("  {} = {}", name.cyan(), value);
    }
}

/// 検証結果を表示
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.warnings() {
        eprintln!("  {} {}", "⚠".yellow(), diagnostic);
    }
    for diagnostic in diagnostics.errors() {
        eprintln!("  {} {}", "✗".red(), diagnostic);
    }
}
