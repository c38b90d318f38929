use crate::project;
use colored::Colorize;
use stratoflow_cloud::{AttributeType, CloudProvider, Schema};
use stratoflow_cloud_civo::provider_schema;

pub fn handle(type_name: Option<&str>) -> anyhow::Result<()> {
    let provider = project::schema_provider()?;

    let Some(type_name) = type_name else {
        print_index(&provider);
        return Ok(());
    };

    if type_name == provider.name() {
        println!("{} {}", "provider".bold(), type_name.cyan());
        print_schema(&provider_schema(), 1);
        return Ok(());
    }

    // civo_instance などはリソースとデータソースの両方がある
    let resource = provider.resource(type_name);
    let data_source = provider.data_source(type_name);
    if resource.is_none() && data_source.is_none() {
        anyhow::bail!(
            "不明なタイプです: {}（strato schema で一覧を表示できます）",
            type_name
        );
    }

    let both = resource.is_some() && data_source.is_some();
    if let Some(resource) = resource {
        println!("{} {}", "resource".bold(), type_name.cyan());
        print_schema(&resource.schema(), 1);
    }
    if let Some(data_source) = data_source {
        if both {
            println!();
        }
        println!("{} {}", "data".bold(), type_name.cyan());
        print_schema(&data_source.schema(), 1);
    }
    Ok(())
}

fn print_index(provider: &impl CloudProvider) {
    println!(
        "{} {} ({})",
        "プロバイダー:".bold(),
        provider.name().cyan(),
        provider.display_name()
    );

    let mut resources = provider.resources();
    resources.sort_by_key(|r| r.type_name());
    println!();
    println!("{}", "リソース:".bold());
    for resource in resources {
        println!(
            "  {:<26} {}",
            resource.type_name().cyan(),
            resource.schema().description.dimmed()
        );
    }

    let mut data_sources = provider.data_sources();
    data_sources.sort_by_key(|d| d.type_name());
    println!();
    println!("{}", "データソース:".bold());
    for data_source in data_sources {
        println!(
            "  {:<26} {}",
            data_source.type_name().cyan(),
            data_source.schema().description.dimmed()
        );
    }
}

fn print_schema(schema: &Schema, depth: usize) {
    let indent = "  ".repeat(depth);
    if depth == 1 && !schema.description.is_empty() {
        println!("{}{}", indent, schema.description.dimmed());
    }

    for (name, attribute) in schema.attributes() {
        let mut flags = Vec::new();
        if attribute.force_new {
            flags.push("再作成".red().to_string());
        }
        if attribute.sensitive {
            flags.push("機密".yellow().to_string());
        }
        if let Some(default) = &attribute.default {
            flags.push(format!("default={}", default));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!(
            "{}{:<22} {:<14} {}{}",
            indent,
            name.cyan(),
            attribute.attr_type.to_string(),
            attribute.mode(),
            flags
        );
        if !attribute.description.is_empty() {
            println!("{}  {}", indent, attribute.description.dimmed());
        }

        if let AttributeType::Block(nested) = &attribute.attr_type {
            print_schema(nested, depth + 1);
        }
    }
}
