use std::process::Command;

use crate::cli::{IngestArgs, LayoutBackend};
use crate::model::ToolVersions;

pub(super) fn collect_tool_versions(layout_backend: LayoutBackend) -> ToolVersions {
    ToolVersions {
        engine: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        layout_backend: layout_backend.as_str().to_string(),
        pdftotext: command_version_optional("pdftotext", &["-v"]),
    }
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    // pdftotext prints its version banner on stderr.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "fas-chunker".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.catalog_path {
        command.push("--catalog-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.ingest_manifest_path {
        command.push("--ingest-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.export_path {
        command.push("--export-path".to_string());
        command.push(path.display().to_string());
    }
    command.push("--namespace".to_string());
    command.push(args.namespace.clone());
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    for standard in &args.standards {
        command.push("--standard".to_string());
        command.push(standard.clone());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    if args.layout_backend != LayoutBackend::Auto {
        command.push("--layout-backend".to_string());
        command.push(args.layout_backend.as_str().to_string());
    }
    if let Some(jobs) = args.jobs {
        command.push("--jobs".to_string());
        command.push(jobs.to_string());
    }

    command.join(" ")
}
