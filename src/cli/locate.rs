use std::path::PathBuf;

use anchor_locator::{ElementLocator, LocatorStrategy};
use anyhow::Result;
use clap::Args;
use noteanchor_core_types::AnnotationId;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::inputs::{read_descriptor, read_document, write_json, ElementSummary};
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct LocateArgs {
    /// DOM snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub dom: PathBuf,

    /// Stored descriptor (JSON)
    #[arg(long, value_name = "FILE")]
    pub descriptor: PathBuf,

    /// Write an upgraded selector back into the descriptor file
    #[arg(long)]
    pub upgrade: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateReport {
    pub id: AnnotationId,
    pub found: bool,
    pub strategy: Option<LocatorStrategy>,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgraded_selector: Option<String>,
    pub element: Option<ElementSummary>,
}

pub async fn cmd_locate(args: LocateArgs, ctx: &CliContext) -> Result<()> {
    let doc = read_document(&args.dom).await?;
    let mut descriptor = read_descriptor(&args.descriptor).await?;
    let original_selector = descriptor.selector.clone();

    let mut locator = ElementLocator::new(ctx.config().locator.clone());
    let resolution = if args.upgrade {
        locator.locate_and_upgrade(&doc, &mut descriptor)
    } else {
        locator.locate(&doc, &descriptor)
    };

    if args.upgrade && descriptor.selector != original_selector {
        write_json(&args.descriptor, &descriptor).await?;
        info!("Descriptor updated in {}", args.descriptor.display());
    }

    let report = match resolution {
        Some(resolution) => LocateReport {
            id: descriptor.id.clone(),
            found: true,
            strategy: Some(resolution.strategy),
            selector: descriptor.selector.clone(),
            upgraded_selector: resolution.upgraded_selector,
            element: Some(ElementSummary::of(&doc, resolution.node)),
        },
        None => {
            warn!(id = %descriptor.id, "annotation could not be re-anchored");
            LocateReport {
                id: descriptor.id.clone(),
                found: false,
                strategy: None,
                selector: descriptor.selector.clone(),
                upgraded_selector: None,
                element: None,
            }
        }
    };

    emit(ctx.output(), &report, render_report)
}

fn render_report(report: &LocateReport) -> String {
    let (Some(strategy), Some(element)) = (report.strategy, report.element.as_ref()) else {
        return format!("Annotation {}: not found", report.id);
    };
    let mut out = format!(
        "Annotation {}: {} via {}",
        report.id,
        element.describe(),
        strategy.name()
    );
    if let Some(selector) = &report.upgraded_selector {
        out.push_str(&format!("\nUpgraded selector: {selector}"));
    }
    out
}
