use std::path::PathBuf;

use anchor_locator::metrics::{self, MetricSnapshot};
use anchor_locator::ElementLocator;
use anchor_placement::{BatchReport, MarkerBoard, MarkerState, PlacementRecord};
use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::context::CliContext;
use crate::cli::inputs::{read_descriptors, read_document, write_json};
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct PlaceArgs {
    /// DOM snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub dom: PathBuf,

    /// JSON array of stored descriptors, in display order
    #[arg(long, value_name = "FILE")]
    pub descriptors: PathBuf,

    /// Override the snapshot's vertical scroll offset
    #[arg(long)]
    pub scroll_y: Option<f64>,

    /// Write upgraded selectors back into the descriptors file
    #[arg(long)]
    pub upgrade: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOutput {
    pub report: BatchReport,
    pub records: Vec<PlacementRecord>,
    pub metrics: MetricSnapshot,
}

pub async fn cmd_place(args: PlaceArgs, ctx: &CliContext) -> Result<()> {
    let mut doc = read_document(&args.dom).await?;
    if let Some(scroll_y) = args.scroll_y {
        let scroll_x = doc.viewport().scroll_x;
        doc.scroll_to(scroll_x, scroll_y);
    }
    let mut descriptors = read_descriptors(&args.descriptors).await?;
    let before: Vec<String> = descriptors.iter().map(|d| d.selector.clone()).collect();

    let config = ctx.config();
    let mut locator = ElementLocator::new(config.locator.clone());
    let mut board = MarkerBoard::new(config.placement.clone());
    let report = board.place_all(&doc, &mut locator, &mut descriptors);
    if report.aborted {
        bail!("placement pass refused by the call ceiling");
    }

    let changed = descriptors
        .iter()
        .zip(&before)
        .any(|(descriptor, selector)| &descriptor.selector != selector);
    if args.upgrade && changed {
        write_json(&args.descriptors, &descriptors).await?;
        info!("Descriptors updated in {}", args.descriptors.display());
    }

    let output = PlaceOutput {
        report,
        records: board.registry().records().cloned().collect(),
        metrics: metrics::snapshot(),
    };
    emit(ctx.output(), &output, render_output)
}

fn render_output(output: &PlaceOutput) -> String {
    let report = &output.report;
    let mut lines = vec![format!(
        "{} placed, {} hidden, {} pending, {} not found",
        report.placed, report.hidden, report.pending, report.not_found
    )];
    for entry in &report.entries {
        let state = match entry.marker {
            Some(MarkerState::Placed { left, top }) => format!("placed at ({left}, {top})"),
            Some(MarkerState::Hidden) => "hidden".to_string(),
            Some(MarkerState::Located) => "waiting for layout".to_string(),
            Some(MarkerState::Unplaced) | Some(MarkerState::Removed) | None => {
                "not found".to_string()
            }
        };
        let via = entry
            .strategy
            .map(|s| format!(" via {}", s.name()))
            .unwrap_or_default();
        lines.push(format!(
            "  [{}] {}: {}{}",
            entry.display_index, entry.annotation_id, state, via
        ));
    }
    lines.join("\n")
}
