use std::path::PathBuf;

use anchor_locator::{capture, Descriptor};
use anyhow::Result;
use clap::Args;
use noteanchor_core_types::AnnotationId;
use tracing::info;

use crate::cli::context::CliContext;
use crate::cli::inputs::{read_document, select_target, write_json};
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct CaptureArgs {
    /// DOM snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub dom: PathBuf,

    /// CSS selector of the element to anchor (first match wins)
    #[arg(long, value_name = "CSS")]
    pub target: String,

    /// Annotation id (a random one when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Also write the descriptor to this file
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub async fn cmd_capture(args: CaptureArgs, ctx: &CliContext) -> Result<()> {
    let doc = read_document(&args.dom).await?;
    let node = select_target(&doc, &args.target)?;
    let id = args.id.map(AnnotationId::from).unwrap_or_default();

    let descriptor = capture(&doc, node, id, &ctx.config().locator)?;
    info!(id = %descriptor.id, selector = %descriptor.selector, "descriptor captured");

    if let Some(out) = &args.out {
        write_json(out, &descriptor).await?;
        info!("Descriptor written to {}", out.display());
    }

    emit(ctx.output(), &descriptor, render_descriptor)
}

fn render_descriptor(descriptor: &Descriptor) -> String {
    let context = &descriptor.element_context;
    let mut lines = vec![
        format!("Annotation: {}", descriptor.id),
        format!("Selector:   {}", descriptor.selector),
        format!(
            "Element:    <{}> at ({}, {})",
            context.tag, context.position.x, context.position.y
        ),
    ];
    if !context.classes.is_empty() {
        lines.push(format!("Classes:    {}", context.classes.join(" ")));
    }
    if !context.text.is_empty() {
        lines.push(format!("Text:       {}", context.text));
    }
    for (depth, entry) in descriptor.parent_chain.iter().enumerate() {
        let id = entry
            .id
            .as_deref()
            .map(|id| format!("#{id}"))
            .unwrap_or_default();
        lines.push(format!("Parent {}:   <{}{}>", depth + 1, entry.tag, id));
    }
    lines.join("\n")
}
