use std::path::PathBuf;

use anchor_locator::{Signature, SignatureMatcher, SignatureTier};
use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::CliContext;
use crate::cli::inputs::{read_document, select_target, ElementSummary};
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct SignatureArgs {
    /// Snapshot the signature is taken from
    #[arg(long, value_name = "FILE")]
    pub before: PathBuf,

    /// Snapshot the element is searched for afterwards (e.g. after a resize)
    #[arg(long, value_name = "FILE")]
    pub after: PathBuf,

    /// CSS selector of the element in the first snapshot
    #[arg(long, value_name = "CSS")]
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureReport {
    pub signature: Signature,
    pub found: bool,
    pub tier: Option<SignatureTier>,
    pub element: Option<ElementSummary>,
}

pub async fn cmd_signature(args: SignatureArgs, ctx: &CliContext) -> Result<()> {
    let before = read_document(&args.before).await?;
    let after = read_document(&args.after).await?;
    let node = select_target(&before, &args.target)?;

    let matcher = SignatureMatcher::new(ctx.config().signature.clone());
    let signature = matcher
        .create_signature(&before, node)
        .ok_or_else(|| anyhow!("{:?} did not resolve to an element", args.target))?;

    let found = matcher.find_by_signature(&after, &signature);
    let report = SignatureReport {
        found: found.is_some(),
        tier: found.map(|m| m.tier),
        element: found.map(|m| ElementSummary::of(&after, m.node)),
        signature,
    };

    emit(ctx.output(), &report, render_report)
}

fn render_report(report: &SignatureReport) -> String {
    let header = format!(
        "Signature: <{}> \"{}\"",
        report.signature.tag,
        report.signature.text_content.chars().take(60).collect::<String>()
    );
    match (report.tier, &report.element) {
        (Some(tier), Some(element)) => {
            format!("{header}\nFound {} via {}", element.describe(), tier.name())
        }
        _ => format!("{header}\nNo structural match"),
    }
}
