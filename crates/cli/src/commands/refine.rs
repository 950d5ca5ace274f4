//! `draftsmith refine` — run the full pipeline on a draft file.

use std::path::PathBuf;

use draftsmith_config::AppConfig;
use draftsmith_pipeline::RefinementPipeline;

pub async fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    model: Option<String>,
    report: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    if let Some(model) = model {
        config.default_model = model;
    }

    let draft = std::fs::read_to_string(&input)?;
    if draft.trim().is_empty() {
        return Err(format!("draft file is empty: {}", input.display()).into());
    }

    let client = draftsmith_providers::build_from_config(&config)?;
    let pipeline = RefinementPipeline::from_config(client, &config);

    println!("📝 Refining {} ...", input.display());
    let result = pipeline.run(&draft).await?;

    let output = output.unwrap_or_else(|| input.with_extension("formatted.md"));
    let final_draft = result
        .formatted_draft
        .as_deref()
        .unwrap_or(&result.refined_draft);
    std::fs::write(&output, final_draft)?;

    println!("✅ Wrote {}", output.display());
    println!();
    println!("Summary: {}", result.summary);
    println!();
    println!("Title options:");
    for option in &result.title_options {
        match &option.subtitle {
            Some(subtitle) => println!("  - {} — {}", option.title, subtitle),
            None => println!("  - {}", option.title),
        }
    }
    println!();
    match result.formatting_validation_score {
        Some(score) => println!(
            "Formatting score: {:.0}% after {} attempt(s)",
            score * 100.0,
            result.formatting_attempts
        ),
        None => println!("Formatting was not scored"),
    }
    if !result.formatting_missing_elements.is_empty() {
        println!(
            "Still missing: {}",
            result.formatting_missing_elements.join(", ")
        );
    }

    if let Some(report_path) = report {
        std::fs::write(&report_path, serde_json::to_string_pretty(&result)?)?;
        println!("📊 Report written to {}", report_path.display());
    }

    Ok(())
}
