//! `draftsmith check` — offline rubric scoring, no LLM calls.

use std::path::PathBuf;

use draftsmith_config::AppConfig;
use draftsmith_validation::Validator;

pub fn run(input: PathBuf, baseline: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let validator = Validator::new(config.formatting.weights)?;

    let candidate = std::fs::read_to_string(&input)?;

    let report = match &baseline {
        Some(baseline_path) => {
            let baseline_text = std::fs::read_to_string(baseline_path)?;
            validator.score_against_baseline(&baseline_text, &candidate)?
        }
        None => validator.score_formatting(&candidate)?,
    };

    println!("🔍 {} — score {:.0}%", input.display(), report.score * 100.0);
    println!();
    if !report.passed.is_empty() {
        println!("Passed:");
        for check in &report.passed {
            println!("  ✅ {check}");
        }
    }
    if !report.failed.is_empty() {
        println!("Failed:");
        for check in &report.failed {
            match report.feedback.get(check) {
                Some(detail) => println!("  ❌ {check}: {detail}"),
                None => println!("  ❌ {check}"),
            }
        }
    }

    let threshold = config.formatting.accept_threshold;
    println!();
    if report.meets(threshold) {
        println!("Meets the acceptance threshold ({:.0}%)", threshold * 100.0);
    } else {
        println!(
            "Below the acceptance threshold ({:.0}%)",
            threshold * 100.0
        );
        std::process::exit(1);
    }

    Ok(())
}
