use std::fs;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use sentiscope_core::AnalysisEngine;
use sentiscope_core::AnalysisResult;
use sentiscope_core::ExportFormat;
use sentiscope_core::Session;
use sentiscope_core::SubmitOutcome;
use sentiscope_core::ValidationMode;
use sentiscope_core::session::ResultsState;
use sentiscope_core::split_batch;
use sentiscope_core::summary;

pub async fn handle_analyze(
    engine: &AnalysisEngine,
    raw: &str,
    mode: ValidationMode,
    max_tokens: Option<u32>,
    formats: &[ExportFormat],
    output_dir: Option<&Path>,
) -> Result<()> {
    let batch = split_batch(raw);
    let mut session = Session::new();

    let texts = match session.submit(batch) {
        SubmitOutcome::Launched(texts) => texts,
        SubmitOutcome::Rejected => {
            let message = session
                .input_error()
                .unwrap_or("submission rejected")
                .to_string();
            bail!("{message}");
        }
    };

    println!("Analyzing sentiment of {} entries...", texts.len());
    let outcome = engine.classify(&texts, mode, max_tokens).await;
    session.complete(outcome);

    let results = match session.results() {
        Some(ResultsState::Loaded(results)) => results.clone(),
        Some(ResultsState::Failed(message)) => bail!("Analysis failed: {message}"),
        _ => bail!("Analysis did not produce a result set"),
    };

    render_table(&results);
    render_summary(&results);

    if !formats.is_empty() {
        let written = engine.write_exports(&results, formats, output_dir)?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

pub fn handle_export(
    engine: &AnalysisEngine,
    input: &Path,
    format: ExportFormat,
    output_dir: Option<&Path>,
) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let results: Vec<AnalysisResult> = serde_json::from_str(&content)
        .with_context(|| format!("'{}' is not an exported result file", input.display()))?;

    let written = engine.write_exports(&results, &[format], output_dir)?;
    for path in written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

pub fn handle_info(engine: &AnalysisEngine) -> Result<()> {
    println!(
        "Loaded configuration from {}",
        engine.paths().config_file.display()
    );

    let provider = engine.resolve_provider()?;
    println!("Analysis model: {}", provider.analysis.name);
    println!(
        "Suggestion model: {} (temperature {})",
        provider.suggestion.name,
        provider
            .suggestion
            .temperature
            .map(|t| t.to_string())
            .unwrap_or_else(|| "default".to_string())
    );
    println!("Export directory: {}", engine.export_dir(None)?.display());

    Ok(())
}

fn render_table(results: &[AnalysisResult]) {
    println!("\n{}", "=".repeat(100));
    println!(
        "{:<40}  {:<8}  {:>10}  {}",
        "Text", "Class", "Confidence", "Keywords"
    );
    println!("{}", "-".repeat(100));

    for result in results {
        println!(
            "{:<40}  {:<8}  {:>10.2}  {}",
            truncate(&result.original_text, 40),
            result.sentiment.as_str(),
            result.confidence,
            truncate(&result.keywords.join(", "), 36)
        );
    }

    println!("{}", "=".repeat(100));
}

fn render_summary(results: &[AnalysisResult]) {
    println!("\nSentiment distribution:");
    let total = results.len().max(1);
    for (sentiment, count) in summary::sentiment_counts(results) {
        println!(
            "  {:<8} {:>4}  ({:.0}%)",
            sentiment.to_string(),
            count,
            count as f64 * 100.0 / total as f64
        );
    }

    println!("\nConfidence histogram:");
    let bins = summary::confidence_histogram(results);
    let max = bins.iter().copied().max().unwrap_or(0).max(1);
    for (index, count) in bins.iter().enumerate() {
        let lower = index as f64 / summary::CONFIDENCE_BINS as f64;
        let upper = (index + 1) as f64 / summary::CONFIDENCE_BINS as f64;
        let bar_len = count * 40 / max;
        println!(
            "  {lower:.1}-{upper:.1} | {:<40} {count}",
            "#".repeat(bar_len)
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
