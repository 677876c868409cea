use adb_builder::llm::{ExtractorConfig, StatementExtractor};
use adb_builder::*;
use dotenv::dotenv;
use std::error::Error;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();

    let api_key = std::env::var("GEMINI_API_KEY")?;
    let path: PathBuf = std::env::args()
        .nth(1)
        .ok_or("usage: gemini_statement_adb <statement.pdf> [YYYY-MM-DD:YYYY-MM-DD]")?
        .into();

    let extractor = StatementExtractor::from_config(api_key, &ExtractorConfig::default());
    let document = extractor.backend().prepare_document(&path).await?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("  ... {:?}", event);
        }
    });

    let raw = extractor.extract(&document, Some(tx)).await?;
    printer.await?;

    let processor = AdbProcessor::new(AdbConfig {
        malformed_rows: MalformedRowPolicy::Skip,
        ..AdbConfig::default()
    })?;
    let analysis = match std::env::args().nth(2) {
        Some(range) => processor.analyze(&raw, &AnalysisRange::parse(&range)?)?,
        None => processor.analyze_observed_period(&raw)?,
    };

    println!("\nAverage Daily Balance: {}", analysis.adb_display());
    println!("Closing balance:       {}", analysis.result.closing_balance);
    println!("Days counted:          {}", analysis.result.days_counted);
    for warning in &analysis.result.warnings {
        println!("Warning: {:?}", warning);
    }

    Ok(())
}
