use adb_builder::*;
use std::error::Error;

// Simulated extraction output: unordered, with intraday duplicates
const MOCK_EXTRACTION: &str = r#"
{"observations": [
    {"date": "2025-01-03", "balance": "48,200.00"},
    {"date": "2025-01-01", "balance": 45230.00},
    {"date": "2025-01-03", "balance": "47,950.25"},
    {"date": "2025-01-12", "balance": 61000},
    {"date": "2025-01-20", "balance": "39,875.10"},
    {"date": "2025-01-20", "balance": "40,120.10"},
    {"date": "2025-01-28", "balance": 52300.40}
]}
"#;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let raw = match std::env::args().nth(1) {
        Some(path) => parse_extraction_json(&std::fs::read_to_string(path)?)?,
        None => parse_extraction_json(MOCK_EXTRACTION)?,
    };
    let range = match std::env::args().nth(2) {
        Some(range) => AnalysisRange::parse(&range)?,
        None => AnalysisRange::month(2025, 1)?,
    };

    let analysis = analyze_balance_history(&raw, &range)?;

    println!("Date        Balance       Origin");
    for (date, day) in analysis.daily.iter() {
        println!("{}  {:>12}  {:?}", date, day.balance.round_dp(2), day.origin);
    }

    let result = &analysis.result;
    println!("\nAverage Daily Balance: {}", result.adb_display());
    println!("Closing balance:       {}", result.closing_balance);
    println!("Days counted:          {}", result.days_counted);
    for warning in &result.warnings {
        println!("Warning: {:?}", warning);
    }

    println!("\nMonthly ADB:");
    for (month, summary) in monthly_breakdown(&analysis.daily)? {
        println!("  {}  {}", month.format("%Y-%m"), summary.adb_display());
    }

    Ok(())
}
