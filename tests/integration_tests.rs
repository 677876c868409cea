use adb_builder::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn canonical(points: &[(NaiveDate, Decimal)]) -> CanonicalSeries {
    points.iter().copied().collect()
}

#[test]
fn test_normalization_is_idempotent() {
    let inputs = vec![
        vec![],
        vec![RawObservation::new("2025-01-01", 1)],
        vec![
            RawObservation::new("2025-02-03", "2,500.00"),
            RawObservation::new("2025-02-01", 2400.75),
            RawObservation::new("03-Feb-2025", 2550),
            RawObservation::new("2025-02-01", -10),
            RawObservation::new("2025/02/28", "0.01"),
        ],
    ];

    for raw in inputs {
        let once = normalize(&raw).unwrap();
        let again = normalize(&once.to_raw()).unwrap();
        assert_eq!(once, again);
    }
}

#[test]
fn test_completeness_for_every_series() {
    let series_cases = vec![
        CanonicalSeries::new(),
        canonical(&[(date(2024, 2, 15), dec!(10))]),
        canonical(&[(date(2023, 12, 1), dec!(10)), (date(2024, 3, 1), dec!(20))]),
        canonical(&[(date(2030, 1, 1), dec!(99))]),
    ];
    let ranges = vec![
        AnalysisRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap(),
        AnalysisRange::month(2024, 2).unwrap(),
        AnalysisRange::new(date(2023, 11, 20), date(2024, 4, 10)).unwrap(),
        AnalysisRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap(),
    ];

    for series in &series_cases {
        for range in &ranges {
            let daily = reconstruct(series, range).unwrap();
            assert_eq!(daily.len() as i64, range.day_count());
            assert_eq!(daily.first_date(), Some(range.start));
            assert_eq!(daily.last().map(|(d, _)| d), Some(range.end));

            let dates: Vec<NaiveDate> = daily.iter().map(|(d, _)| *d).collect();
            for pair in dates.windows(2) {
                assert_eq!(pair[0].succ_opt(), Some(pair[1]));
            }
        }
    }
}

#[test]
fn test_forward_fill_correctness() {
    let series = canonical(&[(date(2025, 1, 1), dec!(100)), (date(2025, 1, 5), dec!(200))]);
    let range = AnalysisRange::new(date(2025, 1, 1), date(2025, 1, 7)).unwrap();

    let daily = reconstruct(&series, &range).unwrap();
    assert_eq!(
        daily.balances(),
        vec![
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(100),
            dec!(200),
            dec!(200),
            dec!(200)
        ]
    );
}

#[test]
fn test_duplicate_collapse() {
    let raw = vec![
        RawObservation::new("2025-03-01", 50),
        RawObservation::new("2025-03-01", 70),
        RawObservation::new("2025-03-02", 90),
    ];

    let series = normalize(&raw).unwrap();
    assert_eq!(
        series,
        canonical(&[(date(2025, 3, 1), dec!(70)), (date(2025, 3, 2), dec!(90))])
    );
}

#[test]
fn test_leading_gap_zero_fill() {
    let raw = vec![RawObservation::new("2025-02-10", 500)];
    let range = AnalysisRange::new(date(2025, 2, 1), date(2025, 2, 10)).unwrap();

    let analysis = analyze_balance_history(&raw, &range).unwrap();
    let balances = analysis.daily.balances();
    assert!(balances[..9].iter().all(|b| b.is_zero()));
    assert_eq!(balances[9], dec!(500));
    assert!(analysis.result.has_leading_gap());
    assert_eq!(analysis.result.zero_filled_days, 9);
}

#[test]
fn test_adb_arithmetic() {
    let series = canonical(&[(date(2025, 5, 1), dec!(100)), (date(2025, 5, 3), dec!(200))]);
    let range = AnalysisRange::new(date(2025, 5, 1), date(2025, 5, 4)).unwrap();
    let daily = reconstruct(&series, &range).unwrap();
    assert_eq!(daily.balances(), vec![dec!(100), dec!(100), dec!(200), dec!(200)]);

    let result = aggregate(&daily).unwrap();
    assert_eq!(result.adb_display(), dec!(150.00));
    assert_eq!(result.closing_balance, dec!(200));
    assert_eq!(result.days_counted, 4);
}

#[test]
fn test_empty_extraction_fail_soft() {
    let range = AnalysisRange::new(date(2025, 1, 1), date(2025, 1, 15)).unwrap();

    let analysis = analyze_balance_history(&[], &range).unwrap();
    assert_eq!(analysis.daily.len(), 15);
    assert!(analysis.daily.balances().iter().all(|b| b.is_zero()));
    assert!(analysis.result.is_empty_extraction());
    assert_eq!(analysis.result.adb_display(), dec!(0.00));
}

#[test]
fn test_observations_entirely_before_range() {
    let raw = vec![
        RawObservation::new("2024-11-02", 300),
        RawObservation::new("2024-11-29", 450.25),
    ];
    let range = AnalysisRange::month(2025, 1).unwrap();

    let analysis = analyze_balance_history(&raw, &range).unwrap();
    assert_eq!(analysis.result.adb, dec!(450.25));
    assert_eq!(analysis.result.carried_days, 31);
    assert!(!analysis.result.has_warnings());
}

#[test]
fn test_observations_entirely_after_range() {
    let raw = vec![RawObservation::new("2025-02-01", 1000)];
    let range = AnalysisRange::month(2025, 1).unwrap();

    let analysis = analyze_balance_history(&raw, &range).unwrap();
    assert_eq!(analysis.result.adb, Decimal::ZERO);
    assert_eq!(analysis.result.zero_filled_days, 31);
    assert!(analysis.result.has_leading_gap());
    assert!(!analysis.result.is_empty_extraction());
}

#[test]
fn test_invalid_range_fails_before_computation() {
    let raw = vec![RawObservation::new("not-a-date", "garbage")];
    let range = AnalysisRange {
        start: date(2025, 2, 1),
        end: date(2025, 1, 1),
    };

    // The range is checked first, so the malformed record is never reached.
    assert!(matches!(
        analyze_balance_history(&raw, &range),
        Err(AdbError::InvalidRange(_))
    ));
}

#[test]
fn test_malformed_record_surfaces_context() {
    let raw = vec![
        RawObservation::new("2025-01-01", 100),
        RawObservation::new("2025-01-02", 100),
        RawObservation::new("2025-13-01", 100),
    ];
    let range = AnalysisRange::month(2025, 1).unwrap();

    let err = analyze_balance_history(&raw, &range).unwrap_err();
    assert!(err.is_data_error());
    let message = err.to_string();
    assert!(message.contains("#2"));
    assert!(message.contains("date"));
    assert!(message.contains("2025-13-01"));
}

#[test]
fn test_extreme_balance_reports_overflow() {
    let raw = vec![RawObservation::new(
        "2025-01-01",
        "79228162514264337593543950335",
    )];
    let range = AnalysisRange::new(date(2025, 1, 1), date(2025, 1, 2)).unwrap();

    let err = analyze_balance_history(&raw, &range).unwrap_err();
    assert!(matches!(err, AdbError::ArithmeticOverflow(_)));
    assert!(err.is_data_error());
}

#[test]
fn test_statement_json_to_adb() -> anyhow::Result<()> {
    let extraction_output = r#"```json
    {"observations": [
        {"date": "2025-01-01", "balance": "10,000.00"},
        {"date": "2025-01-01", "balance": 9500},
        {"date": "2025-01-11", "balance": 12000.50, "time": "16:20"},
        {"date": "2025-01-21", "balance": "8,000"}
    ]}
    ```"#;

    let raw = parse_extraction_json(extraction_output)?;
    assert_eq!(raw.len(), 4);

    let range = AnalysisRange::parse("2025-01")?;
    let analysis = analyze_balance_history(&raw, &range)?;

    // 10 x 9500 + 10 x 12000.50 + 11 x 8000 = 303005
    assert_eq!(analysis.result.adb_display(), dec!(9774.35));
    assert_eq!(analysis.result.closing_balance, dec!(8000));
    assert_eq!(analysis.result.observed_days, 3);
    assert_eq!(analysis.result.min_balance, dec!(8000));
    assert_eq!(analysis.result.max_balance, dec!(12000.50));
    Ok(())
}

#[test]
fn test_quarterly_monthly_breakdown() {
    let raw = vec![
        RawObservation::new("2025-01-01", 3100),
        RawObservation::new("2025-02-01", 2800),
        RawObservation::new("2025-03-16", 6200),
    ];
    let range = AnalysisRange::parse("2025-01-01:2025-03-31").unwrap();

    let analysis = analyze_balance_history(&raw, &range).unwrap();
    let months = monthly_breakdown(&analysis.daily).unwrap();
    assert_eq!(months.len(), 3);
    assert_eq!(months[&date(2025, 1, 1)].adb, dec!(3100));
    assert_eq!(months[&date(2025, 2, 1)].adb, dec!(2800));
    // 15 x 2800 + 16 x 6200 = 141200 over 31 days
    assert_eq!(months[&date(2025, 3, 1)].adb_display(), dec!(4554.84));

    let total_days: usize = months.values().map(|m| m.days_counted).sum();
    assert_eq!(total_days, analysis.result.days_counted);
}

#[test]
fn test_result_serializes_for_presentation() {
    let raw = vec![RawObservation::new("2025-01-01", 12.34)];
    let range = AnalysisRange::new(date(2025, 1, 1), date(2025, 1, 2)).unwrap();

    let analysis = analyze_balance_history(&raw, &range).unwrap();
    let json = serde_json::to_string(&analysis.result).unwrap();
    assert!(json.contains("\"days_counted\":2"));
    assert!(json.contains("closing_balance"));

    let daily_json = serde_json::to_string(&analysis.daily).unwrap();
    assert!(daily_json.contains("2025-01-02"));
    assert!(daily_json.contains("CarriedForward"));
}

#[test]
fn test_independent_runs_in_parallel() {
    let handles: Vec<_> = (1..=4u32)
        .map(|month| {
            std::thread::spawn(move || {
                let raw = vec![RawObservation::new(
                    format!("2025-{:02}-01", month),
                    i64::from(month) * 100,
                )];
                let range = AnalysisRange::month(2025, month).unwrap();
                analyze_balance_history(&raw, &range).unwrap().result.adb
            })
        })
        .collect();

    let adbs: Vec<Decimal> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(adbs, vec![dec!(100), dec!(200), dec!(300), dec!(400)]);
}
