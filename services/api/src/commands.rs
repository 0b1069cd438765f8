use crate::infra::{read_json_file, FileEstimationService};
use clap::{Args, Subcommand};
use rom_estimator::error::AppError;
use rom_estimator::estimation::{
    validate_override, ConfigOverride, ConfigWarning, EstimationResult, EstimationService,
    FormAnswers, KeyValueStorage, PlatformSummary, Tier,
};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Platform slug, e.g. lotus-notes
    #[arg(long)]
    pub(crate) platform: String,
    /// JSON file holding the questionnaire answers
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Print the raw result as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum OverridesCommand {
    /// List every stored override
    List,
    /// Print the stored override for one platform
    Show { platform: String },
    /// Store an override read from a JSON file, replacing any previous one
    Set {
        platform: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Revert one platform to its shipped defaults
    Remove { platform: String },
    /// Revert every platform to its shipped defaults
    Clear,
}

pub(crate) fn run_estimate(
    service: &FileEstimationService,
    args: EstimateArgs,
) -> Result<(), AppError> {
    let answers: FormAnswers = read_json_file(&args.answers)?;
    let result = service.estimate(&args.platform, &answers)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let label = service
            .catalog()
            .get(&args.platform)
            .map(|config| config.label.as_str())
            .unwrap_or(args.platform.as_str());
        print!("{}", render_estimate(label, &result));
    }
    Ok(())
}

pub(crate) fn run_platforms(service: &FileEstimationService) -> Result<(), AppError> {
    print!("{}", render_platforms(&service.platforms()));
    Ok(())
}

/// Checks shipped defaults and every stored override; findings are advisory.
pub(crate) fn run_validate(service: &FileEstimationService) -> Result<(), AppError> {
    print!("{}", render_findings(&collect_findings(service)));
    Ok(())
}

/// Shipped config warnings, stored override warnings, and anything the store had
/// to skip while reading, labelled by where they were found.
pub(crate) fn collect_findings<S>(service: &EstimationService<S>) -> Vec<(String, String)>
where
    S: KeyValueStorage + 'static,
{
    let mut findings: Vec<(String, String)> = service
        .validate_catalog()
        .into_iter()
        .map(|(platform, warning)| (platform, warning.to_string()))
        .collect();

    let snapshot = service.inspect_overrides();
    findings.extend(
        snapshot
            .issues
            .iter()
            .map(|issue| ("override storage".to_string(), issue.to_string())),
    );
    for (platform, value) in &snapshot.overrides {
        findings.extend(
            validate_override(value)
                .into_iter()
                .map(|warning| (format!("{platform} (override)"), warning.to_string())),
        );
    }
    findings
}

pub(crate) fn run_overrides(
    service: &FileEstimationService,
    command: OverridesCommand,
) -> Result<(), AppError> {
    match command {
        OverridesCommand::List => {
            println!("{}", serde_json::to_string_pretty(&service.overrides())?);
        }
        OverridesCommand::Show { platform } => match service.override_for(&platform)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("{platform} uses shipped defaults"),
        },
        OverridesCommand::Set { platform, file } => {
            let value: ConfigOverride = read_json_file(&file)?;
            let warnings = service.save_override(&platform, value)?;
            println!("Saved override for {platform}");
            print!("{}", render_warnings(&warnings));
        }
        OverridesCommand::Remove { platform } => {
            service.remove_override(&platform)?;
            println!("{platform} reverted to shipped defaults");
        }
        OverridesCommand::Clear => {
            service.clear_overrides()?;
            println!("All overrides cleared");
        }
    }
    Ok(())
}

fn tier_name(tier: Tier) -> &'static str {
    match tier {
        Tier::Simple => "Simple",
        Tier::Medium => "Medium",
        Tier::Complex => "Complex",
        Tier::VeryComplex => "Very complex",
    }
}

pub(crate) fn render_estimate(label: &str, result: &EstimationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ROM estimate: {label}");
    let _ = writeln!(out, "  Objects        {}", result.total_objects);
    for tier in Tier::ALL {
        let _ = writeln!(
            out,
            "    {:<12} {}",
            tier_name(tier),
            result.breakdown.get(tier)
        );
    }
    let _ = writeln!(out, "  Hours          {:.1}", result.estimated_hours);
    let _ = writeln!(
        out,
        "  Cost           {} - {}",
        format_currency(result.estimated_cost.low),
        format_currency(result.estimated_cost.high)
    );
    out
}

pub(crate) fn render_platforms(platforms: &[PlatformSummary]) -> String {
    let mut out = String::new();
    for summary in platforms {
        let marker = if summary.overridden { " [overridden]" } else { "" };
        let _ = writeln!(
            out,
            "{:<18} {:<24} {}{}",
            summary.platform, summary.label, summary.algorithm, marker
        );
    }
    out
}

fn render_findings(findings: &[(String, String)]) -> String {
    if findings.is_empty() {
        return "No configuration warnings\n".to_string();
    }
    let mut out = format!("{} configuration warning(s)\n", findings.len());
    for (platform, message) in findings {
        let _ = writeln!(out, "  {platform}: {message}");
    }
    out
}

fn render_warnings(warnings: &[ConfigWarning]) -> String {
    let mut out = String::new();
    for warning in warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
    out
}

/// Whole dollars with thousands separators.
pub(crate) fn format_currency(amount: f64) -> String {
    let rounded = amount.round().abs() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount.round() < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::estimation_service;
    use rom_estimator::config::StorageConfig;
    use rom_estimator::estimation::{CostRange, TierBreakdown, OVERRIDES_STORAGE_KEY};

    #[test]
    fn currency_is_grouped_in_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(52_000.0), "$52,000");
        assert_eq!(format_currency(1_234_567.5), "$1,234,568");
    }

    #[test]
    fn estimate_summary_lists_every_tier() {
        let result = EstimationResult {
            total_objects: 100,
            breakdown: TierBreakdown::from_counts([40, 30, 20, 10]),
            estimated_hours: 520.0,
            estimated_cost: CostRange {
                low: 52_000.0,
                high: 104_000.0,
            },
        };

        let rendered = render_estimate("HCL / Lotus Notes", &result);

        assert!(rendered.starts_with("ROM estimate: HCL / Lotus Notes\n"));
        assert!(rendered.contains("Very complex 10"));
        assert!(rendered.contains("Hours          520.0"));
        assert!(rendered.contains("$52,000 - $104,000"));
    }

    #[test]
    fn platform_listing_marks_overrides() {
        let rendered = render_platforms(&[PlatformSummary {
            platform: "ms-access".to_string(),
            label: "Microsoft Access".to_string(),
            algorithm: "tiered",
            overridden: true,
        }]);

        assert!(rendered.starts_with("ms-access"));
        assert!(rendered.trim_end().ends_with("tiered [overridden]"));
    }

    #[test]
    fn empty_findings_say_so() {
        assert_eq!(render_findings(&[]), "No configuration warnings\n");
        let rendered = render_findings(&[(
            "filemaker".to_string(),
            ConfigWarning::UnknownRating { rating: 7 }.to_string(),
        )]);
        assert!(rendered.starts_with("1 configuration warning(s)\n  filemaker: "));
    }

    #[test]
    fn validation_reports_a_corrupted_override_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join(format!("{OVERRIDES_STORAGE_KEY}.json")),
            "{\"lotus-notes\": {",
        )
        .expect("seed corrupt record");
        let storage = StorageConfig {
            overrides_dir: dir.path().to_path_buf(),
        };
        let service = estimation_service(&storage, None);

        let rendered = render_findings(&collect_findings(&service));

        assert!(rendered.starts_with("1 configuration warning(s)\n"));
        assert!(rendered.contains("override storage: override record is corrupted"));
    }

    #[test]
    fn validation_reports_stored_override_warnings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = StorageConfig {
            overrides_dir: dir.path().to_path_buf(),
        };
        let service = estimation_service(&storage, None);
        let value: ConfigOverride = serde_json::from_str(
            r#"{"hourlyRate": {"low": 300.0, "high": 200.0}}"#,
        )
        .expect("override decodes");
        service
            .save_override("filemaker", value)
            .expect("save succeeds");

        let findings = collect_findings(&service);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].0, "filemaker (override)");
    }
}
