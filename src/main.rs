use anyhow::Context;
use clap::Parser;
use flow_classifier::{
    analysis::ThresholdUnit,
    capture::{DataSource, FileSource, RecordParser, SilkSource},
    config::{Config, RangePreset},
    report::{key_findings, write_json, ReportWriter},
    traffic::TrafficClassifier,
    ui::App,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "flow-classifier")]
#[command(about = "Classify binned TCP flow counts and flag anomalous periods")]
struct Cli {
    #[arg(short, long, help = "Configuration file path (TOML)")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Input file with timestamp|packets[|bytes] lines, '-' for stdin")]
    input: Option<PathBuf>,

    #[arg(long, conflicts_with = "input", help = "Fetch data with the SiLK rwfilter pipeline")]
    silk: bool,

    #[arg(short, long, help = "Anomaly threshold")]
    threshold: Option<f64>,

    #[arg(short, long, value_enum, help = "Unit of the anomaly threshold")]
    unit: Option<ThresholdUnit>,

    #[arg(short, long, value_enum, help = "Built-in range table")]
    preset: Option<RangePreset>,

    #[arg(short = 'k', long, help = "Also cluster packet counts with k-means")]
    clusters: Option<usize>,

    #[arg(short, long, help = "Text report output path")]
    report: Option<PathBuf>,

    #[arg(long, help = "Write the full analysis as JSON")]
    json: Option<PathBuf>,

    #[arg(short, long, help = "Open the terminal chart view")]
    view: bool,

    #[arg(short, long, help = "Enable debug logging")]
    debug: bool,

    #[arg(long, help = "Write the effective configuration to a file and exit")]
    write_config: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.classifier.anomaly_threshold = threshold;
        }
        if let Some(unit) = self.unit {
            config.classifier.threshold_unit = unit;
        }
        if let Some(preset) = self.preset {
            config.classifier.preset = preset;
            config.classifier.ranges = None;
        }
        if self.clusters.is_some() {
            config.classifier.clusters = self.clusters;
        }
        if let Some(report) = &self.report {
            config.output.report_path = report.clone();
        }
        if self.json.is_some() {
            config.output.json_path = self.json.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);

    if let Some(path) = &cli.write_config {
        config.save_to_file(path)?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let settings = config.classifier_settings()?;

    let source: Box<dyn DataSource> = if cli.silk {
        SilkSource::verify_environment();
        Box::new(SilkSource::new(&config.source))
    } else {
        Box::new(FileSource::new(cli.input.clone()))
    };

    log::info!("Fetching TCP traffic data from {}", source.describe());
    let output = match source.fetch() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            process::exit(1);
        }
    };

    let batch = RecordParser::parse_output(&output);
    if batch.is_empty() {
        eprintln!(
            "Analysis failed: no data available ({} lines could not be parsed)",
            batch.skipped_count()
        );
        process::exit(1);
    }

    let skipped = batch.skipped_count();
    let analysis = TrafficClassifier::new(settings)
        .analyze(batch.records)
        .context("Classification failed")?;

    ReportWriter::new(config.output.top_anomalies, config.source.bin_size)
        .with_skipped_lines(skipped)
        .write(&config.output.report_path, &analysis)?;
    if let Some(path) = &config.output.json_path {
        write_json(path, &analysis)?;
    }

    println!(
        "Analysis complete! Check {} for detailed results.",
        config.output.report_path.display()
    );
    println!();
    println!("Key findings:");
    for finding in key_findings(&analysis) {
        println!("{}", finding);
    }

    if cli.view {
        App::new(&analysis, config.source.bin_size).run()?;
    }

    Ok(())
}
