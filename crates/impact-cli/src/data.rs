//! Event data tooling: synthetic datasets, Phyphox conversion and event
//! directory validation.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use impact_signal::imu::{self, EventLabel, EventMetadata};
use impact_signal::{
    PhyphoxExport, RawSample, SyntheticEventConfig, SyntheticEventGenerator, SyntheticLabel,
    ACCELEROMETER_FILE, GYROSCOPE_FILE, IMU_FILE, LABEL_FILE, META_FILE,
};

// ============================================================================
// Synthetic events
// ============================================================================

/// Arguments for the synth command
#[derive(Args, Debug, Clone)]
pub struct SynthArgs {
    /// Output directory; events are written as event_NNNN/
    #[arg(short, long, default_value = "data/events")]
    pub out_dir: PathBuf,

    /// Number of no-crash events
    #[arg(long, default_value = "60")]
    pub no_crash: usize,

    /// Number of light crashes
    #[arg(long, default_value = "40")]
    pub light: usize,

    /// Number of heavy crashes
    #[arg(long, default_value = "40")]
    pub heavy: usize,

    /// RNG seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Sampling rate in Hz
    #[arg(long, default_value = "200")]
    pub sampling_hz: f64,

    /// Recording length in seconds
    #[arg(long, default_value = "5")]
    pub duration_s: f64,
}

/// Write the synthetic dataset; returns the event directories in order
pub fn generate_dataset(args: &SynthArgs) -> Result<Vec<PathBuf>> {
    if args.sampling_hz <= 0.0 || args.duration_s <= 0.0 {
        bail!("sampling rate and duration must be positive");
    }

    let config = SyntheticEventConfig {
        sampling_hz: args.sampling_hz,
        duration_s: args.duration_s,
        impact_at_s: args.duration_s / 2.0,
        ..Default::default()
    };
    let mut generator = SyntheticEventGenerator::new(config, args.seed);

    let plan = [
        (SyntheticLabel::NoCrash, args.no_crash),
        (SyntheticLabel::Light, args.light),
        (SyntheticLabel::Heavy, args.heavy),
    ];

    let mut dirs = Vec::new();
    for (label, count) in plan {
        for _ in 0..count {
            let dir = args.out_dir.join(format!("event_{:04}", dirs.len()));
            generator
                .write_event(&dir, label)
                .with_context(|| format!("writing {}", dir.display()))?;
            dirs.push(dir);
        }
    }
    Ok(dirs)
}

/// Execute the synth command
pub fn execute_synth(args: SynthArgs) -> Result<()> {
    let dirs = generate_dataset(&args)?;
    println!(
        "{} Generated {} events in {} ({} no-crash, {} light, {} heavy)",
        "[SYNTH]".bright_cyan().bold(),
        dirs.len().to_string().bold(),
        args.out_dir.display(),
        args.no_crash,
        args.light,
        args.heavy
    );
    Ok(())
}

// ============================================================================
// Phyphox conversion
// ============================================================================

/// Arguments for the convert-phyphox command
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Phyphox export archive
    pub input: PathBuf,

    /// Destination imu.csv
    pub output: PathBuf,
}

/// Read both sensor tables from a Phyphox archive and align them
pub fn convert_phyphox(zip_path: &Path) -> Result<Vec<RawSample>> {
    let file = File::open(zip_path).with_context(|| format!("opening {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", zip_path.display()))?;

    let names: Vec<String> = archive.file_names().map(String::from).collect();
    if !names.iter().any(|n| n == ACCELEROMETER_FILE) || !names.iter().any(|n| n == GYROSCOPE_FILE)
    {
        bail!(
            "archive must contain {} and {}; found: {:?}",
            ACCELEROMETER_FILE,
            GYROSCOPE_FILE,
            names
        );
    }

    let accelerometer = read_entry(&mut archive, ACCELEROMETER_FILE)?;
    let gyroscope = read_entry(&mut archive, GYROSCOPE_FILE)?;

    let export = PhyphoxExport::from_readers(accelerometer.as_slice(), gyroscope.as_slice())?;
    Ok(export.align())
}

fn read_entry(archive: &mut zip::ZipArchive<File>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("reading {}", name))?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Execute the convert-phyphox command
pub fn execute_convert(args: ConvertArgs) -> Result<()> {
    let samples = convert_phyphox(&args.input)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    imu::write_imu_csv(&args.output, &samples)?;

    let duration = samples.last().map(|s| s.t).unwrap_or(0.0);
    println!("{} {}", "Saved:".green().bold(), args.output.display());
    println!("Rows: {} Duration(s): {:.3}", samples.len(), duration);
    Ok(())
}

// ============================================================================
// Validation
// ============================================================================

/// Arguments for the validate command
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Event directory
    pub event_dir: PathBuf,
}

/// Outcome of one validation check
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Run every check against an event directory
pub fn validate_event_dir(dir: &Path) -> Vec<Check> {
    let mut checks = Vec::new();
    let imu_path = dir.join(IMU_FILE);

    if imu_path.is_file() {
        checks.push(Check::pass("imu.csv present", imu_path.display().to_string()));
        match imu::read_imu_csv(&imu_path) {
            Ok(series) => checks.push(Check::pass(
                "imu.csv format",
                format!("{} rows, {:.3} s", series.len(), series.duration_s()),
            )),
            Err(e) => checks.push(Check::fail("imu.csv format", e.to_string())),
        }
    } else {
        checks.push(Check::fail("imu.csv present", format!("{} not found", imu_path.display())));
    }

    checks.push(match EventMetadata::read_from_dir(dir) {
        Ok(Some(meta)) => Check::pass(
            "meta.json",
            format!("sampling_hz={:?} duration_s={:?}", meta.sampling_hz, meta.duration_s),
        ),
        Ok(None) => Check::pass("meta.json", format!("{} not present (optional)", META_FILE)),
        Err(e) => Check::fail("meta.json", e.to_string()),
    });

    checks.push(match EventLabel::read_from_dir(dir) {
        Ok(Some(label)) => Check::pass(
            "label.json",
            format!("crash={} severity={}", label.crash, label.severity),
        ),
        Ok(None) => Check::pass("label.json", format!("{} not present (optional)", LABEL_FILE)),
        Err(e) => Check::fail("label.json", e.to_string()),
    });

    checks
}

/// Execute the validate command
pub fn execute_validate(args: ValidateArgs) -> Result<()> {
    let checks = validate_event_dir(&args.event_dir);
    for check in &checks {
        let mark = if check.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("{} {:<16} {}", mark, check.name, check.detail);
    }

    let failed = checks.iter().filter(|c| !c.passed).count();
    if failed > 0 {
        bail!("{} failed {} check(s)", args.event_dir.display(), failed);
    }
    println!();
    println!("{} {}", "Event directory passed validation:".green(), args.event_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    fn synth_args(out_dir: PathBuf) -> SynthArgs {
        SynthArgs {
            out_dir,
            no_crash: 2,
            light: 1,
            heavy: 1,
            seed: Some(5),
            sampling_hz: 200.0,
            duration_s: 5.0,
        }
    }

    #[test]
    fn test_generate_dataset_layout() {
        let dir = tempdir().unwrap();
        let dirs = generate_dataset(&synth_args(dir.path().to_path_buf())).unwrap();

        assert_eq!(dirs.len(), 4);
        assert!(dirs[0].ends_with("event_0000"));
        assert!(dirs[3].ends_with("event_0003"));

        let label = EventLabel::read_from_dir(&dirs[2]).unwrap().unwrap();
        assert_eq!(label.severity, "light");
        let label = EventLabel::read_from_dir(&dirs[3]).unwrap().unwrap();
        assert_eq!(label.severity, "heavy");
    }

    #[test]
    fn test_generated_events_validate() {
        let dir = tempdir().unwrap();
        let dirs = generate_dataset(&synth_args(dir.path().to_path_buf())).unwrap();
        let checks = validate_event_dir(&dirs[0]);
        assert!(checks.iter().all(|c| c.passed), "{checks:?}");
    }

    #[test]
    fn test_validate_reports_missing_imu() {
        let dir = tempdir().unwrap();
        let checks = validate_event_dir(dir.path());
        assert!(!checks[0].passed);
        assert_eq!(checks[0].name, "imu.csv present");
    }

    #[test]
    fn test_validate_reports_short_recording() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(IMU_FILE),
            "t,ax,ay,az,gx,gy,gz\n0,0,0,9.8,0,0,0\n0.1,0,0,9.8,0,0,0\n",
        )
        .unwrap();
        std::fs::write(dir.path().join(META_FILE), "{not json").unwrap();

        let checks = validate_event_dir(dir.path());
        let format = checks.iter().find(|c| c.name == "imu.csv format").unwrap();
        assert!(!format.passed);
        let meta = checks.iter().find(|c| c.name == "meta.json").unwrap();
        assert!(!meta.passed);
    }

    fn phyphox_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        std::fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
    }

    #[test]
    fn test_convert_phyphox() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");
        phyphox_zip(
            &zip_path,
            &[
                (
                    ACCELEROMETER_FILE,
                    "Time (s),Acceleration x (m/s^2),Acceleration y (m/s^2),Acceleration z (m/s^2)\n\
                     5.0,0,0,9.8\n5.1,1,0,9.8\n5.2,2,0,9.8\n",
                ),
                (
                    GYROSCOPE_FILE,
                    "Time (s),Gyroscope x (rad/s),Gyroscope y (rad/s),Gyroscope z (rad/s)\n\
                     5.0,0,0,0\n5.2,2,0,0\n",
                ),
            ],
        );

        let samples = convert_phyphox(&zip_path).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].t, 0.0);
        approx::assert_relative_eq!(samples[1].gx, 1.0, epsilon = 1e-9);

        let out = dir.path().join("out/imu.csv");
        execute_convert(ConvertArgs {
            input: zip_path,
            output: out.clone(),
        })
        .unwrap();
        let rows = imu::parse_imu_csv(File::open(out).unwrap()).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_convert_requires_both_sensors() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");
        phyphox_zip(&zip_path, &[(ACCELEROMETER_FILE, "Time (s)\n0\n")]);

        let err = convert_phyphox(&zip_path).unwrap_err();
        assert!(err.to_string().contains(GYROSCOPE_FILE));
    }
}
