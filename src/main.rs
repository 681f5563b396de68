use clap::Parser;
use racelog::{
    compute_speeds, decode, segment_speeds, universe_multiplier, word_speeds, SegmentSpeed,
    SpeedPolicy, SpeedRecord,
};
use serde::Serialize;
use std::{
    error::Error,
    fs,
    io::{self, Read},
};

/// decode a typing log and print its speed breakdown as JSON
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Decodes a recorded typing log into its quote, per-keystroke delays, and \
                  keystroke actions, then prints unlagged/adjusted/raw speed metrics, detected \
                  mistakes, and optional per-segment and per-word breakdowns as JSON."
)]
pub struct Cli {
    /// the encoded log; omit to read it from --file or stdin
    log: Option<String>,

    /// read the encoded log from a file
    #[clap(short = 'f', long)]
    file: Option<String>,

    /// universe the race was typed in, sets the WPM multiplier
    #[clap(short = 'u', long, default_value = "play")]
    universe: String,

    /// override the WPM multiplier directly
    #[clap(short = 'm', long)]
    multiplier: Option<f64>,

    /// delays above this multiple of the mean raw delay count as pauses
    #[clap(long, default_value_t = 5.0)]
    pause_ratio: f64,

    /// include per-segment speeds
    #[clap(short = 's', long)]
    segments: bool,

    /// include per-word speeds
    #[clap(short = 'w', long)]
    words: bool,

    /// pretty-print the JSON output
    #[clap(short = 'p', long)]
    pretty: bool,
}

impl Cli {
    fn read_log(&self) -> Result<String, Box<dyn Error>> {
        if let Some(log) = &self.log {
            return Ok(log.clone());
        }
        if let Some(path) = &self.file {
            return Ok(fs::read_to_string(path)?);
        }
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
            .unwrap_or_else(|| universe_multiplier(&self.universe))
    }
}

#[derive(Debug, Serialize)]
struct Report {
    quote: String,
    speeds: SpeedRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<SegmentSpeed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    words: Option<Vec<SegmentSpeed>>,
}

fn build_report(cli: &Cli, raw_log: &str) -> Result<Report, Box<dyn Error>> {
    let decoded = decode(raw_log)?;
    let policy = SpeedPolicy {
        pause_ratio: cli.pause_ratio,
    };
    let speeds = compute_speeds(&decoded, cli.multiplier(), &policy);

    // Segment and word breakdowns use the raw delays when the log has an
    // action record, falling back to the corrected delays otherwise.
    let raw_delays = speeds
        .raw
        .as_ref()
        .map(|raw| raw.delays.clone())
        .unwrap_or_else(|| speeds.delays.clone());
    let segments = cli
        .segments
        .then(|| segment_speeds(&decoded.quote, &speeds.delays, &raw_delays, speeds.multiplier));
    let words = cli
        .words
        .then(|| word_speeds(&decoded.quote, &speeds.delays, &raw_delays, speeds.multiplier));

    Ok(Report {
        quote: decoded.quote,
        speeds,
        segments,
        words,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let raw_log = cli.read_log()?;
    let raw_log = raw_log.trim_end_matches(['\r', '\n']);
    let report = build_report(&cli, raw_log)?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_LOG: &str = "1,3,1,500c100a100t|1,1,500,0+c,100,1+a,100,2+t,";

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["racelog", CAT_LOG]);

        assert_eq!(cli.log.as_deref(), Some(CAT_LOG));
        assert_eq!(cli.file, None);
        assert_eq!(cli.universe, "play");
        assert_eq!(cli.multiplier, None);
        assert_eq!(cli.pause_ratio, 5.0);
        assert!(!cli.segments);
        assert!(!cli.words);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_cli_universe_sets_multiplier() {
        let cli = Cli::parse_from(["racelog", "-u", "lang_ko", CAT_LOG]);
        assert_eq!(cli.multiplier(), 24000.0);

        let cli = Cli::parse_from(["racelog", "--universe", "play", CAT_LOG]);
        assert_eq!(cli.multiplier(), 12000.0);
    }

    #[test]
    fn test_cli_multiplier_overrides_universe() {
        let cli = Cli::parse_from(["racelog", "-u", "lang_ko", "-m", "13000", CAT_LOG]);
        assert_eq!(cli.multiplier(), 13000.0);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["racelog", "-s", "-w", "-p", CAT_LOG]);
        assert!(cli.segments);
        assert!(cli.words);
        assert!(cli.pretty);
    }

    #[test]
    fn test_build_report_basic() {
        let cli = Cli::parse_from(["racelog", CAT_LOG]);
        let report = build_report(&cli, CAT_LOG).unwrap();

        assert_eq!(report.quote, "cat");
        assert_eq!(report.speeds.adjusted_wpm, 120.0);
        assert!(report.segments.is_none());
        assert!(report.words.is_none());
    }

    #[test]
    fn test_build_report_with_breakdowns() {
        let cli = Cli::parse_from(["racelog", "-s", "-w", CAT_LOG]);
        let report = build_report(&cli, CAT_LOG).unwrap();

        let segments = report.segments.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "cat");

        let words = report.words.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "cat");
    }

    #[test]
    fn test_build_report_rejects_garbage() {
        let cli = Cli::parse_from(["racelog", "nonsense"]);
        assert!(build_report(&cli, "").is_err());
    }

    #[test]
    fn test_report_serializes() {
        let cli = Cli::parse_from(["racelog", CAT_LOG]);
        let report = build_report(&cli, CAT_LOG).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"quote\":\"cat\""));
        assert!(json.contains("\"adjusted_wpm\":120.0"));
    }
}
