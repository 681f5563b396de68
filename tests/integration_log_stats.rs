use racelog::{compute_speeds, decode, SpeedPolicy, DEFAULT_MULTIPLIER};

const CAT_LOG: &str = "1,3,1,500c100a100t|1,1,500,0+c,100,1+a,100,2+t,";

// "catx" typed, "x" backspaced after 200 ms, then "s"; the delay half folds
// the correction time into the final character.
const CORRECTION_LOG: &str =
    "1,4,1,500c100a100t400s|1,1,500,0+c,100,1+a,100,2+t,100,3+x,200,3-x,100,3+s,";

fn speeds(log: &str) -> racelog::SpeedRecord {
    compute_speeds(
        &decode(log).unwrap(),
        DEFAULT_MULTIPLIER,
        &SpeedPolicy::default(),
    )
}

#[test]
fn clean_race_end_to_end() {
    let decoded = decode(CAT_LOG).unwrap();
    assert_eq!(decoded.quote, "cat");
    assert_eq!(decoded.delays, vec![500, 100, 100]);
    assert_eq!(decoded.replay().unwrap(), "cat");

    let record = speeds(CAT_LOG);
    assert_eq!(record.total_ms, 700.0);
    assert_eq!(record.start_delay_ms, 500.0);
    assert!((record.unlagged_wpm - 12000.0 * 3.0 / 700.0).abs() < 1e-9);
    assert_eq!(record.adjusted_wpm, 120.0);
    assert!(record.mistakes.is_empty());

    // No corrections: the raw stream is the corrected stream.
    let raw = record.raw.as_ref().unwrap();
    assert_eq!(raw.delays, record.delays);
    assert_eq!(raw.correction_ms, 0.0);
    assert_eq!(raw.pause_ms, 0.0);
    assert!(raw.pauses.is_empty());
}

#[test]
fn corrected_race_recovers_raw_speed() {
    let record = speeds(CORRECTION_LOG);
    assert_eq!(record.total_ms, 1100.0);
    assert_eq!(record.adjusted_wpm, 12000.0 * 3.0 / 600.0);

    let raw = record.raw.as_ref().unwrap();
    assert_eq!(raw.delays, vec![500.0, 100.0, 100.0, 100.0]);
    assert_eq!(raw.total_ms, 800.0);
    assert_eq!(raw.unlagged_wpm, 60.0);
    assert_eq!(raw.adjusted_wpm, 120.0);
    assert_eq!(raw.correction_ms, 300.0);
    assert!((raw.correction_percent - 300.0 / 1100.0).abs() < 1e-9);
    assert_eq!(raw.characters, 5);

    assert_eq!(record.mistake_positions(), vec![3]);
    assert_eq!(record.mistakes[0].word, "cats");
}

#[test]
fn instant_leading_characters_report_infinite_rates() {
    let record = speeds("1,3,1,0c0a100t|1,1,0,0+c,0,1+a,100,2+t,");
    assert_eq!(record.instant_chars, 2);
    assert_eq!(record.start_delay_ms, 0.0);
    assert_eq!(record.unlagged_wpm, 360.0);
    assert_eq!(record.adjusted_wpm, 240.0);

    let curve: Vec<f64> = record.wpm_curve().iter().collect();
    assert_eq!(curve.len(), 3);
    assert!(curve[0].is_infinite());
    assert!(curve[1].is_infinite());
    assert_eq!(curve[2], 240.0);
}

#[test]
fn start_lag_distributes_over_batched_keystrokes() {
    let record = speeds("1,3,1,600c1a1t|1,1,600,0+c,1,1+a,1,2+t,");
    assert!(record.start_distributed);
    assert_eq!(record.delays, vec![200.0, 200.0, 200.0]);
    assert_eq!(record.start_delay_ms, 200.0);
    assert_eq!(record.instant_chars, 0);
    assert_eq!(record.total_ms, 602.0);
}

#[test]
fn pause_is_clipped_from_the_pauseless_stream() {
    // One 9000 ms stall seven characters in; the mean of the other raw
    // delays is 990 ms, so only the stall crosses the five-times bar.
    let log = concat!(
        "1,11,1,500a100b100c100d100e100f9000g100h100i100j100k|",
        "1,1,500,0+a,100,1+b,100,2+c,100,3+d,100,4+e,100,5+f,",
        "9000,6+g,100,7+h,100,8+i,100,9+j,100,10+k,"
    );
    let record = speeds(log);
    let raw = record.raw.as_ref().unwrap();

    assert_eq!(raw.pauses, vec![6]);
    assert_eq!(raw.total_ms, 10400.0);
    assert_eq!(raw.pauseless_delays[6], 990.0);
    assert_eq!(raw.pauseless_total_ms, 2390.0);
    assert_eq!(raw.pause_ms, 8010.0);
    assert!((raw.pause_percent - 8010.0 / 10400.0).abs() < 1e-9);
    assert!(raw.pauseless_unlagged_wpm > raw.unlagged_wpm);
}

#[test]
fn legacy_log_decodes_without_actions() {
    let record = speeds("100h150e120l130l140o");
    assert_eq!(record.total_ms, 640.0);
    assert_eq!(record.unlagged_wpm, 12000.0 * 5.0 / 640.0);
    assert!(record.mistakes.is_empty());
    assert!(record.raw.is_none());
    assert!(record.raw_wpm_curve(false).is_none());
}

#[test]
fn leading_replace_marker_rotates_into_the_raw_stream() {
    let log = "1,3,1,500c100a100t|1,1,500,0$c,100,1+a,100,2+t,";
    let record = speeds(log);
    assert_eq!(record.total_ms, 700.0);

    // The marked first keystroke surrenders its delay in the raw view.
    let raw = record.raw.as_ref().unwrap();
    assert_eq!(raw.delays, vec![0.0, 100.0, 100.0]);
    assert_eq!(raw.correction_ms, 500.0);
}

#[test]
fn record_is_deterministic() {
    let decoded = decode(CORRECTION_LOG).unwrap();
    let policy = SpeedPolicy::default();
    let first = compute_speeds(&decoded, DEFAULT_MULTIPLIER, &policy);
    let second = compute_speeds(&decoded, DEFAULT_MULTIPLIER, &policy);
    assert_eq!(first, second);
}

#[test]
fn record_serializes_to_json() {
    let record = speeds(CAT_LOG);
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"adjusted_wpm\":120.0"));
    assert!(json.contains("\"raw\":{"));
}

#[test]
fn curves_agree_with_the_scalar_metrics() {
    let record = speeds(CORRECTION_LOG);

    let last = record.wpm_curve().iter().last().unwrap();
    assert!((last - record.unlagged_wpm).abs() < 1e-9);

    let last = record.adjusted_wpm_curve().iter().last().unwrap();
    assert!((last - record.adjusted_wpm).abs() < 1e-9);

    let raw = record.raw.as_ref().unwrap();
    let last = record.raw_wpm_curve(false).unwrap().iter().last().unwrap();
    assert!((last - raw.unlagged_wpm).abs() < 1e-9);
}
