//! Cumulative speed-over-keystrokes curves for charting.

use serde::Serialize;

/// One chartable sample: cumulative milliseconds and the WPM to date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub ms: f64,
    pub wpm: f64,
}

impl From<CurvePoint> for (f64, f64) {
    fn from(p: CurvePoint) -> Self {
        (p.ms, p.wpm)
    }
}

/// Lazy, restartable WPM-to-date curve over a delay stream.
///
/// Element `i` is the average WPM over the first `i + 1` keystrokes. In the
/// adjusted view the first delay (the reaction time) is excluded and its
/// slot reports an infinite rate; a zero-delay first keystroke gets the
/// same treatment, since a rate over zero elapsed time is undefined.
/// Iteration allocates nothing and `iter` can be called any number of
/// times.
#[derive(Debug, Clone, PartialEq)]
pub struct WpmCurve {
    delays: Vec<f64>,
    multiplier: f64,
    leading_infinity: bool,
}

impl WpmCurve {
    pub fn new(delays: &[f64], multiplier: f64, adjusted: bool) -> Self {
        let skip = !delays.is_empty() && (adjusted || delays[0] == 0.0);
        Self {
            delays: delays[usize::from(skip)..].to_vec(),
            multiplier,
            leading_infinity: skip,
        }
    }

    /// Number of samples the curve yields: one per keystroke.
    pub fn len(&self) -> usize {
        self.delays.len() + usize::from(self.leading_infinity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> WpmCurveIter<'_> {
        WpmCurveIter {
            delays: &self.delays,
            multiplier: self.multiplier,
            index: 0,
            elapsed_ms: 0.0,
            pending_infinity: self.leading_infinity,
        }
    }

    /// All samples paired with their cumulative timestamps.
    pub fn points(&self) -> Vec<CurvePoint> {
        let mut elapsed_ms = 0.0;
        let mut points = Vec::with_capacity(self.len());
        if self.leading_infinity {
            points.push(CurvePoint {
                ms: 0.0,
                wpm: f64::INFINITY,
            });
        }
        for (i, delay) in self.delays.iter().enumerate() {
            elapsed_ms += delay;
            points.push(CurvePoint {
                ms: elapsed_ms,
                wpm: average_wpm(i + 1, elapsed_ms, self.multiplier),
            });
        }
        points
    }
}

impl<'a> IntoIterator for &'a WpmCurve {
    type Item = f64;
    type IntoIter = WpmCurveIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct WpmCurveIter<'a> {
    delays: &'a [f64],
    multiplier: f64,
    index: usize,
    elapsed_ms: f64,
    pending_infinity: bool,
}

impl Iterator for WpmCurveIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.pending_infinity {
            self.pending_infinity = false;
            return Some(f64::INFINITY);
        }
        let delay = self.delays.get(self.index)?;
        self.elapsed_ms += delay;
        self.index += 1;
        Some(average_wpm(self.index, self.elapsed_ms, self.multiplier))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining =
            self.delays.len() - self.index + usize::from(self.pending_infinity);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WpmCurveIter<'_> {}

fn average_wpm(chars: usize, elapsed_ms: f64, multiplier: f64) -> f64 {
    if elapsed_ms == 0.0 {
        f64::INFINITY
    } else {
        multiplier * chars as f64 / elapsed_ms
    }
}
