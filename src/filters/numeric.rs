use serde::Serialize;

use crate::models::Cell;

/// Number of slider steps across a numeric domain
pub const RANGE_STEPS: f64 = 100.0;
/// Step used when the domain collapses to a single value
pub const FALLBACK_STEP: f64 = 1.0;

/// Result of coercing a cell to a number
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Numeric {
    Value(f64),
    Missing,
}

impl Numeric {
    pub fn value(self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(v),
            Numeric::Missing => None,
        }
    }
}

/// Coerce a cell to a number; anything non-numeric becomes `Missing`
///
/// Text is trimmed and may carry a trailing `%`. A single comma is read as
/// the decimal separator when the text has no dot ("12,5"). The placeholder,
/// NaN and infinities are missing.
pub fn parse_numeric(cell: &Cell, placeholder: &str) -> Numeric {
    match cell {
        Cell::Number(n) if n.is_finite() => Numeric::Value(*n),
        Cell::Text(s) => parse_numeric_text(s, placeholder),
        _ => Numeric::Missing,
    }
}

fn parse_numeric_text(raw: &str, placeholder: &str) -> Numeric {
    let s = raw.trim();
    if s.is_empty() || s == placeholder {
        return Numeric::Missing;
    }
    let s = s.strip_suffix('%').map(str::trim_end).unwrap_or(s);

    let parsed = s.parse::<f64>().ok().or_else(|| {
        if s.matches(',').count() == 1 && !s.contains('.') {
            s.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });

    match parsed {
        Some(v) if v.is_finite() => Numeric::Value(v),
        _ => Numeric::Missing,
    }
}

/// Inclusive range filter over a numeric column
///
/// Missing values always pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericFilter {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub lo: f64,
    pub hi: f64,
    pub missing: usize,
}

impl NumericFilter {
    /// Build a filter spanning the observed domain; `None` when no value parses
    pub fn from_values<I>(column: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Numeric>,
    {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut missing = 0;
        let mut seen = false;

        for value in values {
            match value {
                Numeric::Value(v) => {
                    seen = true;
                    min = min.min(v);
                    max = max.max(v);
                }
                Numeric::Missing => missing += 1,
            }
        }

        if !seen {
            return None;
        }

        let step = if max > min {
            (max - min) / RANGE_STEPS
        } else {
            FALLBACK_STEP
        };

        Some(Self {
            column: column.to_string(),
            min,
            max,
            step,
            lo: min,
            hi: max,
            missing,
        })
    }

    /// A single observed value offers no meaningful range
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn is_active(&self) -> bool {
        self.lo > self.min || self.hi < self.max
    }

    pub fn passes(&self, value: Numeric) -> bool {
        match value {
            Numeric::Value(v) => v >= self.lo && v <= self.hi,
            Numeric::Missing => true,
        }
    }

    pub fn reset(&mut self) {
        self.lo = self.min;
        self.hi = self.max;
    }

    /// Set the selected range, clamped into the domain and ordered
    ///
    /// A NaN bound falls back to the matching domain edge.
    pub fn set_range(&mut self, lo: f64, hi: f64) {
        let lo = if lo.is_nan() { self.min } else { lo };
        let hi = if hi.is_nan() { self.max } else { hi };
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.lo = self.snap(lo.clamp(self.min, self.max));
        self.hi = self.snap(hi.clamp(self.min, self.max));
    }

    /// Move the lower bound by `steps` slider steps
    pub fn nudge_low(&mut self, steps: i32) {
        if self.is_degenerate() {
            return;
        }
        let lo = (self.lo + self.step * steps as f64).clamp(self.min, self.hi);
        self.lo = self.snap(lo);
    }

    /// Move the upper bound by `steps` slider steps
    pub fn nudge_high(&mut self, steps: i32) {
        if self.is_degenerate() {
            return;
        }
        let hi = (self.hi + self.step * steps as f64).clamp(self.lo, self.max);
        self.hi = self.snap(hi);
    }

    /// Carry a previous selection into this (fresh) domain
    pub fn rebase(&mut self, previous: &NumericFilter) {
        if !previous.is_active() {
            return;
        }
        let lo = if previous.lo > previous.min { previous.lo } else { self.min };
        let hi = if previous.hi < previous.max { previous.hi } else { self.max };
        self.set_range(lo, hi);
    }

    /// Pull values within rounding distance of a domain edge onto the edge
    fn snap(&self, v: f64) -> f64 {
        let eps = self.step * 1e-6;
        if (v - self.min).abs() <= eps {
            self.min
        } else if (v - self.max).abs() <= eps {
            self.max
        } else {
            v
        }
    }
}
