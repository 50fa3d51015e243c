use serde::{Deserialize, Serialize};

/// What the weights of a profile measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueUnit {
    /// Plain counts (sample counts, arbitrary weights).
    #[default]
    None,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    /// Memory in bytes.
    Bytes,
}

impl ValueUnit {
    /// Multiplier converting a value in this unit into seconds, for time units.
    pub fn to_seconds_factor(&self) -> Option<f64> {
        match self {
            Self::Nanoseconds => Some(1e-9),
            Self::Microseconds => Some(1e-6),
            Self::Milliseconds => Some(1e-3),
            Self::Seconds => Some(1.0),
            Self::None | Self::Bytes => None,
        }
    }

    /// Format a value in this unit for display.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Self::None => format_grouped(value),
            Self::Bytes => format_bytes(value),
            Self::Nanoseconds | Self::Microseconds | Self::Milliseconds | Self::Seconds => {
                let factor = self.to_seconds_factor().unwrap_or(1.0);
                let sign = if value < 0.0 { "-" } else { "" };
                format!("{sign}{}", format_seconds(value.abs() * factor))
            }
        }
    }
}

impl std::fmt::Display for ValueUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Nanoseconds => write!(f, "nanoseconds"),
            Self::Microseconds => write!(f, "microseconds"),
            Self::Milliseconds => write!(f, "milliseconds"),
            Self::Seconds => write!(f, "seconds"),
            Self::Bytes => write!(f, "bytes"),
        }
    }
}

fn format_seconds(s: f64) -> String {
    if s / 60.0 >= 1.0 {
        let minutes = (s / 60.0).floor();
        let seconds = (s - minutes * 60.0).floor();
        format!("{}:{:02}", minutes as u64, seconds as u64)
    } else if s >= 1.0 {
        format!("{s:.2}s")
    } else if s / 1e-3 >= 1.0 {
        format!("{:.2}ms", s / 1e-3)
    } else if s / 1e-6 >= 1.0 {
        format!("{:.2}µs", s / 1e-6)
    } else {
        format!("{:.2}ns", s / 1e-9)
    }
}

fn format_bytes(value: f64) -> String {
    const KIB: f64 = 1024.0;
    if value < KIB {
        return format!("{value:.0} B");
    }
    let mut v = value / KIB;
    if v < KIB {
        return format!("{v:.2} KB");
    }
    v /= KIB;
    if v < KIB {
        return format!("{v:.2} MB");
    }
    format!("{:.2} GB", v / KIB)
}

/// Thousands separators, at most three fractional digits.
fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc();
    let millis = ((rounded - whole) * 1000.0).round() as u64;
    let digits = format!("{}", whole as u64);

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    if value < 0.0 && rounded > 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}
