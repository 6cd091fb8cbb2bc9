//! Plaintext exposition format (`# HELP`, `# TYPE`, `name value`) helpers.

/// A single gauge series as written to the metrics file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMetric<'a> {
    pub name: &'a str,
    pub help: &'a str,
    pub value: f64,
}

impl ExportedMetric<'_> {
    pub fn render(&self) -> String {
        format!(
            "# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}\n",
            name = self.name,
            help = escape_help(self.help),
            value = format_value(self.value),
        )
    }
}

/// Locale-independent rendering. Integral values keep one decimal (`0.0`).
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value > 0.0 { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Reads back the value of the first unlabelled sample named `name`.
pub fn parse_gauge_value(text: &str, name: &str) -> Option<f64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            let series = parts.next()?;
            if series != name {
                return None;
            }
            parse_value(parts.next()?)
        })
}

/// Metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
