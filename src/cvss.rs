use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Severity level derived from a CVSS score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvssLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl CvssLevel {
    pub fn label(&self) -> &'static str {
        match self {
            CvssLevel::Info => "info",
            CvssLevel::Low => "low",
            CvssLevel::Medium => "medium",
            CvssLevel::High => "high",
            CvssLevel::Critical => "critical",
        }
    }

    /// 1-based ordinal, info lowest
    pub fn number(&self) -> u8 {
        match self {
            CvssLevel::Info => 1,
            CvssLevel::Low => 2,
            CvssLevel::Medium => 3,
            CvssLevel::High => 4,
            CvssLevel::Critical => 5,
        }
    }
}

impl std::fmt::Display for CvssLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a base score to its severity rating band
pub fn level_from_score(score: f64) -> CvssLevel {
    if score >= 9.0 {
        CvssLevel::Critical
    } else if score >= 7.0 {
        CvssLevel::High
    } else if score >= 4.0 {
        CvssLevel::Medium
    } else if score > 0.0 {
        CvssLevel::Low
    } else {
        CvssLevel::Info
    }
}

pub fn level_number_from_score(score: f64) -> u8 {
    level_from_score(score).number()
}

/// Compute the CVSS v3.x base score for a vector string.
///
/// Unknown versions, malformed vectors, and vectors missing required base
/// metrics all score 0.0 rather than failing; an unscorable finding ranks
/// as informational.
pub fn calculate_score(vector: &str) -> f64 {
    let rest = match vector
        .strip_prefix("CVSS:3.1/")
        .or_else(|| vector.strip_prefix("CVSS:3.0/"))
    {
        Some(r) => r,
        None => return 0.0,
    };

    let mut metrics: HashMap<&str, &str> = HashMap::new();
    for part in rest.split('/') {
        match part.split_once(':') {
            Some((k, v)) if !k.is_empty() && !v.is_empty() => {
                metrics.insert(k, v);
            }
            _ => return 0.0,
        }
    }

    base_score(&metrics).unwrap_or(0.0)
}

fn base_score(metrics: &HashMap<&str, &str>) -> Option<f64> {
    let scope_changed = match *metrics.get("S")? {
        "U" => false,
        "C" => true,
        _ => return None,
    };

    let av = match *metrics.get("AV")? {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };
    let ac = match *metrics.get("AC")? {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };
    // PR weights shift when scope changes
    let pr = match (*metrics.get("PR")?, scope_changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let ui = match *metrics.get("UI")? {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };

    let c = impact_weight(metrics.get("C")?)?;
    let i = impact_weight(metrics.get("I")?)?;
    let a = impact_weight(metrics.get("A")?)?;

    let iss = 1.0 - (1.0 - c) * (1.0 - i) * (1.0 - a);
    let impact = if scope_changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02).powi(15)
    } else {
        6.42 * iss
    };
    let exploitability = 8.22 * av * ac * pr * ui;

    if impact <= 0.0 {
        return Some(0.0);
    }
    let raw = if scope_changed {
        1.08 * (impact + exploitability)
    } else {
        impact + exploitability
    };
    Some(roundup(raw.min(10.0)))
}

fn impact_weight(v: &str) -> Option<f64> {
    match v {
        "H" => Some(0.56),
        "L" => Some(0.22),
        "N" => Some(0.0),
        _ => None,
    }
}

/// Round up to one decimal as mandated by the CVSS v3.1 specification
/// (appendix A); plain `ceil` accumulates float artifacts.
fn roundup(x: f64) -> f64 {
    let scaled = (x * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) as f64 + 1.0) / 10.0
    }
}
