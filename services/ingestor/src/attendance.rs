use std::collections::HashMap;

use lectern_zoom_connector::ParticipantSegment;
use shared::models::{AttendanceRecord, AttendanceSummary};
use shared::utils::fold_diacritics;

/// Aggregate join intervals into one entry per person and classify each
/// against the threshold. Both result lists come back sorted by name.
///
/// Names are the only identity the provider exposes. Case, diacritics and
/// stray whitespace are folded before grouping, so "João" and " joao " count
/// as one person; a typo still fragments someone's attendance into two
/// entries.
pub fn compute_attendance(
    segments: &[ParticipantSegment],
    session_duration_secs: u32,
    full_threshold_percent: f64,
) -> AttendanceSummary {
    let mut records: Vec<AttendanceRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for segment in segments {
        let display = segment.name.trim();
        match index.get(&normalize_name(display)) {
            Some(&i) => records[i].seconds += segment.duration,
            None => {
                index.insert(normalize_name(display), records.len());
                records.push(AttendanceRecord {
                    name: display.to_string(),
                    seconds: segment.duration,
                    percentage: 0.0,
                });
            }
        }
    }

    let mut full = Vec::new();
    let mut partial = Vec::new();
    for mut record in records {
        record.percentage = percentage(record.seconds, session_duration_secs);
        if record.percentage > full_threshold_percent {
            full.push(record);
        } else {
            partial.push(record);
        }
    }
    full.sort_by(|a, b| a.name.cmp(&b.name));
    partial.sort_by(|a, b| a.name.cmp(&b.name));

    AttendanceSummary { full, partial }
}

fn normalize_name(name: &str) -> String {
    fold_diacritics(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Share of the scheduled session covered, rounded to two decimals. Rounding
/// happens before classification, so a share that reads as exactly the
/// threshold stays `partial`.
fn percentage(seconds: u64, session_duration_secs: u32) -> f64 {
    if session_duration_secs == 0 {
        return 0.0;
    }
    let raw = seconds as f64 / session_duration_secs as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
