use chrono::{DateTime, Utc};

use shared::models::AttendanceSummary;
use shared::utils::slugify;

/// Storage key of the archived session video: the channel name plus the
/// session date with its slashes flattened.
pub fn video_key(channel: &str, display_date: &str) -> String {
    format!("{}_{}.mp4", channel, display_date.replace('/', "-"))
}

/// Storage key of the attendance roster. Derived only from values persisted
/// with the recording, so a resumed run rebuilds the same key and URL.
pub fn roster_key(topic: &str, session_date: &DateTime<Utc>) -> String {
    format!("{}-{}.txt", slugify(topic), session_date.format("%d-%m-%Y"))
}

/// Render the plain-text roster that gets archived next to the video. The
/// attendance lists arrive already sorted, which keeps the output stable
/// across reruns.
pub fn render_roster(
    topic: &str,
    session_date: &DateTime<Utc>,
    attendance: &AttendanceSummary,
) -> String {
    let mut text = String::new();
    text.push_str("ATTENDANCE ROSTER\n");
    text.push_str(&format!(
        "Course: {} - {}\n",
        topic,
        session_date.format("%d/%m/%Y")
    ));
    text.push('\n');

    text.push_str("Present for the whole class:\n");
    for record in &attendance.full {
        text.push_str(&record.name);
        text.push('\n');
    }
    text.push('\n');

    text.push_str("Present for part of the class:\n");
    for record in &attendance.partial {
        text.push_str(&record.name);
        text.push('\n');
    }
    text.push('\n');

    text.push_str(
        "* If you attended this class and cannot find your name here, contact the \
         teaching staff. And remember to set your real name in your meeting profile.\n",
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::AttendanceRecord;

    fn record(name: &str, seconds: u64, percentage: f64) -> AttendanceRecord {
        AttendanceRecord {
            name: name.to_string(),
            seconds,
            percentage,
        }
    }

    fn session_date() -> DateTime<Utc> {
        "2024-10-21T18:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_video_key_flattens_the_display_date() {
        assert_eq!(
            video_key("datavis-studio", "21/10/24"),
            "datavis-studio_21-10-24.mp4"
        );
    }

    #[test]
    fn test_roster_key_slugs_the_topic() {
        assert_eq!(
            roster_key("Datavis Studio II", &session_date()),
            "datavis-studio-ii-21-10-2024.txt"
        );
    }

    #[test]
    fn test_roster_layout_is_stable() {
        let attendance = AttendanceSummary {
            full: vec![record("Ana", 7000, 64.81)],
            partial: vec![record("Bruno", 3000, 27.78)],
        };

        let text = render_roster("Datavis Studio", &session_date(), &attendance);

        assert_eq!(
            text,
            "ATTENDANCE ROSTER\n\
             Course: Datavis Studio - 21/10/2024\n\
             \n\
             Present for the whole class:\n\
             Ana\n\
             \n\
             Present for part of the class:\n\
             Bruno\n\
             \n\
             * If you attended this class and cannot find your name here, contact the \
             teaching staff. And remember to set your real name in your meeting profile.\n"
        );
    }

    #[test]
    fn test_empty_sections_still_render_their_headers() {
        let text = render_roster("Datavis Studio", &session_date(), &AttendanceSummary::default());

        assert!(text.contains("Present for the whole class:\n\n"));
        assert!(text.contains("Present for part of the class:\n\n"));
    }
}
