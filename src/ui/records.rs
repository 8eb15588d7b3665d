use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

const RECORDS_FILE_NAME: &str = "records.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Records {
    pub best_time_secs: Option<f64>,
}

/// What a finished game produced, for the game-over dialog.
#[derive(Clone, Copy, Debug)]
pub struct GameOutcome {
    pub duration_secs: f64,
    pub best_secs: f64,
    pub improved: bool,
}

pub fn format_mm_ss(total_secs: f64) -> String {
    let whole = total_secs.max(0.0) as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

fn records_path() -> PathBuf {
    glib::user_config_dir().join("pairshot").join(RECORDS_FILE_NAME)
}

pub fn load_records() -> Records {
    let path = records_path();
    match fs::read_to_string(&path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            glib::g_warning!("pairshot", "ignoring malformed {}: {err}", path.display());
            Records::default()
        }),
        Err(_) => Records::default(),
    }
}

pub fn save_records(records: &Records) {
    let path = records_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match serde_json::to_string_pretty(records) {
        Ok(raw) => {
            if let Err(err) = fs::write(&path, raw) {
                glib::g_warning!("pairshot", "failed to write {}: {err}", path.display());
            }
        }
        Err(err) => glib::g_warning!("pairshot", "failed to encode records: {err}"),
    }
}

/// Folds a finished game into the records. The stored best time only ever
/// decreases: it is replaced when the new duration is strictly lower.
pub fn register_result(records: &mut Records, duration_secs: f64) -> GameOutcome {
    let improved = records
        .best_time_secs
        .is_none_or(|best| duration_secs < best);
    if improved {
        records.best_time_secs = Some(duration_secs);
        save_records(records);
    }
    GameOutcome {
        duration_secs,
        best_secs: records.best_time_secs.unwrap_or(duration_secs),
        improved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_result_becomes_best() {
        let mut records = Records::default();
        let outcome = register_result(&mut records, 93.4);
        assert!(outcome.improved);
        assert_eq!(records.best_time_secs, Some(93.4));
    }

    #[test]
    fn best_time_only_decreases() {
        let mut records = Records {
            best_time_secs: Some(60.0),
        };

        let slower = register_result(&mut records, 72.5);
        assert!(!slower.improved);
        assert_eq!(records.best_time_secs, Some(60.0));
        assert_eq!(slower.best_secs, 60.0);

        let equal = register_result(&mut records, 60.0);
        assert!(!equal.improved);
        assert_eq!(records.best_time_secs, Some(60.0));

        let faster = register_result(&mut records, 41.2);
        assert!(faster.improved);
        assert_eq!(records.best_time_secs, Some(41.2));
        assert_eq!(faster.best_secs, 41.2);
    }

    #[test]
    fn records_round_trip_as_json() {
        let records = Records {
            best_time_secs: Some(123.75),
        };
        let raw = serde_json::to_string(&records).unwrap();
        let back: Records = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.best_time_secs, Some(123.75));

        let empty: Records = serde_json::from_str("{}").unwrap_or_default();
        assert_eq!(empty.best_time_secs, None);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0.0), "00:00");
        assert_eq!(format_mm_ss(59.9), "00:59");
        assert_eq!(format_mm_ss(83.0), "01:23");
        assert_eq!(format_mm_ss(600.0), "10:00");
        assert_eq!(format_mm_ss(-3.0), "00:00");
    }
}
