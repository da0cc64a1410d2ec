use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SYNC_URL: &str = "http://localhost:5000/api/sync";

/// Flat settings record persisted under the `nfc_config` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub sheet_id: String,
    pub sheet_name: String,
    pub institution: String,
    pub start_time: String,
    pub tolerance: i64,
    pub notify_sound: bool,
    pub auto_sync: bool,
    pub offline_mode: bool,
    pub sync_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            sheet_name: "Asistencias".to_string(),
            institution: "Mi Escuela".to_string(),
            start_time: "08:00".to_string(),
            tolerance: 15,
            notify_sound: true,
            auto_sync: true,
            offline_mode: true,
            sync_url: DEFAULT_SYNC_URL.to_string(),
        }
    }
}

impl Config {
    pub fn has_sheet(&self) -> bool {
        !self.sheet_id.trim().is_empty()
    }

    /// Validate and merge a partial update. Nothing is applied if any field
    /// is rejected.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            match k.as_str() {
                "sheetId" => next.sheet_id = parse_string_max(v, k, 200)?,
                "sheetName" => next.sheet_name = parse_string_max(v, k, 120)?,
                "institution" => next.institution = parse_string_max(v, k, 200)?,
                "startTime" => next.start_time = parse_clock(v, k)?,
                "tolerance" => next.tolerance = parse_i64_range(v, k, 0, 240)?,
                "notifySound" => next.notify_sound = parse_bool(v, k)?,
                "autoSync" => next.auto_sync = parse_bool(v, k)?,
                "offlineMode" => next.offline_mode = parse_bool(v, k)?,
                "syncUrl" => {
                    let url = parse_string_max(v, k, 500)?;
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        return Err("syncUrl must be an http(s) URL".into());
                    }
                    next.sync_url = url;
                }
                _ => return Err(format!("unknown config field: {}", k)),
            }
        }
        *self = next;
        Ok(())
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    // Form inputs arrive as strings as often as numbers.
    let n = match v {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => v.as_i64(),
    }
    .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_clock(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 5)?;
    chrono::NaiveTime::parse_from_str(&s, "%H:%M")
        .map_err(|_| format!("{} must be HH:MM", key))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg: Config = serde_json::from_value(json!({ "sheetId": "abc" })).expect("config");
        assert_eq!(cfg.sheet_id, "abc");
        assert_eq!(cfg.tolerance, 15);
        assert!(cfg.auto_sync);
        assert_eq!(cfg.sync_url, DEFAULT_SYNC_URL);
    }

    #[test]
    fn patch_is_all_or_nothing() {
        let mut cfg = Config::default();
        let patch = json!({ "institution": "Liceo", "tolerance": "999" });
        let err = cfg
            .apply_patch(patch.as_object().expect("object"))
            .expect_err("tolerance out of range");
        assert!(err.contains("tolerance"));
        assert_eq!(cfg.institution, "Mi Escuela");

        let patch = json!({ "institution": " Liceo ", "tolerance": "10", "startTime": "07:30" });
        cfg.apply_patch(patch.as_object().expect("object"))
            .expect("valid patch");
        assert_eq!(cfg.institution, "Liceo");
        assert_eq!(cfg.tolerance, 10);
        assert_eq!(cfg.start_time, "07:30");
    }

    #[test]
    fn unknown_fields_and_bad_clock_are_rejected() {
        let mut cfg = Config::default();
        let patch = json!({ "color": "red" });
        assert!(cfg.apply_patch(patch.as_object().expect("object")).is_err());
        let patch = json!({ "startTime": "25:99" });
        assert!(cfg.apply_patch(patch.as_object().expect("object")).is_err());
        let patch = json!({ "syncUrl": "ftp://x" });
        assert!(cfg.apply_patch(patch.as_object().expect("object")).is_err());
    }
}
