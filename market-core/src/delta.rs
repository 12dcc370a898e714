//! Semantic diff of two research payload `data` blocks (§4.6).

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Relative-change threshold for numeric fields.
pub const NUMERIC_THRESHOLD: f64 = 0.02;

/// Fields whose change is always treated as significant, regardless of magnitude.
pub const ALWAYS_SIGNIFICANT: [&str; 4] = ["earnings_date", "consensus", "golden_cross", "death_cross"];

/// Fields ignored entirely when comparing two payloads.
///
/// `_source` (not plain `source`) is the field name the wire contract uses.
pub const IGNORE_FIELDS: [&str; 3] = ["_ts", "_source", "data_age_s"];

/// True when `old` and `new` differ in a way that counts as a significant change.
///
/// Symmetric: `is_significant_change(a, b) == is_significant_change(b, a)`.
/// Reflexive-false: `is_significant_change(x, x) == false`.
#[must_use]
pub fn is_significant_change(old: &Value, new: &Value) -> bool {
    value_changed(old, new, None)
}

fn value_changed(old: &Value, new: &Value, field: Option<&str>) -> bool {
    if let Some(f) = field {
        if IGNORE_FIELDS.contains(&f) {
            return false;
        }
        if ALWAYS_SIGNIFICANT.contains(&f) {
            return old != new;
        }
    }

    match (old, new) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            numeric_significant(a, b)
        }
        (Value::Array(a), Value::Array(b)) => {
            let sa: HashSet<String> = a.iter().map(value_sort_key).collect();
            let sb: HashSet<String> = b.iter().map(value_sort_key).collect();
            sa != sb
        }
        (Value::Object(a), Value::Object(b)) => {
            let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
            keys.into_iter().any(|k| {
                if IGNORE_FIELDS.contains(&k.as_str()) {
                    return false;
                }
                let av = a.get(k).unwrap_or(&Value::Null);
                let bv = b.get(k).unwrap_or(&Value::Null);
                value_changed(av, bv, Some(k.as_str()))
            })
        }
        _ => old != new,
    }
}

fn value_sort_key(v: &Value) -> String {
    v.to_string()
}

fn numeric_significant(a: f64, b: f64) -> bool {
    if (a == 0.0) != (b == 0.0) {
        return true;
    }
    if a == 0.0 && b == 0.0 {
        return false;
    }
    ((b - a) / a).abs() >= NUMERIC_THRESHOLD
}

/// Compute the significant-change flag between two full `data` maps.
#[must_use]
pub fn detect_delta(old: &HashMap<String, Value>, new: &HashMap<String, Value>) -> bool {
    let sections: HashSet<&String> = old.keys().chain(new.keys()).collect();
    sections.into_iter().any(|section| {
        let ov = old.get(section).unwrap_or(&Value::Null);
        let nv = new.get(section).unwrap_or(&Value::Null);
        is_significant_change(ov, nv)
    })
}

/// For each section, mark it stale when `now - _fetched_at > ttl[section]`.
///
/// Populated on read, not write: writers stamp `_fetched_at` and move
/// on, readers decide what counts as stale against the current clock.
#[must_use]
pub fn compute_stale_fields(
    data: &HashMap<String, Value>,
    ttl_for_section: impl Fn(&str) -> Option<Duration>,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut stale = Vec::new();
    for (section, value) in data {
        let Some(ttl) = ttl_for_section(section) else {
            continue;
        };
        let Some(fetched_at) = value.get("_fetched_at").and_then(Value::as_str) else {
            continue;
        };
        let Ok(fetched_at) = DateTime::parse_from_rfc3339(fetched_at) else {
            continue;
        };
        let age = (now - fetched_at.with_timezone(&Utc)).num_seconds().max(0) as u64;
        if age > ttl.as_secs() {
            stale.push(section.clone());
        }
    }
    stale.sort();
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_payloads_never_significant() {
        let a = json!({"price": 100.0, "tags": ["a", "b"], "_ts": 1});
        assert!(!is_significant_change(&a, &a.clone()));
    }

    #[test]
    fn symmetric() {
        let a = json!({"price": 100.0});
        let b = json!({"price": 103.0});
        assert_eq!(is_significant_change(&a, &b), is_significant_change(&b, &a));
    }

    #[test]
    fn ignore_fields_never_significant() {
        let a = json!({"_ts": 1, "_source": "yahoo", "data_age_s": 5});
        let b = json!({"_ts": 999, "_source": "fmp", "data_age_s": 999});
        assert!(!is_significant_change(&a, &b));
    }

    #[test]
    fn always_significant_fields_force_true() {
        let a = json!({"golden_cross": false});
        let b = json!({"golden_cross": true});
        assert!(is_significant_change(&a, &b));
    }

    #[test]
    fn small_numeric_drift_is_not_significant() {
        let a = json!({"price": 100.0});
        let b = json!({"price": 100.5});
        assert!(!is_significant_change(&a, &b));
    }

    #[test]
    fn large_numeric_drift_is_significant() {
        let a = json!({"price": 100.0});
        let b = json!({"price": 103.5});
        assert!(is_significant_change(&a, &b));
    }

    #[test]
    fn list_reordering_is_not_significant() {
        let a = json!({"tags": ["a", "b", "c"]});
        let b = json!({"tags": ["c", "a", "b"]});
        assert!(!is_significant_change(&a, &b));
    }

    #[test]
    fn zero_to_nonzero_is_significant() {
        let a = json!({"beat": 0.0});
        let b = json!({"beat": 0.001});
        assert!(is_significant_change(&a, &b));
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn symmetric_for_any_numeric_pair(a in -1_000_000.0f64..1_000_000.0, b in -1_000_000.0f64..1_000_000.0) {
            let old = json!({"price": a});
            let new = json!({"price": b});
            prop_assert_eq!(is_significant_change(&old, &new), is_significant_change(&new, &old));
        }

        #[test]
        fn reflexive_for_any_numeric_value(v in -1_000_000.0f64..1_000_000.0) {
            let payload = json!({"price": v});
            prop_assert!(!is_significant_change(&payload, &payload));
        }

        #[test]
        fn ignore_fields_never_trigger_regardless_of_value(ts_a in any::<i64>(), ts_b in any::<i64>()) {
            let old = json!({"_ts": ts_a});
            let new = json!({"_ts": ts_b});
            prop_assert!(!is_significant_change(&old, &new));
        }
    }
}
