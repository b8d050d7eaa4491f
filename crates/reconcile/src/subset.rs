//! Projection of live state onto what a desired tree manages

use serde_json::Value;

/// Remove from `real` every object key that `desired` does not set.
///
/// Objects recurse key by key and arrays recurse pairwise, so live entries
/// only survive where the desired tree has a counterpart. Array elements past
/// the end of the desired array are kept as they are. Keys whose desired
/// value is `null` count as unset.
pub fn project(real: &Value, desired: &Value) -> Value {
    match (real, desired) {
        (Value::Object(live), Value::Object(want)) => Value::Object(
            live.iter()
                .filter_map(|(key, value)| {
                    let want = want.get(key).filter(|v| !v.is_null())?;
                    Some((key.clone(), project(value, want)))
                })
                .collect(),
        ),
        (Value::Array(live), Value::Array(want)) => Value::Array(
            live.iter()
                .enumerate()
                .map(|(i, value)| match want.get(i) {
                    Some(want) => project(value, want),
                    None => value.clone(),
                })
                .collect(),
        ),
        _ => real.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unmanaged_keys_dropped() {
        let real = json!({
            "metadata": {"name": "a", "uid": "1234", "labels": {"app": "x", "extra": "y"}},
            "status": {"phase": "Running"},
        });
        let desired = json!({"metadata": {"name": "a", "labels": {"app": "x"}}});

        assert_eq!(
            project(&real, &desired),
            json!({"metadata": {"name": "a", "labels": {"app": "x"}}})
        );
    }

    #[test]
    fn test_arrays_pairwise() {
        let real = json!({"ports": [{"port": 80, "proto": "TCP"}, {"port": 443, "proto": "TCP"}]});
        let desired = json!({"ports": [{"port": 8080}]});

        assert_eq!(
            project(&real, &desired),
            json!({"ports": [{"port": 80}, {"port": 443, "proto": "TCP"}]})
        );
    }

    #[test]
    fn test_differing_values_survive() {
        let real = json!({"data": {"key": "old"}, "replicas": 2});
        let desired = json!({"data": {"key": "new"}, "replicas": null});
        assert_eq!(project(&real, &desired), json!({"data": {"key": "old"}}));
    }

    #[test]
    fn test_type_mismatch_keeps_live_value() {
        let real = json!({"data": "flat"});
        let desired = json!({"data": {"nested": true}});
        assert_eq!(project(&real, &desired), real);
    }
}
