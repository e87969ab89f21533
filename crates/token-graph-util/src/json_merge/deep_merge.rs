use serde_json::{Map, Value};

/// Merges `overlay` into `base` in place.
///
/// When both sides hold an object they are merged key by key, unless both
/// are leaves according to `is_leaf`; a leaf object then replaces the base
/// wholesale. A leaf meeting a non-leaf object is merged like any other
/// object. Non-object values are always replaced. Keys already present in
/// `base` keep their position; new keys are appended in overlay order.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use token_graph_util::deep_merge;
///
/// let mut base = json!({"a": {"x": 1, "y": 2}, "b": 1});
/// let overlay = json!({"a": {"y": 3, "z": 4}});
/// deep_merge(&mut base, &overlay, &|_| false);
/// assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": 1}));
/// ```
pub fn deep_merge(base: &mut Value, overlay: &Value, is_leaf: &dyn Fn(&Map<String, Value>) -> bool) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        if !(is_leaf(base_map) && is_leaf(overlay_map)) {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val, is_leaf),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
            return;
        }
    }
    *base = overlay.clone();
}

/// Folds a list of layers into one value, later layers winning.
///
/// Returns an empty object for an empty list.
pub fn deep_merge_all<'a, I>(layers: I, is_leaf: &dyn Fn(&Map<String, Value>) -> bool) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        deep_merge(&mut merged, layer, is_leaf);
    }
    merged
}
