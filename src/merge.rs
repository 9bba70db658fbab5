use toml::{Table, Value};

/// Deep-merge `overlay` on top of `base`.
///
/// Tables present on both sides merge recursively. Anything else, arrays
/// included, is replaced by the overlay's value.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        let merged = match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                Value::Table(deep_merge(base_tbl, overlay_tbl))
            }
            (_, overlay_val) => overlay_val,
        };
        base.insert(key, merged);
    }
    base
}

/// Folds layers lowest priority first.
pub fn merge_all(layers: impl IntoIterator<Item = Table>) -> Table {
    layers.into_iter().fold(Table::new(), deep_merge)
}
