//! Per-kind instance ordinals

use dashmap::DashMap;
use once_cell::sync::Lazy;

static ORDINALS: Lazy<DashMap<String, usize>> = Lazy::new(DashMap::new);

/// Next process-unique instance name for `kind`, e.g. `PlusAgent0`,
/// `PlusAgent1`. Each kind counts independently.
pub fn next_name(kind: &str) -> String {
    let mut ordinal = ORDINALS.entry(kind.to_string()).or_insert(0);
    let name = format!("{kind}{}", *ordinal);
    *ordinal += 1;
    name
}
