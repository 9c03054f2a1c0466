use std::collections::HashMap;

use crate::academy::ProgressRecord;

/// video id -> percent complete, rebuilt from scratch on every reload.
pub type ProgressMap = HashMap<String, i64>;

/// Folds the records in response order; a later record for the same
/// video overwrites the earlier one. Percent values are taken as-is.
pub fn reconcile(records: &[ProgressRecord]) -> ProgressMap {
    let mut map = ProgressMap::with_capacity(records.len());
    for record in records {
        map.insert(record.video_id.clone(), record.percent);
    }
    map
}

/// Entries at or past 100%. Counts map entries only; ids with no
/// matching catalog video still count.
pub fn completed_count(map: &ProgressMap) -> usize {
    map.values().filter(|&&percent| percent >= 100).count()
}
