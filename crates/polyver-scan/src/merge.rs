use std::collections::HashSet;

use polyver_backend::{VersionRecord, sort_records};

/// Merge strategy results in priority order.
///
/// The first group to report an install path keeps it; later reports of the
/// same (normalized) path are dropped. The merged list is sorted highest
/// version first.
#[must_use]
pub fn merge_records(groups: Vec<Vec<VersionRecord>>) -> Vec<VersionRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<VersionRecord> = groups
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.normalized_path()))
        .collect();
    sort_records(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use polyver_backend::VersionRecord;

    use super::merge_records;

    #[test]
    fn higher_priority_strategy_wins_for_same_path() {
        let from_command = vec![VersionRecord::new(
            "17.0.9",
            "System JDK",
            PathBuf::from("/nonexistent-polyver/jdk-17/Contents/Home"),
        )];
        let from_walk = vec![
            VersionRecord::new(
                "17",
                "System JDK",
                PathBuf::from("/nonexistent-polyver/jdk-17/Contents/Home/"),
            ),
            VersionRecord::new(
                "21.0.1",
                "System JDK",
                PathBuf::from("/nonexistent-polyver/jdk-21/Contents/Home"),
            ),
        ];

        let merged = merge_records(vec![from_command, from_walk]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].version, "21.0.1");
        assert_eq!(merged[1].version, "17.0.9");
    }

    #[test]
    fn duplicates_within_one_group_collapse() {
        let group = vec![
            VersionRecord::new("1.22", "GVM", PathBuf::from("/nonexistent-polyver/go")),
            VersionRecord::new("1.22", "GVM", PathBuf::from("/nonexistent-polyver/./go")),
        ];

        assert_eq!(merge_records(vec![group]).len(), 1);
    }

    #[test]
    fn empty_groups_merge_to_empty() {
        assert!(merge_records(vec![Vec::new(), Vec::new()]).is_empty());
    }
}
