use std::cmp::Ordering;

use crate::types::VersionRecord;

fn component_value(component: &str) -> u64 {
    let digits: String = component
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Numeric, component-wise comparison of dotted version strings.
///
/// Missing trailing components count as zero, so `1.0` equals `1.0.0`.
/// Each component compares by its leading digits (`2+8` counts as `2`).
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = a.trim().trim_start_matches('v');
    let b = b.trim().trim_start_matches('v');
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let ordering = component_value(l.unwrap_or("0"))
                    .cmp(&component_value(r.unwrap_or("0")));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Highest version first; equal versions fall back to install path so the
/// order is stable between refreshes.
pub fn sort_records(records: &mut [VersionRecord]) {
    records.sort_by(|a, b| {
        compare_versions(&b.version, &a.version).then_with(|| a.install_path.cmp(&b.install_path))
    });
}
