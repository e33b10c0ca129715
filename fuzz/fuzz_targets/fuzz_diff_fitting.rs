// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

#![no_main]

use libfuzzer_sys::fuzz_target;

use commitflow::services::fitting::{DEFAULT_EXCLUDES, ExclusionSet, filter_excluded, fit_diff};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let limit = usize::from(u16::from_le_bytes([data[0], data[1]]));
    let Ok(diff) = std::str::from_utf8(&data[2..]) else {
        return;
    };

    let Ok(exclusions) = ExclusionSet::new(DEFAULT_EXCLUDES) else {
        return;
    };
    let filtered = filter_excluded(diff, &exclusions);
    let fit = fit_diff(diff, &exclusions, limit);

    if filtered.chars().count() <= limit {
        assert_eq!(fit.fitted_diff, filtered);
        assert!(!fit.was_modified);
    } else {
        assert!(fit.fitted_diff.chars().count() <= limit);
        assert!(fit.was_modified);
    }
});
