// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

#![no_main]

use libfuzzer_sys::fuzz_target;

use commitflow::domain::CommitType;
use commitflow::services::sanitizer::sanitize_response;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let hint = data.first().and_then(|b| {
        CommitType::ALL
            .get(usize::from(*b) % (CommitType::ALL.len() + 1))
            .and_then(|t| CommitType::parse(t))
    });

    if let Ok(once) = sanitize_response(raw, hint) {
        assert!(!once.is_empty());
        let twice = sanitize_response(&once, hint).expect("sanitized output must sanitize again");
        assert_eq!(once, twice, "sanitizer is not idempotent");
    }
});
