// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Number formatting shared by the context document and the CLI summaries.

/// Format a number with `,` thousands separators (`1234567` -> `1,234,567`).
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Format a relevance score with two decimal places.
pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}
