// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

#[cfg(feature = "gemini")]
pub mod gemini;
