// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod actions;
pub mod cycle;
pub mod points;
pub mod scheduler;
