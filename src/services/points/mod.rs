// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod auth;
pub mod daily;
pub mod verifier;

pub use auth::SessionAuthenticator;
pub use daily::DailyRoutine;
pub use verifier::TaskVerifier;
