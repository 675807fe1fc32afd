// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod record;
pub mod sheets;
pub mod token;

pub use record::{Record, RecordForm, StoredRecord};
pub use sheets::{AppendConfirmation, RangeSpec};
pub use token::{AccessToken, TokenSet};
