// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer invariant.
//!
//! Every statement in this crate, reads included, runs as a closure on the
//! one background thread owned by the crate's single `tokio_rusqlite`
//! connection. `Database` clones share that thread, so opening the database
//! once per process is what enforces the invariant.
//!
//! **Do NOT open a second `Database` against the same file.**

// Two pieces of the conversation backend lean on serialized statements:
//
// - Unread counters are bumped with `count = count + 1` in a single UPDATE.
//   Two bot replies landing in the same chat back to back can never
//   interleave the read-modify-write.
// - Chat creation races resolve inside SQLite: the losing
//   `INSERT .. ON CONFLICT DO NOTHING` queues behind the winner and the
//   follow-up SELECT sees the winner's row.
