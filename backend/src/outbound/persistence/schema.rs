//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Registered voters.
    ///
    /// `votes` is the lifetime quota and `voted_count` the number already
    /// cast; a check constraint keeps `voted_count` within `0..=votes`.
    users (id) {
        id -> Int4,
        name -> Varchar,
        address -> Varchar,
        /// National identity number, unique per voter.
        mynumber -> Varchar,
        votes -> Int4,
        voted_count -> Int4,
    }
}

diesel::table! {
    /// Candidates standing in the election.
    candidates (id) {
        id -> Int4,
        name -> Varchar,
        political_party -> Varchar,
        sex -> Varchar,
        /// Cumulative votes received, maintained alongside vote rows.
        voted_count -> Int4,
    }
}

diesel::table! {
    /// Vote records, unique per (user, candidate, keyword).
    votes (id) {
        id -> Int8,
        user_id -> Int4,
        candidate_id -> Int4,
        keyword -> Varchar,
        voted_count -> Int4,
    }
}

diesel::joinable!(votes -> users (user_id));
diesel::joinable!(votes -> candidates (candidate_id));

diesel::allow_tables_to_appear_in_same_query!(users, candidates, votes);
