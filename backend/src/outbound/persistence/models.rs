//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use diesel::prelude::*;

use super::schema::{candidates, users, votes};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoterRow {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub mynumber: String,
    pub votes: i32,
    pub voted_count: i32,
}

/// Row struct for reading from the candidates table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = candidates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CandidateRow {
    pub id: i32,
    pub name: String,
    pub political_party: String,
    pub sex: String,
}

/// Insertable struct for vote records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow<'a> {
    pub user_id: i32,
    pub candidate_id: i32,
    pub keyword: &'a str,
    pub voted_count: i32,
}
