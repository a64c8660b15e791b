//! Database enum types with Diesel serialization.
//!
//! This module provides type-safe enum wrappers for database CHECK constraints.
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// Session status.
///
/// Maps to `tutorial_group_session.status` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum SessionStatus {
    Active,
    Cancelled,
}

impl ToSql<Text, Pg> for SessionStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let s = match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        };
        out.write_all(s.as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for SessionStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"active" => Ok(Self::Active),
            b"cancelled" => Ok(Self::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl SessionStatus {
    /// Returns the database string representation of this session status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<SessionStatus> for tutorium_core::types::SessionStatus {
    fn from(db_status: SessionStatus) -> Self {
        match db_status {
            SessionStatus::Active => Self::Active,
            SessionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<tutorium_core::types::SessionStatus> for SessionStatus {
    fn from(core_status: tutorium_core::types::SessionStatus) -> Self {
        match core_status {
            tutorium_core::types::SessionStatus::Active => Self::Active,
            tutorium_core::types::SessionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
