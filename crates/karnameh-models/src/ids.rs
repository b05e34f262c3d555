//! Strongly-typed ID newtypes for school entities.
//!
//! Every entity id is a `Uuid` underneath. Wrapping each in its own type keeps
//! a `StudentId` from being passed where a `CourseId` is expected, which
//! matters in a domain where every record carries six ids side by side.
//!
//! Ids order like their UUIDs; report listings use that order to break ties.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Defines a `Uuid` newtype with serde, SQLx and OpenAPI support.
///
/// The newtype is transparent on the wire and in Postgres: it encodes as a
/// plain `uuid` column and a plain JSON string.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, ToSchema, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_u128(v: u128) -> Self {
                Self(Uuid::from_u128(v))
            }

            #[inline]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

define_id!(
    /// Id of a school; every record is scoped to one.
    SchoolId
);

define_id!(
    /// Id of a class (a cohort of students).
    ClassId
);

define_id!(StudentId);

define_id!(TeacherId);

define_id!(CourseId);

define_id!(
    /// Id of a stored lesson record.
    LessonRecordId
);

define_id!(
    /// Id of an assessment weight override.
    AssessmentWeightId
);
