//! Nullable column values
//!
//! [`Nullable<T>`] carries a relational column that may be SQL `NULL`. It
//! decodes from any sqlx row whose driver can decode `T`, and serializes to
//! JSON `null` when absent and to the native JSON value otherwise.
//!
//! Unlike a bare `Option<T>`, a `Nullable<T>` struct field has no implicit
//! serde default: a missing key is a deserialization error while an explicit
//! `null` is accepted. Request schemas use this to require a key whose value
//! may legitimately be null.

use std::fmt;
use std::marker::PhantomData;

use serde::de::value::{BorrowedStrDeserializer, MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::error::BoxDynError;
use sqlx::{ColumnIndex, Database, Decode, Row, Type, ValueRef};

use crate::error::StorageError;

/// A value that may be SQL `NULL` / JSON `null`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Nullable<T>(pub Option<T>);

impl<T> Nullable<T> {
    /// The NULL value
    pub const fn null() -> Self {
        Self(None)
    }

    /// A present value
    pub const fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl Nullable<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.0
    }
}

impl From<&str> for Nullable<String> {
    fn from(value: &str) -> Self {
        Self(Some(value.to_string()))
    }
}

impl From<i64> for Nullable<i64> {
    fn from(value: i64) -> Self {
        Self(Some(value))
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

// Goes through `deserialize_any` rather than `deserialize_option` so that
// serde's missing-field path reports an error instead of yielding `None`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NullableVisitor(PhantomData))
    }
}

struct NullableVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for NullableVisitor<T> {
    type Value = Nullable<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a value or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Nullable(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Nullable(None))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        T::deserialize(deserializer).map(Nullable::new)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> Result<Self::Value, E> {
        T::deserialize(BorrowedStrDeserializer::new(v)).map(Nullable::new)
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        T::deserialize(IntoDeserializer::<'de, E>::into_deserializer(v)).map(Nullable::new)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        T::deserialize(SeqAccessDeserializer::new(seq)).map(Nullable::new)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map)).map(Nullable::new)
    }
}

impl<DB: Database, T: Type<DB>> Type<DB> for Nullable<T> {
    fn type_info() -> DB::TypeInfo {
        T::type_info()
    }

    fn compatible(ty: &DB::TypeInfo) -> bool {
        T::compatible(ty)
    }
}

impl<'r, DB: Database, T: Decode<'r, DB>> Decode<'r, DB> for Nullable<T> {
    fn decode(value: DB::ValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Self(None));
        }
        T::decode(value).map(|v| Self(Some(v)))
    }
}

/// Read one column of `row` as a [`Nullable<T>`].
///
/// NULL always decodes successfully. A non-NULL value whose SQL type is not
/// compatible with `T` yields [`StorageError::TypeMismatch`].
pub fn decode_column<'r, R, T>(
    row: &'r R,
    column: &'static str,
) -> Result<Nullable<T>, StorageError>
where
    R: Row,
    &'static str: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Nullable<T>, _>(column)
        .map_err(|e| StorageError::from_sqlx("decode", e))
}
