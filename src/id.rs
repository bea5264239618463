use {
    std::{
        fmt,
        hash::{
            Hash,
            Hasher,
        },
        marker::PhantomData,
        num::ParseIntError,
        str::FromStr,
    },
    rand::Rng as _,
    rocket::request::FromParam,
    serde::{
        Deserializer,
        Serializer,
        de::Error as _,
    },
    sqlx::{
        Decode,
        Encode,
        postgres::{
            PgArgumentBuffer,
            PgTypeInfo,
            PgValueRef,
        },
    },
    crate::prelude::*,
};

pub(crate) trait Table: Send + Sync {
    const NAME: &'static str;
}

macro_rules! table {
    ($ty:ident = $name:literal) => {
        pub(crate) enum $ty {}

        impl Table for $ty {
            const NAME: &'static str = $name;
        }
    };
}

table!(Users = "users");
table!(Competitions = "competitions");
table!(Teams = "teams");
table!(Matches = "matches");
table!(TeamInvites = "team_invites");
table!(TeamJoinRequests = "team_join_requests");

/// A random 64-bit row ID, tagged with the table it belongs to.
/// Stored in Postgres as a `BIGINT` with the same bit pattern.
pub(crate) struct Id<T: Table> {
    inner: u64,
    _table: PhantomData<T>,
}

impl<T: Table> Id<T> {
    /// Generates a new ID that is not yet in use in the table.
    pub(crate) async fn new(transaction: &mut Transaction<'_, Postgres>) -> sqlx::Result<Self> {
        Ok(loop {
            let id = Self::from(rand::rng().random::<u64>());
            let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", T::NAME);
            let exists = sqlx::query_scalar::<_, bool>(&query)
                .bind(i64::from(id))
                .fetch_one(&mut **transaction)
                .await?;
            if !exists { break id }
        })
    }
}

impl<T: Table> From<u64> for Id<T> {
    fn from(inner: u64) -> Self {
        Self { inner, _table: PhantomData }
    }
}

impl<T: Table> From<i64> for Id<T> {
    fn from(inner: i64) -> Self {
        Self::from(inner as u64)
    }
}

impl<T: Table> From<Id<T>> for u64 {
    fn from(id: Id<T>) -> Self {
        id.inner
    }
}

impl<T: Table> From<Id<T>> for i64 {
    fn from(id: Id<T>) -> Self {
        id.inner as Self
    }
}

// manual impls to avoid bounds on the table marker

impl<T: Table> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.inner)
    }
}

impl<T: Table> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<T: Table> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Table> Copy for Id<T> {}

impl<T: Table> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Table> Eq for Id<T> {}

impl<T: Table> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<T: Table> FromStr for Id<T> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, ParseIntError> {
        Ok(Self::from(s.parse::<u64>()?))
    }
}

impl<'a, T: Table> FromParam<'a> for Id<T> {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse().map_err(|_| param)
    }
}

impl<'r, T: Table> rocket::form::FromFormField<'r> for Id<T> {
    fn from_value(field: rocket::form::ValueField<'r>) -> rocket::form::Result<'r, Self> {
        Ok(field.value.parse().map_err(|_| rocket::form::Error::validation("expected a decimal ID"))?)
    }
}

// IDs are serialized as strings since they can exceed the integer range of JSON implementations.

impl<T: Table> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de, T: Table> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl<'r, T: Table> Decode<'r, Postgres> for Id<T> {
    fn decode(value: PgValueRef<'r>) -> Result<Self, Box<dyn std::error::Error + 'static + Send + Sync>> {
        Ok(Self::from(<i64 as Decode<'_, Postgres>>::decode(value)?))
    }
}

impl<'q, T: Table> Encode<'q, Postgres> for Id<T> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Encode::<Postgres>::encode_by_ref(&i64::from(*self), buf)
    }
}

impl<T: Table> sqlx::Type<Postgres> for Id<T> {
    fn type_info() -> PgTypeInfo {
        <i64 as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <i64 as sqlx::Type<Postgres>>::compatible(ty)
    }
}

#[cfg(test)]
mod tests {
    use {
        rocket::form::{
            FromFormField as _,
            ValueField,
        },
        super::*,
    };

    #[test]
    fn ids_parse_from_query_values() {
        assert_eq!(Id::<Competitions>::from_value(ValueField::from_value("42")).unwrap(), Id::from(42_u64));
        assert!(Id::<Competitions>::from_value(ValueField::from_value("not a number")).is_err());
        assert!(Id::<Competitions>::from_value(ValueField::from_value("-1")).is_err());
    }
}
