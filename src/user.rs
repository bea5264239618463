use {
    rocket::{
        Request,
        outcome::Outcome,
        request::{
            self,
            FromRequest,
        },
    },
    crate::prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Athlete,
    Organizer,
    Admin,
}

impl Role {
    /// Whether this role may create matches, edit results, and drive tournament progression.
    pub(crate) fn can_manage_matches(&self) -> bool {
        matches!(self, Self::Organizer | Self::Admin)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct User {
    pub(crate) id: Id<Users>,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: Role,
}

impl User {
    pub(crate) async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<Users>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    pub(crate) async fn from_email(transaction: &mut Transaction<'_, Postgres>, email: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, name, email, role FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut **transaction)
            .await
    }

    async fn from_api_token(pool: &PgPool, token: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT users.id, users.name, users.email, users.role FROM users JOIN api_tokens ON api_tokens.user_id = users.id WHERE api_tokens.token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, ()> {
        let Some(token) = req.headers().get_one("Authorization").and_then(|header| header.strip_prefix("Bearer ")) else {
            return Outcome::Error((Status::Unauthorized, ()))
        };
        let pool = req.guard::<&State<PgPool>>().await.expect("missing database pool");
        match Self::from_api_token(pool, token).await {
            Ok(Some(user)) => Outcome::Success(user),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                log::error!("database error while resolving API token: {e}");
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
