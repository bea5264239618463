use {
    rand::{
        Rng as _,
        distr::Alphanumeric,
    },
    crate::prelude::*,
};

const BCRYPT_COST: u32 = 10;
const TOKEN_LEN: usize = 32;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) token: String,
    pub(crate) user: User,
}

#[rocket::post("/auth/register", data = "<form>")]
pub(crate) async fn register(pool: &State<PgPool>, form: Json<RegisterForm>) -> Result<Json<User>, ApiError> {
    let form = form.into_inner();
    if form.name.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err(ApiError::bad_request("name, email, and password are required"))
    }
    let password_hash = bcrypt::hash(&form.password, BCRYPT_COST)?;
    let mut transaction = pool.begin().await?;
    if User::from_email(&mut transaction, &form.email).await?.is_some() {
        return Err(ApiError::bad_request("email is already registered"))
    }
    let user = User {
        id: Id::new(&mut transaction).await?,
        name: form.name,
        email: form.email,
        role: form.role.unwrap_or(Role::Athlete),
    };
    sqlx::query("INSERT INTO users (id, name, email, role, password_hash) VALUES ($1, $2, $3, $4, $5)")
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&password_hash)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(user))
}

#[rocket::post("/auth/login", data = "<form>")]
pub(crate) async fn login(pool: &State<PgPool>, form: Json<LoginForm>) -> Result<Json<LoginResponse>, ApiError> {
    let form = form.into_inner();
    let mut transaction = pool.begin().await?;
    // resolve user and hash together so an unknown email and a wrong password are indistinguishable
    let Some(user) = User::from_email(&mut transaction, &form.email).await? else {
        return Err(ApiError(Status::Unauthorized, format!("invalid credentials")))
    };
    let password_hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&mut *transaction)
        .await?;
    if !bcrypt::verify(&form.password, &password_hash)? {
        return Err(ApiError(Status::Unauthorized, format!("invalid credentials")))
    }
    let token = rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect::<String>();
    sqlx::query("INSERT INTO api_tokens (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user.id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(LoginResponse { token, user }))
}

#[rocket::get("/auth/me")]
pub(crate) async fn me(me: User) -> Json<User> {
    Json(me)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_role_defaults_to_athlete() {
        let form = serde_json::from_str::<RegisterForm>(r#"{"name": "a", "email": "a@example.com", "password": "hunter2"}"#).unwrap();
        assert_eq!(form.role, None);
        assert_eq!(form.role.unwrap_or(Role::Athlete), Role::Athlete);
    }

    #[test]
    fn registered_organizers_can_manage_matches() {
        let form = serde_json::from_str::<RegisterForm>(r#"{"name": "o", "email": "o@example.com", "password": "hunter2", "role": "organizer"}"#).unwrap();
        assert_eq!(form.role, Some(Role::Organizer));
        assert!(form.role.unwrap().can_manage_matches());
        assert!(!Role::Athlete.can_manage_matches());
    }
}
