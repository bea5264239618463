use crate::prelude::*;

/// An athlete's registration for a competition. Registration is a prerequisite
/// for joining a team but carries no state of its own.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct Registration {
    pub(crate) competition: Id<Competitions>,
    pub(crate) athlete: Id<Users>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationForm {
    pub(crate) competition_id: Id<Competitions>,
}

#[rocket::post("/registrations", data = "<form>")]
pub(crate) async fn create(pool: &State<PgPool>, me: User, form: Json<RegistrationForm>) -> Result<Json<Registration>, ApiError> {
    if me.role != Role::Athlete {
        return Err(ApiError::forbidden("only athletes may register for competitions"))
    }
    let form = form.into_inner();
    let mut transaction = pool.begin().await?;
    let competition = Competition::from_id(&mut transaction, form.competition_id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    if !competition.registration_open(Utc::now()) {
        return Err(ApiError::bad_request("registration is closed for this competition"))
    }
    let registered = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM registrations WHERE competition = $1 AND athlete = $2)")
        .bind(competition.id)
        .bind(me.id)
        .fetch_one(&mut *transaction)
        .await?;
    if registered {
        return Err(ApiError::bad_request("already registered for this competition"))
    }
    let registration = Registration {
        competition: competition.id,
        athlete: me.id,
    };
    sqlx::query("INSERT INTO registrations (competition, athlete) VALUES ($1, $2)")
        .bind(registration.competition)
        .bind(registration.athlete)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(registration))
}
