use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "competition_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub(crate) enum CompetitionStatus {
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct Competition {
    pub(crate) id: Id<Competitions>,
    pub(crate) title: String,
    pub(crate) discipline: String,
    pub(crate) region: String,
    pub(crate) registration_start: DateTime<Utc>,
    pub(crate) registration_end: DateTime<Utc>,
    pub(crate) event_start: DateTime<Utc>,
    pub(crate) event_end: DateTime<Utc>,
    pub(crate) organizer: Id<Users>,
    pub(crate) status: CompetitionStatus,
}

const COMPETITION_COLUMNS: &str = "id, title, discipline, region, registration_start, registration_end, event_start, event_end, organizer, status";

impl Competition {
    pub(crate) async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<Competitions>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("SELECT {COMPETITION_COLUMNS} FROM competitions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    /// Whether registrations are currently accepted, both by status and by the registration window.
    pub(crate) fn registration_open(&self, now: DateTime<Utc>) -> bool {
        self.status == CompetitionStatus::RegistrationOpen
            && now >= self.registration_start
            && now <= self.registration_end
    }
}

/// One row of a competition's final results, written when the competition is completed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct Placement {
    pub(crate) competition: Id<Competitions>,
    pub(crate) team: Id<Teams>,
    pub(crate) place: i16,
}

impl Placement {
    pub(crate) async fn save(&self, transaction: &mut Transaction<'_, Postgres>) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO placements (competition, team, place) VALUES ($1, $2, $3)")
            .bind(self.competition)
            .bind(self.team)
            .bind(self.place)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompetitionForm {
    pub(crate) title: String,
    pub(crate) discipline: String,
    pub(crate) region: String,
    pub(crate) registration_start: DateTime<Utc>,
    pub(crate) registration_end: DateTime<Utc>,
    pub(crate) event_start: DateTime<Utc>,
    pub(crate) event_end: DateTime<Utc>,
}

#[rocket::get("/competitions")]
pub(crate) async fn list(pool: &State<PgPool>) -> Result<Json<Vec<Competition>>, ApiError> {
    let competitions = sqlx::query_as::<_, Competition>(&format!("SELECT {COMPETITION_COLUMNS} FROM competitions ORDER BY event_start, id"))
        .fetch_all(&**pool)
        .await?;
    Ok(Json(competitions))
}

#[rocket::post("/competitions", data = "<form>")]
pub(crate) async fn create(pool: &State<PgPool>, me: User, form: Json<CompetitionForm>) -> Result<Json<Competition>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to create competitions"))
    }
    let form = form.into_inner();
    if form.registration_end < form.registration_start || form.event_end < form.event_start {
        return Err(ApiError::bad_request("end date before start date"))
    }
    let mut transaction = pool.begin().await?;
    let competition = Competition {
        id: Id::new(&mut transaction).await?,
        title: form.title,
        discipline: form.discipline,
        region: form.region,
        registration_start: form.registration_start,
        registration_end: form.registration_end,
        event_start: form.event_start,
        event_end: form.event_end,
        organizer: me.id,
        status: CompetitionStatus::RegistrationOpen,
    };
    sqlx::query(&format!("INSERT INTO competitions ({COMPETITION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"))
        .bind(competition.id)
        .bind(&competition.title)
        .bind(&competition.discipline)
        .bind(&competition.region)
        .bind(competition.registration_start)
        .bind(competition.registration_end)
        .bind(competition.event_start)
        .bind(competition.event_end)
        .bind(competition.organizer)
        .bind(competition.status)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(competition))
}

#[rocket::get("/competitions/my")]
pub(crate) async fn my(pool: &State<PgPool>, me: User) -> Result<Json<Vec<Competition>>, ApiError> {
    let competitions = sqlx::query_as::<_, Competition>(&format!("SELECT {COMPETITION_COLUMNS} FROM competitions WHERE organizer = $1 ORDER BY event_start, id"))
        .bind(me.id)
        .fetch_all(&**pool)
        .await?;
    Ok(Json(competitions))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(crate) struct PlacementEntry {
    pub(crate) team: Id<Teams>,
    pub(crate) name: String,
    pub(crate) place: i16,
}

#[rocket::get("/competitions/<id>/results")]
pub(crate) async fn results(pool: &State<PgPool>, id: Id<Competitions>) -> Result<Json<Vec<PlacementEntry>>, ApiError> {
    let mut transaction = pool.begin().await?;
    Competition::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    let entries = sqlx::query_as::<_, PlacementEntry>("SELECT placements.team, teams.name, placements.place FROM placements JOIN teams ON teams.id = placements.team WHERE placements.competition = $1 ORDER BY placements.place")
        .bind(id)
        .fetch_all(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(entries))
}
