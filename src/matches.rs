use crate::prelude::*;

/// Which round of a competition a match belongs to. Carried as a structured
/// column rather than encoded in the free-text location label so that bracket
/// stages can be looked up without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "match_stage")]
pub(crate) enum Stage {
    #[sqlx(rename = "regular")]
    #[serde(rename = "regular")]
    Regular,
    #[sqlx(rename = "semifinal_1")]
    #[serde(rename = "semifinal_1")]
    Semifinal1,
    #[sqlx(rename = "semifinal_2")]
    #[serde(rename = "semifinal_2")]
    Semifinal2,
    #[sqlx(rename = "final")]
    #[serde(rename = "final")]
    Final,
    #[sqlx(rename = "third_place")]
    #[serde(rename = "third_place")]
    ThirdPlace,
}

/// The recorded result of a match. A match without an outcome is pending and
/// contributes nothing to standings or bracket progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "match_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    TeamAWin,
    TeamBWin,
    Draw,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct Match {
    pub(crate) id: Id<Matches>,
    pub(crate) competition: Id<Competitions>,
    pub(crate) team_a: Id<Teams>,
    pub(crate) team_b: Id<Teams>,
    pub(crate) scheduled_at: DateTime<Utc>,
    pub(crate) location: Option<String>,
    pub(crate) stage: Stage,
    pub(crate) outcome: Option<Outcome>,
}

impl Match {
    /// The team that won this match, if the outcome names one. Draws,
    /// cancellations, and pending matches have no winner.
    pub(crate) fn winner(&self) -> Option<Id<Teams>> {
        match self.outcome {
            Some(Outcome::TeamAWin) => Some(self.team_a),
            Some(Outcome::TeamBWin) => Some(self.team_b),
            Some(Outcome::Draw | Outcome::Cancelled) | None => None,
        }
    }

    pub(crate) fn loser(&self) -> Option<Id<Teams>> {
        match self.outcome {
            Some(Outcome::TeamAWin) => Some(self.team_b),
            Some(Outcome::TeamBWin) => Some(self.team_a),
            Some(Outcome::Draw | Outcome::Cancelled) | None => None,
        }
    }

    pub(crate) async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<Matches>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, competition, team_a, team_b, scheduled_at, location, stage, outcome FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    pub(crate) async fn for_competition(transaction: &mut Transaction<'_, Postgres>, competition: Id<Competitions>) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, competition, team_a, team_b, scheduled_at, location, stage, outcome FROM matches WHERE competition = $1 ORDER BY scheduled_at, id")
            .bind(competition)
            .fetch_all(&mut **transaction)
            .await
    }

    pub(crate) async fn for_stage(transaction: &mut Transaction<'_, Postgres>, competition: Id<Competitions>, stage: Stage) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, competition, team_a, team_b, scheduled_at, location, stage, outcome FROM matches WHERE competition = $1 AND stage = $2")
            .bind(competition)
            .bind(stage)
            .fetch_optional(&mut **transaction)
            .await
    }

    pub(crate) async fn save(&self, transaction: &mut Transaction<'_, Postgres>) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO matches (id, competition, team_a, team_b, scheduled_at, location, stage, outcome) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(self.id)
            .bind(self.competition)
            .bind(self.team_a)
            .bind(self.team_b)
            .bind(self.scheduled_at)
            .bind(&self.location)
            .bind(self.stage)
            .bind(self.outcome)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchForm {
    pub(crate) competition_id: Id<Competitions>,
    pub(crate) team_a_id: Id<Teams>,
    pub(crate) team_b_id: Id<Teams>,
    pub(crate) scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultForm {
    pub(crate) result: Outcome,
}

#[rocket::get("/matches?<competition>")]
pub(crate) async fn list(pool: &State<PgPool>, competition: Option<Id<Competitions>>) -> Result<Json<Vec<Match>>, ApiError> {
    let mut transaction = pool.begin().await?;
    let matches = if let Some(competition) = competition {
        Match::for_competition(&mut transaction, competition).await?
    } else {
        sqlx::query_as::<_, Match>("SELECT id, competition, team_a, team_b, scheduled_at, location, stage, outcome FROM matches ORDER BY scheduled_at, id")
            .fetch_all(&mut *transaction)
            .await?
    };
    transaction.commit().await?;
    Ok(Json(matches))
}

#[rocket::post("/matches", data = "<form>")]
pub(crate) async fn create(pool: &State<PgPool>, me: User, form: Json<MatchForm>) -> Result<Json<Match>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to create matches"))
    }
    let form = form.into_inner();
    let mut transaction = pool.begin().await?;
    Competition::from_id(&mut transaction, form.competition_id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    let match_ = Match {
        id: Id::new(&mut transaction).await?,
        competition: form.competition_id,
        team_a: form.team_a_id,
        team_b: form.team_b_id,
        scheduled_at: form.scheduled_at,
        location: form.location,
        stage: Stage::Regular,
        outcome: None,
    };
    match_.save(&mut transaction).await?;
    transaction.commit().await?;
    Ok(Json(match_))
}

#[rocket::patch("/matches/<id>", data = "<form>")]
pub(crate) async fn set_result(pool: &State<PgPool>, me: User, id: Id<Matches>, form: Json<ResultForm>) -> Result<Json<Match>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to update match results"))
    }
    let mut transaction = pool.begin().await?;
    let mut match_ = Match::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("match"))?;
    match_.outcome = Some(form.result);
    sqlx::query("UPDATE matches SET outcome = $1 WHERE id = $2")
        .bind(match_.outcome)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(match_))
}

#[rocket::delete("/matches/<id>")]
pub(crate) async fn delete(pool: &State<PgPool>, me: User, id: Id<Matches>) -> Result<Json<Match>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to delete matches"))
    }
    let mut transaction = pool.begin().await?;
    let match_ = Match::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("match"))?;
    sqlx::query("DELETE FROM matches WHERE id = $1")
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(match_))
}
