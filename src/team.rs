use crate::prelude::*;

/// Review state of a team invite or join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct Team {
    pub(crate) id: Id<Teams>,
    pub(crate) competition: Id<Competitions>,
    pub(crate) name: String,
    pub(crate) captain: Id<Users>,
}

impl Team {
    pub(crate) async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<Teams>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, competition, name, captain FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    pub(crate) async fn for_competition(transaction: &mut Transaction<'_, Postgres>, competition: Id<Competitions>) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, competition, name, captain FROM teams WHERE competition = $1 ORDER BY name, id")
            .bind(competition)
            .fetch_all(&mut **transaction)
            .await
    }

    /// The team the given user belongs to in the given competition, if any.
    /// Membership is exclusive per competition.
    pub(crate) async fn for_member(transaction: &mut Transaction<'_, Postgres>, competition: Id<Competitions>, user: Id<Users>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT teams.id, teams.competition, teams.name, teams.captain FROM teams JOIN team_members ON team_members.team = teams.id WHERE teams.competition = $1 AND team_members.member = $2")
            .bind(competition)
            .bind(user)
            .fetch_optional(&mut **transaction)
            .await
    }

    async fn add_member(&self, transaction: &mut Transaction<'_, Postgres>, user: Id<Users>) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO team_members (team, member) VALUES ($1, $2)")
            .bind(self.id)
            .bind(user)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct TeamInvite {
    pub(crate) id: Id<TeamInvites>,
    pub(crate) team: Id<Teams>,
    pub(crate) invitee: Id<Users>,
    pub(crate) status: ReviewStatus,
}

impl TeamInvite {
    async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<TeamInvites>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, team, invitee, status FROM team_invites WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    async fn set_status(&self, transaction: &mut Transaction<'_, Postgres>, status: ReviewStatus) -> sqlx::Result<()> {
        sqlx::query("UPDATE team_invites SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(self.id)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub(crate) struct TeamJoinRequest {
    pub(crate) id: Id<TeamJoinRequests>,
    pub(crate) team: Id<Teams>,
    pub(crate) requester: Id<Users>,
    pub(crate) status: ReviewStatus,
}

impl TeamJoinRequest {
    async fn from_id(transaction: &mut Transaction<'_, Postgres>, id: Id<TeamJoinRequests>) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, team, requester, status FROM team_join_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await
    }

    async fn set_status(&self, transaction: &mut Transaction<'_, Postgres>, status: ReviewStatus) -> sqlx::Result<()> {
        sqlx::query("UPDATE team_join_requests SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(self.id)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TeamForm {
    pub(crate) competition_id: Id<Competitions>,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InviteForm {
    pub(crate) user_id: Id<Users>,
}

#[rocket::post("/teams", data = "<form>")]
pub(crate) async fn create(pool: &State<PgPool>, me: User, form: Json<TeamForm>) -> Result<Json<Team>, ApiError> {
    let form = form.into_inner();
    let mut transaction = pool.begin().await?;
    Competition::from_id(&mut transaction, form.competition_id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    if Team::for_member(&mut transaction, form.competition_id, me.id).await?.is_some() {
        return Err(ApiError::bad_request("already in a team for this competition"))
    }
    let team = Team {
        id: Id::new(&mut transaction).await?,
        competition: form.competition_id,
        name: form.name,
        captain: me.id,
    };
    sqlx::query("INSERT INTO teams (id, competition, name, captain) VALUES ($1, $2, $3, $4)")
        .bind(team.id)
        .bind(team.competition)
        .bind(&team.name)
        .bind(team.captain)
        .execute(&mut *transaction)
        .await?;
    team.add_member(&mut transaction, me.id).await?;
    transaction.commit().await?;
    Ok(Json(team))
}

#[rocket::get("/teams/my")]
pub(crate) async fn my(pool: &State<PgPool>, me: User) -> Result<Json<Vec<Team>>, ApiError> {
    let teams = sqlx::query_as::<_, Team>("SELECT teams.id, teams.competition, teams.name, teams.captain FROM teams JOIN team_members ON team_members.team = teams.id WHERE team_members.member = $1 ORDER BY teams.name, teams.id")
        .bind(me.id)
        .fetch_all(&**pool)
        .await?;
    Ok(Json(teams))
}

#[rocket::post("/teams/<id>/invitations", data = "<form>")]
pub(crate) async fn invite(pool: &State<PgPool>, me: User, id: Id<Teams>, form: Json<InviteForm>) -> Result<Json<TeamInvite>, ApiError> {
    let form = form.into_inner();
    let mut transaction = pool.begin().await?;
    let team = Team::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if team.captain != me.id {
        return Err(ApiError::forbidden("only the team captain may invite members"))
    }
    User::from_id(&mut transaction, form.user_id).await?.ok_or_else(|| ApiError::not_found("user"))?;
    if Team::for_member(&mut transaction, team.competition, form.user_id).await?.is_some() {
        return Err(ApiError::bad_request("user is already in a team for this competition"))
    }
    let pending = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM team_invites WHERE team = $1 AND invitee = $2 AND status = 'pending')")
        .bind(id)
        .bind(form.user_id)
        .fetch_one(&mut *transaction)
        .await?;
    if pending {
        return Err(ApiError::bad_request("user already has a pending invite to this team"))
    }
    let invite = TeamInvite {
        id: Id::new(&mut transaction).await?,
        team: id,
        invitee: form.user_id,
        status: ReviewStatus::Pending,
    };
    sqlx::query("INSERT INTO team_invites (id, team, invitee, status) VALUES ($1, $2, $3, $4)")
        .bind(invite.id)
        .bind(invite.team)
        .bind(invite.invitee)
        .bind(invite.status)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(invite))
}

#[rocket::get("/invitations")]
pub(crate) async fn invitations(pool: &State<PgPool>, me: User) -> Result<Json<Vec<TeamInvite>>, ApiError> {
    let invites = sqlx::query_as::<_, TeamInvite>("SELECT id, team, invitee, status FROM team_invites WHERE invitee = $1 AND status = 'pending' ORDER BY id")
        .bind(me.id)
        .fetch_all(&**pool)
        .await?;
    Ok(Json(invites))
}

#[rocket::post("/invitations/<id>/accept")]
pub(crate) async fn accept_invite(pool: &State<PgPool>, me: User, id: Id<TeamInvites>) -> Result<Json<Team>, ApiError> {
    let mut transaction = pool.begin().await?;
    let invite = TeamInvite::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("invite"))?;
    if invite.invitee != me.id {
        return Err(ApiError::forbidden("this invite is for another user"))
    }
    if invite.status != ReviewStatus::Pending {
        return Err(ApiError::bad_request("invite has already been reviewed"))
    }
    let team = Team::from_id(&mut transaction, invite.team).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if Team::for_member(&mut transaction, team.competition, me.id).await?.is_some() {
        return Err(ApiError::bad_request("already in a team for this competition"))
    }
    invite.set_status(&mut transaction, ReviewStatus::Accepted).await?;
    team.add_member(&mut transaction, me.id).await?;
    transaction.commit().await?;
    Ok(Json(team))
}

#[rocket::post("/invitations/<id>/reject")]
pub(crate) async fn reject_invite(pool: &State<PgPool>, me: User, id: Id<TeamInvites>) -> Result<Json<TeamInvite>, ApiError> {
    let mut transaction = pool.begin().await?;
    let mut invite = TeamInvite::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("invite"))?;
    if invite.invitee != me.id {
        return Err(ApiError::forbidden("this invite is for another user"))
    }
    if invite.status != ReviewStatus::Pending {
        return Err(ApiError::bad_request("invite has already been reviewed"))
    }
    invite.set_status(&mut transaction, ReviewStatus::Rejected).await?;
    invite.status = ReviewStatus::Rejected;
    transaction.commit().await?;
    Ok(Json(invite))
}

#[rocket::post("/teams/<id>/join-requests")]
pub(crate) async fn join_request(pool: &State<PgPool>, me: User, id: Id<Teams>) -> Result<Json<TeamJoinRequest>, ApiError> {
    let mut transaction = pool.begin().await?;
    let team = Team::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if Team::for_member(&mut transaction, team.competition, me.id).await?.is_some() {
        return Err(ApiError::bad_request("already in a team for this competition"))
    }
    let pending = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM team_join_requests WHERE team = $1 AND requester = $2 AND status = 'pending')")
        .bind(id)
        .bind(me.id)
        .fetch_one(&mut *transaction)
        .await?;
    if pending {
        return Err(ApiError::bad_request("join request already pending for this team"))
    }
    let request = TeamJoinRequest {
        id: Id::new(&mut transaction).await?,
        team: id,
        requester: me.id,
        status: ReviewStatus::Pending,
    };
    sqlx::query("INSERT INTO team_join_requests (id, team, requester, status) VALUES ($1, $2, $3, $4)")
        .bind(request.id)
        .bind(request.team)
        .bind(request.requester)
        .bind(request.status)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(request))
}

#[rocket::get("/teams/<id>/join-requests")]
pub(crate) async fn requests(pool: &State<PgPool>, me: User, id: Id<Teams>) -> Result<Json<Vec<TeamJoinRequest>>, ApiError> {
    let mut transaction = pool.begin().await?;
    let team = Team::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if team.captain != me.id {
        return Err(ApiError::forbidden("only the team captain may review join requests"))
    }
    let requests = sqlx::query_as::<_, TeamJoinRequest>("SELECT id, team, requester, status FROM team_join_requests WHERE team = $1 AND status = 'pending' ORDER BY id")
        .bind(id)
        .fetch_all(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(requests))
}

#[rocket::post("/join-requests/<id>/accept")]
pub(crate) async fn accept_request(pool: &State<PgPool>, me: User, id: Id<TeamJoinRequests>) -> Result<Json<Team>, ApiError> {
    let mut transaction = pool.begin().await?;
    let request = TeamJoinRequest::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("join request"))?;
    let team = Team::from_id(&mut transaction, request.team).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if team.captain != me.id {
        return Err(ApiError::forbidden("only the team captain may review join requests"))
    }
    if request.status != ReviewStatus::Pending {
        return Err(ApiError::bad_request("join request has already been reviewed"))
    }
    if Team::for_member(&mut transaction, team.competition, request.requester).await?.is_some() {
        return Err(ApiError::bad_request("user is already in a team for this competition"))
    }
    request.set_status(&mut transaction, ReviewStatus::Accepted).await?;
    team.add_member(&mut transaction, request.requester).await?;
    transaction.commit().await?;
    Ok(Json(team))
}

#[rocket::post("/join-requests/<id>/reject")]
pub(crate) async fn reject_request(pool: &State<PgPool>, me: User, id: Id<TeamJoinRequests>) -> Result<Json<TeamJoinRequest>, ApiError> {
    let mut transaction = pool.begin().await?;
    let mut request = TeamJoinRequest::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("join request"))?;
    let team = Team::from_id(&mut transaction, request.team).await?.ok_or_else(|| ApiError::not_found("team"))?;
    if team.captain != me.id {
        return Err(ApiError::forbidden("only the team captain may review join requests"))
    }
    if request.status != ReviewStatus::Pending {
        return Err(ApiError::bad_request("join request has already been reviewed"))
    }
    request.set_status(&mut transaction, ReviewStatus::Rejected).await?;
    request.status = ReviewStatus::Rejected;
    transaction.commit().await?;
    Ok(Json(request))
}
