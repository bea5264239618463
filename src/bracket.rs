use {
    chrono::TimeDelta,
    crate::{
        competition::Placement,
        standings::{
            StandingRow,
            standings,
        },
        prelude::*,
    },
};

/// Ways a tournament can refuse to advance to its next stage. All of these are
/// surfaced to the caller as rejected requests; none are retried.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum Error {
    #[error("not enough teams for playoff (minimum 4, found {found})")]
    InsufficientParticipants { found: usize },
    #[error("two decided semifinal matches required")]
    IncompleteStage,
    #[error("a semifinal ended without a winner and must be re-scored")]
    AmbiguousSemifinalResult,
    #[error("final match not decided yet")]
    FinalNotDecided,
    #[error("{0} already generated for this competition")]
    StageAlreadyGenerated(&'static str),
}

/// Pairs the top 4 ranked teams into semifinals: seed 1 vs seed 4, seed 2 vs seed 3.
pub(crate) fn seed_semifinals(table: &[StandingRow]) -> Result<[(Id<Teams>, Id<Teams>); 2], Error> {
    if table.len() < 4 {
        return Err(Error::InsufficientParticipants { found: table.len() })
    }
    Ok([
        (table[0].team, table[3].team),
        (table[1].team, table[2].team),
    ])
}

pub(crate) struct Advancement {
    /// Winner of semifinal 1 vs winner of semifinal 2.
    pub(crate) final_pairing: (Id<Teams>, Id<Teams>),
    /// Loser of semifinal 1 vs loser of semifinal 2.
    pub(crate) third_place_pairing: (Id<Teams>, Id<Teams>),
}

/// Derives the final and third-place pairings from the two semifinals. Both
/// semifinals must name a winner; a drawn or cancelled semifinal blocks
/// advancement until it is re-scored.
pub(crate) fn advance(semifinal_1: &Match, semifinal_2: &Match) -> Result<Advancement, Error> {
    for semifinal in [semifinal_1, semifinal_2] {
        match semifinal.outcome {
            None => return Err(Error::IncompleteStage),
            Some(Outcome::Draw | Outcome::Cancelled) => return Err(Error::AmbiguousSemifinalResult),
            Some(Outcome::TeamAWin | Outcome::TeamBWin) => {}
        }
    }
    Ok(Advancement {
        final_pairing: (semifinal_1.winner().expect("checked above"), semifinal_2.winner().expect("checked above")),
        third_place_pairing: (semifinal_1.loser().expect("checked above"), semifinal_2.loser().expect("checked above")),
    })
}

/// Determines final placements: 1st and 2nd from the final, 3rd from the
/// third-place match if it exists and names a winner.
pub(crate) fn final_placements(final_match: &Match, third_place_match: Option<&Match>) -> Result<Vec<(Id<Teams>, i16)>, Error> {
    let winner = final_match.winner().ok_or(Error::FinalNotDecided)?;
    let loser = final_match.loser().expect("a match with a winner has a loser");
    let mut placements = vec![(winner, 1), (loser, 2)];
    if let Some(third) = third_place_match.and_then(Match::winner) {
        placements.push((third, 3));
    }
    Ok(placements)
}

#[rocket::post("/competitions/<id>/playoff")]
pub(crate) async fn generate_playoff(pool: &State<PgPool>, me: User, id: Id<Competitions>) -> Result<Json<Vec<Match>>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to generate playoff matches"))
    }
    let mut transaction = pool.begin().await?;
    Competition::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    if Match::for_stage(&mut transaction, id, Stage::Semifinal1).await?.is_some() || Match::for_stage(&mut transaction, id, Stage::Semifinal2).await?.is_some() {
        return Err(Error::StageAlreadyGenerated("semifinals").into())
    }
    let matches = Match::for_competition(&mut transaction, id).await?;
    let [pairing_1, pairing_2] = seed_semifinals(&standings(&matches))?;
    let now = Utc::now();
    let semifinal_1 = Match {
        id: Id::new(&mut transaction).await?,
        competition: id,
        team_a: pairing_1.0,
        team_b: pairing_1.1,
        scheduled_at: now + TimeDelta::hours(1),
        location: None,
        stage: Stage::Semifinal1,
        outcome: None,
    };
    semifinal_1.save(&mut transaction).await?;
    let semifinal_2 = Match {
        id: Id::new(&mut transaction).await?,
        competition: id,
        team_a: pairing_2.0,
        team_b: pairing_2.1,
        scheduled_at: now + TimeDelta::hours(2),
        location: None,
        stage: Stage::Semifinal2,
        outcome: None,
    };
    semifinal_2.save(&mut transaction).await?;
    transaction.commit().await?;
    Ok(Json(vec![semifinal_1, semifinal_2]))
}

#[rocket::post("/competitions/<id>/final")]
pub(crate) async fn generate_final(pool: &State<PgPool>, me: User, id: Id<Competitions>) -> Result<Json<Vec<Match>>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to generate the final"))
    }
    let mut transaction = pool.begin().await?;
    Competition::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    if Match::for_stage(&mut transaction, id, Stage::Final).await?.is_some() {
        return Err(Error::StageAlreadyGenerated("the final").into())
    }
    let semifinal_1 = Match::for_stage(&mut transaction, id, Stage::Semifinal1).await?.ok_or(Error::IncompleteStage)?;
    let semifinal_2 = Match::for_stage(&mut transaction, id, Stage::Semifinal2).await?.ok_or(Error::IncompleteStage)?;
    let advancement = advance(&semifinal_1, &semifinal_2)?;
    let now = Utc::now();
    let final_match = Match {
        id: Id::new(&mut transaction).await?,
        competition: id,
        team_a: advancement.final_pairing.0,
        team_b: advancement.final_pairing.1,
        scheduled_at: now + TimeDelta::hours(3),
        location: None,
        stage: Stage::Final,
        outcome: None,
    };
    final_match.save(&mut transaction).await?;
    let third_place_match = Match {
        id: Id::new(&mut transaction).await?,
        competition: id,
        team_a: advancement.third_place_pairing.0,
        team_b: advancement.third_place_pairing.1,
        scheduled_at: now + TimeDelta::hours(4),
        location: None,
        stage: Stage::ThirdPlace,
        outcome: None,
    };
    third_place_match.save(&mut transaction).await?;
    transaction.commit().await?;
    Ok(Json(vec![final_match, third_place_match]))
}

#[rocket::post("/competitions/<id>/complete")]
pub(crate) async fn finalize(pool: &State<PgPool>, me: User, id: Id<Competitions>) -> Result<Json<Vec<Placement>>, ApiError> {
    if !me.role.can_manage_matches() {
        return Err(ApiError::forbidden("not allowed to complete competitions"))
    }
    let mut transaction = pool.begin().await?;
    let competition = Competition::from_id(&mut transaction, id).await?.ok_or_else(|| ApiError::not_found("competition"))?;
    if competition.status == CompetitionStatus::Completed {
        return Err(Error::StageAlreadyGenerated("placements").into())
    }
    let final_match = Match::for_stage(&mut transaction, id, Stage::Final).await?.ok_or(Error::FinalNotDecided)?;
    let third_place_match = Match::for_stage(&mut transaction, id, Stage::ThirdPlace).await?;
    let mut placements = Vec::default();
    for (team, place) in final_placements(&final_match, third_place_match.as_ref())? {
        let placement = Placement { competition: id, team, place };
        placement.save(&mut transaction).await?;
        placements.push(placement);
    }
    sqlx::query("UPDATE competitions SET status = $1 WHERE id = $2")
        .bind(CompetitionStatus::Completed)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Json(placements))
}

#[cfg(test)]
mod tests {
    use {
        crate::standings::tests::test_match,
        super::*,
    };

    fn ranked(teams_and_points: &[(u64, u32)]) -> Vec<StandingRow> {
        teams_and_points.iter().map(|&(team, points)| StandingRow {
            team: Id::from(team),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            points,
        }).collect()
    }

    fn staged(team_a: u64, team_b: u64, stage: Stage, outcome: Option<Outcome>) -> Match {
        Match { stage, ..test_match(team_a, team_b, outcome) }
    }

    #[test]
    fn seeding_pairs_first_with_fourth_and_second_with_third() {
        let table = ranked(&[(1, 10), (2, 8), (3, 8), (4, 5)]);
        let [semifinal_1, semifinal_2] = seed_semifinals(&table).unwrap();
        assert_eq!(semifinal_1, (Id::from(1_u64), Id::from(4_u64)));
        assert_eq!(semifinal_2, (Id::from(2_u64), Id::from(3_u64)));
    }

    #[test]
    fn playoff_requires_four_ranked_teams() {
        let table = ranked(&[(1, 6), (2, 3), (3, 0)]);
        assert_eq!(seed_semifinals(&table), Err(Error::InsufficientParticipants { found: 3 }));
        assert_eq!(seed_semifinals(&[]), Err(Error::InsufficientParticipants { found: 0 }));
    }

    #[test]
    fn round_robin_sweep_seeds_playoff_from_standings() {
        let matches = vec![
            test_match(1, 2, Some(Outcome::TeamAWin)),
            test_match(1, 3, Some(Outcome::TeamAWin)),
            test_match(1, 4, Some(Outcome::TeamAWin)),
            test_match(2, 3, Some(Outcome::TeamAWin)),
            test_match(2, 4, Some(Outcome::TeamAWin)),
            test_match(3, 4, Some(Outcome::TeamAWin)),
        ];
        let [semifinal_1, semifinal_2] = seed_semifinals(&standings(&matches)).unwrap();
        assert_eq!(semifinal_1, (Id::from(1_u64), Id::from(4_u64)));
        assert_eq!(semifinal_2, (Id::from(2_u64), Id::from(3_u64)));
    }

    #[test]
    fn winners_meet_in_the_final_and_losers_play_for_third() {
        let semifinal_1 = staged(1, 4, Stage::Semifinal1, Some(Outcome::TeamAWin));
        let semifinal_2 = staged(2, 3, Stage::Semifinal2, Some(Outcome::TeamBWin));
        let advancement = advance(&semifinal_1, &semifinal_2).unwrap();
        assert_eq!(advancement.final_pairing, (Id::from(1_u64), Id::from(3_u64)));
        assert_eq!(advancement.third_place_pairing, (Id::from(4_u64), Id::from(2_u64)));
    }

    #[test]
    fn pending_semifinal_blocks_advancement() {
        let semifinal_1 = staged(1, 4, Stage::Semifinal1, Some(Outcome::TeamAWin));
        let semifinal_2 = staged(2, 3, Stage::Semifinal2, None);
        assert_eq!(advance(&semifinal_1, &semifinal_2).map(|_| ()), Err(Error::IncompleteStage));
    }

    #[test]
    fn drawn_or_cancelled_semifinal_is_ambiguous() {
        let semifinal_1 = staged(1, 4, Stage::Semifinal1, Some(Outcome::Draw));
        let semifinal_2 = staged(2, 3, Stage::Semifinal2, Some(Outcome::TeamAWin));
        assert_eq!(advance(&semifinal_1, &semifinal_2).map(|_| ()), Err(Error::AmbiguousSemifinalResult));
        let semifinal_1 = staged(1, 4, Stage::Semifinal1, Some(Outcome::Cancelled));
        assert_eq!(advance(&semifinal_1, &semifinal_2).map(|_| ()), Err(Error::AmbiguousSemifinalResult));
    }

    #[test]
    fn finalize_places_winner_loser_and_third() {
        let final_match = staged(1, 3, Stage::Final, Some(Outcome::TeamAWin));
        let third_place_match = staged(4, 2, Stage::ThirdPlace, Some(Outcome::TeamBWin));
        let placements = final_placements(&final_match, Some(&third_place_match)).unwrap();
        assert_eq!(placements, vec![
            (Id::from(1_u64), 1),
            (Id::from(3_u64), 2),
            (Id::from(2_u64), 3),
        ]);
    }

    #[test]
    fn third_place_is_optional() {
        let final_match = staged(1, 3, Stage::Final, Some(Outcome::TeamBWin));
        let placements = final_placements(&final_match, None).unwrap();
        assert_eq!(placements, vec![
            (Id::from(3_u64), 1),
            (Id::from(1_u64), 2),
        ]);
        // an undecided third-place match is simply omitted
        let pending_third = staged(4, 2, Stage::ThirdPlace, None);
        let placements = final_placements(&final_match, Some(&pending_third)).unwrap();
        assert_eq!(placements.len(), 2);
    }

    #[test]
    fn indecisive_final_cannot_close_the_competition() {
        let drawn_final = staged(1, 3, Stage::Final, Some(Outcome::Draw));
        assert_eq!(final_placements(&drawn_final, None), Err(Error::FinalNotDecided));
        let pending_final = staged(1, 3, Stage::Final, None);
        assert_eq!(final_placements(&pending_final, None), Err(Error::FinalNotDecided));
    }
}
