use {
    std::cmp::Reverse,
    crate::prelude::*,
};

/// One team's accumulated league record, derived from the decided matches of a
/// competition. Never persisted; recomputing from the same match set always
/// yields the same rows in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StandingRow {
    pub(crate) team: Id<Teams>,
    pub(crate) played: u32,
    pub(crate) won: u32,
    pub(crate) drawn: u32,
    pub(crate) lost: u32,
    pub(crate) points: u32,
}

impl StandingRow {
    fn new(team: Id<Teams>) -> Self {
        Self {
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            points: 0,
            team,
        }
    }
}

/// Computes ranked standings from a competition's matches.
///
/// A decisive result awards 3 points to the winner, a draw 1 point to each
/// team. Pending and cancelled matches count for nothing, not even `played`.
/// Teams are ranked by points descending; the sort is stable, so tied teams
/// stay in the order they were first encountered.
pub(crate) fn standings(matches: &[Match]) -> Vec<StandingRow> {
    let mut rows = Vec::<StandingRow>::default();
    let mut by_team = HashMap::<Id<Teams>, usize>::default();
    for match_ in matches {
        let Some(outcome) = match_.outcome else { continue };
        if let Outcome::Cancelled = outcome { continue }
        let idx_a = *by_team.entry(match_.team_a).or_insert_with(|| {
            rows.push(StandingRow::new(match_.team_a));
            rows.len() - 1
        });
        let idx_b = *by_team.entry(match_.team_b).or_insert_with(|| {
            rows.push(StandingRow::new(match_.team_b));
            rows.len() - 1
        });
        rows[idx_a].played += 1;
        rows[idx_b].played += 1;
        match outcome {
            Outcome::TeamAWin => {
                rows[idx_a].won += 1;
                rows[idx_a].points += 3;
                rows[idx_b].lost += 1;
            }
            Outcome::TeamBWin => {
                rows[idx_b].won += 1;
                rows[idx_b].points += 3;
                rows[idx_a].lost += 1;
            }
            Outcome::Draw => {
                rows[idx_a].drawn += 1;
                rows[idx_b].drawn += 1;
                rows[idx_a].points += 1;
                rows[idx_b].points += 1;
            }
            Outcome::Cancelled => unreachable!("filtered above"),
        }
    }
    rows.sort_by_key(|row| Reverse(row.points));
    rows
}

#[derive(Debug, Serialize)]
pub(crate) struct StandingEntry {
    pub(crate) team: Id<Teams>,
    pub(crate) name: String,
    pub(crate) played: u32,
    pub(crate) won: u32,
    pub(crate) drawn: u32,
    pub(crate) lost: u32,
    pub(crate) points: u32,
}

#[rocket::get("/competitions/<id>/standings")]
pub(crate) async fn get(pool: &State<PgPool>, id: Id<Competitions>) -> Result<Json<Vec<StandingEntry>>, ApiError> {
    let mut transaction = pool.begin().await?;
    let matches = Match::for_competition(&mut transaction, id).await?;
    let names = Team::for_competition(&mut transaction, id).await?
        .into_iter()
        .map(|team| (team.id, team.name))
        .collect::<HashMap<_, _>>();
    transaction.commit().await?;
    let entries = standings(&matches)
        .into_iter()
        .map(|row| StandingEntry {
            // matches are not validated against the team list, so fall back for unknown teams
            name: names.get(&row.team).cloned().unwrap_or_else(|| format!("team {}", row.team)),
            team: row.team,
            played: row.played,
            won: row.won,
            drawn: row.drawn,
            lost: row.lost,
            points: row.points,
        })
        .collect();
    Ok(Json(entries))
}

#[cfg(test)]
pub(crate) mod tests {
    use {
        crate::matches::Stage,
        super::*,
    };

    pub(crate) fn test_match(team_a: u64, team_b: u64, outcome: Option<Outcome>) -> Match {
        Match {
            id: Id::from(team_a * 1000 + team_b),
            competition: Id::from(1_u64),
            team_a: Id::from(team_a),
            team_b: Id::from(team_b),
            scheduled_at: Utc::now(),
            location: None,
            stage: Stage::Regular,
            outcome,
        }
    }

    #[test]
    fn recomputing_standings_is_deterministic() {
        let matches = vec![
            test_match(1, 2, Some(Outcome::TeamAWin)),
            test_match(3, 4, Some(Outcome::Draw)),
            test_match(2, 3, Some(Outcome::TeamBWin)),
        ];
        let first = standings(&matches);
        let second = standings(&matches);
        assert_eq!(first, second);
    }

    #[test]
    fn ties_keep_first_encounter_order() {
        // teams 1 and 2 both end up with 3 points; team 1 was seen first
        let matches = vec![
            test_match(1, 3, Some(Outcome::TeamAWin)),
            test_match(2, 4, Some(Outcome::TeamAWin)),
        ];
        let rows = standings(&matches);
        assert_eq!(rows[0].team, Id::from(1_u64));
        assert_eq!(rows[1].team, Id::from(2_u64));
    }

    #[test]
    fn points_sum_matches_decisive_and_drawn_counts() {
        let matches = vec![
            test_match(1, 2, Some(Outcome::TeamAWin)),
            test_match(1, 3, Some(Outcome::TeamBWin)),
            test_match(2, 3, Some(Outcome::Draw)),
            test_match(1, 4, Some(Outcome::Draw)),
            test_match(2, 4, Some(Outcome::Cancelled)),
            test_match(3, 4, None),
        ];
        let total = standings(&matches).iter().map(|row| row.points).sum::<u32>();
        // 2 decisive matches and 2 draws
        assert_eq!(total, 3 * 2 + 2 * 2);
    }

    #[test]
    fn pending_and_cancelled_matches_are_ignored() {
        let decided = vec![
            test_match(1, 2, Some(Outcome::TeamAWin)),
            test_match(3, 4, Some(Outcome::TeamBWin)),
        ];
        let mut with_noise = decided.clone();
        with_noise.push(test_match(1, 3, None));
        with_noise.push(test_match(2, 4, Some(Outcome::Cancelled)));
        assert_eq!(standings(&decided), standings(&with_noise));
    }

    #[test]
    fn cancelled_matches_do_not_count_as_played() {
        let matches = vec![
            test_match(1, 2, Some(Outcome::Cancelled)),
            test_match(1, 2, Some(Outcome::TeamAWin)),
        ];
        let rows = standings(&matches);
        assert!(rows.iter().all(|row| row.played == 1));
    }

    #[test]
    fn round_robin_sweep_ranks_teams_by_wins() {
        // team 1 wins all, team 2 beats 3 and 4, team 3 beats 4
        let matches = vec![
            test_match(1, 2, Some(Outcome::TeamAWin)),
            test_match(1, 3, Some(Outcome::TeamAWin)),
            test_match(1, 4, Some(Outcome::TeamAWin)),
            test_match(2, 3, Some(Outcome::TeamAWin)),
            test_match(2, 4, Some(Outcome::TeamAWin)),
            test_match(3, 4, Some(Outcome::TeamAWin)),
        ];
        let rows = standings(&matches);
        let points = rows.iter().map(|row| (row.team, row.points)).collect::<Vec<_>>();
        assert_eq!(points, vec![
            (Id::from(1_u64), 9),
            (Id::from(2_u64), 6),
            (Id::from(3_u64), 3),
            (Id::from(4_u64), 0),
        ]);
        assert_eq!(rows[0].won, 3);
        assert_eq!(rows[3].lost, 3);
    }

    #[test]
    fn no_matches_yield_empty_standings() {
        assert_eq!(standings(&[]), Vec::default());
    }
}
