pub(crate) use {
    std::collections::HashMap,
    chrono::prelude::*,
    rocket::{
        State,
        http::Status,
        serde::json::Json,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    sqlx::{
        PgPool,
        Postgres,
        Transaction,
    },
    crate::{
        competition::{
            Competition,
            CompetitionStatus,
        },
        config::Config,
        http::ApiError,
        id::{
            Competitions,
            Id,
            Matches,
            TeamInvites,
            TeamJoinRequests,
            Teams,
            Users,
        },
        matches::{
            Match,
            Outcome,
            Stage,
        },
        team::Team,
        user::{
            Role,
            User,
        },
    },
};
