use {
    base64::engine::{
        Engine as _,
        general_purpose::STANDARD as BASE64,
    },
    rocket::{
        Request,
        Rocket,
        config::SecretKey,
        response::{
            self,
            Responder,
        },
    },
    crate::{
        auth,
        bracket,
        competition,
        matches,
        registration,
        standings,
        team,
        prelude::*,
    },
};

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

/// A JSON error response with an explanatory message, used by all fallible routes.
#[derive(Debug)]
pub(crate) struct ApiError(pub(crate) Status, pub(crate) String);

impl ApiError {
    pub(crate) fn not_found(what: &str) -> Self {
        Self(Status::NotFound, format!("{what} not found"))
    }

    pub(crate) fn forbidden(message: &str) -> Self {
        Self(Status::Forbidden, message.to_owned())
    }

    pub(crate) fn bad_request(message: &str) -> Self {
        Self(Status::BadRequest, message.to_owned())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let Self(status, error) = self;
        let mut response = Json(ErrorBody { error }).respond_to(request)?;
        response.set_status(status);
        Ok(response)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        log::error!("database error: {e}");
        Self(Status::InternalServerError, format!("internal server error"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        log::error!("bcrypt error: {e}");
        Self(Status::InternalServerError, format!("internal server error"))
    }
}

impl From<bracket::Error> for ApiError {
    fn from(e: bracket::Error) -> Self {
        let status = match e {
            bracket::Error::StageAlreadyGenerated(_) => Status::Conflict,
            | bracket::Error::InsufficientParticipants { .. }
            | bracket::Error::IncompleteStage
            | bracket::Error::AmbiguousSemifinalResult
            | bracket::Error::FinalNotDecided
                => Status::BadRequest,
        };
        Self(status, e.to_string())
    }
}

#[rocket::catch(400)]
fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("bad request") })
}

#[rocket::catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("authorization required") })
}

#[rocket::catch(403)]
fn forbidden() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("not allowed") })
}

#[rocket::catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("not found") })
}

#[rocket::catch(422)]
fn unprocessable_content() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("malformed request body") })
}

#[rocket::catch(500)]
fn internal_server_error() -> Json<ErrorBody> {
    Json(ErrorBody { error: format!("internal server error") })
}

#[rocket::catch(default)]
fn fallback_catcher(status: Status, request: &Request<'_>) -> Json<ErrorBody> {
    log::warn!("responding with unexpected HTTP status code {} to request {request:?}", status.code);
    Json(ErrorBody { error: status.reason_lossy().to_lowercase() })
}

pub(crate) async fn rocket(pool: PgPool, config: Config, port: u16) -> Result<Rocket<rocket::Ignite>, crate::Error> {
    Ok(rocket::custom(rocket::Config::figment().merge(rocket::Config {
        secret_key: SecretKey::from(&BASE64.decode(&config.secret_key)?),
        log_level: rocket::config::LogLevel::Critical,
        ..rocket::Config::default()
    }).merge(("port", port)))
    .mount("/api", rocket::routes![
        auth::register,
        auth::login,
        auth::me,
        competition::list,
        competition::create,
        competition::my,
        competition::results,
        registration::create,
        team::create,
        team::my,
        team::invite,
        team::invitations,
        team::accept_invite,
        team::reject_invite,
        team::join_request,
        team::requests,
        team::accept_request,
        team::reject_request,
        matches::list,
        matches::create,
        matches::set_result,
        matches::delete,
        standings::get,
        bracket::generate_playoff,
        bracket::generate_final,
        bracket::finalize,
    ])
    .register("/", rocket::catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable_content,
        internal_server_error,
        fallback_catcher,
    ])
    .manage(config)
    .manage(pool)
    .ignite().await?)
}
