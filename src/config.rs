use {
    std::{
        io,
        path::Path,
    },
    crate::prelude::*,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)] Io(#[from] io::Error),
    #[error(transparent)] Json(#[from] serde_json::Error),
    #[error("missing config file")]
    Missing,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Config {
    pub(crate) secret_key: String,
    #[serde(default)]
    pub(crate) database: Option<ConfigDatabase>,
}

impl Config {
    pub(crate) async fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::Missing)
        }
        let buf = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&buf)?)
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigDatabase {
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
}
