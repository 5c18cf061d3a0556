use std::{env, path::PathBuf};

use voltio_common::Secret;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8360";

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Base URL of the Voltio server, without a trailing slash.
    pub base_url: String,
    /// The session bearer token, when authenticated. Anonymous sessions leave
    /// this empty and live entirely on the local cart.
    pub access_token: Secret<String>,
    /// Where the local cart entry is persisted.
    pub storage_dir: PathBuf,
}

impl ClientConfig {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(base_url: S, storage_dir: P) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: Secret::default(),
            storage_dir: storage_dir.into(),
        }
    }

    pub fn with_access_token<S: Into<String>>(mut self, token: S) -> Self {
        self.access_token = Secret::new(token.into());
        self
    }

    pub fn from_env_or_default() -> Self {
        let base_url = env::var("VOLTIO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let access_token = env::var("VOLTIO_ACCESS_TOKEN").map(Secret::new).unwrap_or_default();
        let storage_dir =
            env::var("VOLTIO_STORAGE_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("data"));
        Self { base_url, access_token, storage_dir }
    }
}
