//! CLI command implementations

pub mod describe;
pub mod health;
pub mod predict;
pub mod shell;

use anyhow::Result;

use crate::client::{ApiClient, SessionInfo};

/// A server session opened and logged in for the length of one command
pub struct LoggedInSession<'a> {
    client: &'a ApiClient,
    pub info: SessionInfo,
}

impl<'a> LoggedInSession<'a> {
    pub async fn open(client: &'a ApiClient, username: &str, password: &str) -> Result<Self> {
        let session = client.create_session().await?;
        match client.login(&session.session_id, username, password).await {
            Ok(info) => Ok(Self { client, info }),
            Err(e) => {
                let _ = client.end_session(&session.session_id).await;
                Err(e)
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.info.session_id
    }

    /// Log out and discard the session
    pub async fn close(self) -> Result<()> {
        let logout = self.client.logout(self.id()).await;
        self.client.end_session(self.id()).await?;
        logout.map(|_| ())
    }
}
