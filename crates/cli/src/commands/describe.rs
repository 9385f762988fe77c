//! Description page command

use anyhow::Result;
use std::io::Write;

use super::LoggedInSession;
use crate::client::ApiClient;

/// Open the description view and print the text as the server streams it
pub async fn show_description(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    let session = LoggedInSession::open(client, username, password).await?;
    let result = stream_to_stdout(client, session.id()).await;
    session.close().await?;
    result
}

pub(crate) async fn stream_to_stdout(client: &ApiClient, id: &str) -> Result<()> {
    client.navigate(id, "description").await?;

    let mut stdout = std::io::stdout();
    client
        .stream_description(id, |text| {
            let _ = write!(stdout, "{}", text);
            let _ = stdout.flush();
        })
        .await?;
    println!();
    Ok(())
}
