//! One-shot prediction command

use anyhow::Result;

use super::LoggedInSession;
use crate::client::{ApiClient, PredictRequest};
use crate::output::{print_prediction, OutputFormat};

/// Log in, score one set of pollutant readings, log out
pub async fn run_prediction(
    client: &ApiClient,
    username: &str,
    password: &str,
    request: &PredictRequest,
    format: OutputFormat,
) -> Result<()> {
    let session = LoggedInSession::open(client, username, password).await?;
    let result = client.predict(session.id(), request).await;
    session.close().await?;

    print_prediction(&result?, format);
    Ok(())
}
