//! API client for the AQI predictor server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// API client for the predictor's session API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("Invalid path")
    }

    /// Turn a non-2xx response into an error carrying the server's message
    async fn check(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => anyhow::bail!("API error ({}): {}", status, err.message),
            Err(_) => anyhow::bail!("API error ({}): {}", status, body),
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse response")
    }

    /// Make a DELETE request, ignoring any body
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(path)?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn create_session(&self) -> Result<SessionInfo> {
        self.post("sessions", &serde_json::json!({})).await
    }

    pub async fn get_session(&self, id: &str) -> Result<SessionInfo> {
        self.get(&format!("sessions/{}", id)).await
    }

    pub async fn end_session(&self, id: &str) -> Result<()> {
        self.delete(&format!("sessions/{}", id)).await
    }

    pub async fn login(&self, id: &str, username: &str, password: &str) -> Result<SessionInfo> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post(&format!("sessions/{}/login", id), &body).await
    }

    pub async fn navigate(&self, id: &str, view: &str) -> Result<SessionInfo> {
        let body = serde_json::json!({ "view": view });
        self.post(&format!("sessions/{}/navigate", id), &body).await
    }

    pub async fn logout(&self, id: &str) -> Result<SessionInfo> {
        self.post(&format!("sessions/{}/logout", id), &serde_json::json!({}))
            .await
    }

    pub async fn predict(&self, id: &str, request: &PredictRequest) -> Result<Prediction> {
        self.post(&format!("sessions/{}/predict", id), request).await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.get("healthz").await
    }

    /// Fetch the description, handing each piece of text to `on_text` as it arrives
    pub async fn stream_description(&self, id: &str, mut on_text: impl FnMut(&str)) -> Result<()> {
        let mut response = Self::check(
            self.client
                .get(self.url(&format!("sessions/{}/description", id))?)
                .send()
                .await
                .context("Failed to send request")?,
        )
        .await?;

        // Chunks can split a multi-byte character; hold back the incomplete tail
        let mut pending: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.context("Failed to read stream")? {
            pending.extend_from_slice(&chunk);
            let valid = match std::str::from_utf8(&pending) {
                Ok(text) => text.len(),
                Err(e) => e.valid_up_to(),
            };
            if valid > 0 {
                let text = std::str::from_utf8(&pending[..valid])
                    .context("Invalid UTF-8 in description")?;
                on_text(text);
                pending.drain(..valid);
            }
        }
        if !pending.is_empty() {
            on_text(&String::from_utf8_lossy(&pending));
        }

        Ok(())
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub view: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub co_aqi: f64,
    pub ozone_aqi: f64,
    pub no2_aqi: f64,
    pub pm25_aqi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub aqi_value: i64,
    pub raw_score: f64,
    pub category: String,
    pub severity_rank: u8,
    pub severity_color: String,
    pub elapsed_seconds: f64,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub model_version: Option<String>,
    pub components: HashMap<String, ComponentReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_ID: &str = "6f1c1a52-4b7e-4d6b-9a8e-0c0d9f3b2a11";

    #[tokio::test]
    async fn test_predict_parses_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", format!("/sessions/{}/predict", SESSION_ID).as_str())
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "co_aqi": 10.0, "ozone_aqi": 20.0, "no2_aqi": 15.0, "pm25_aqi": 30.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"aqi_value":75,"raw_score":75.0,"category":"Moderate","severity_rank":1,
                    "severity_color":"yellow","elapsed_seconds":0.0001,"model_version":"sha256:abc"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let request = PredictRequest {
            co_aqi: 10.0,
            ozone_aqi: 20.0,
            no2_aqi: 15.0,
            pm25_aqi: 30.0,
        };
        let prediction = client.predict(SESSION_ID, &request).await.unwrap();

        assert_eq!(prediction.aqi_value, 75);
        assert_eq!(prediction.category, "Moderate");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_message_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/sessions/{}/predict", SESSION_ID).as_str())
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error":"illegal_transition","message":"cannot predict while logged_out: please log in"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let request = PredictRequest {
            co_aqi: 1.0,
            ozone_aqi: 1.0,
            no2_aqi: 1.0,
            pm25_aqi: 1.0,
        };
        let err = client.predict(SESSION_ID, &request).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("please log in"));
    }

    #[tokio::test]
    async fn test_session_lifecycle_requests() {
        let mut server = mockito::Server::new_async().await;
        let created = server
            .mock("POST", "/sessions")
            .with_status(201)
            .with_body(format!(r#"{{"session_id":"{}","view":"logged_out"}}"#, SESSION_ID))
            .create_async()
            .await;
        let login = server
            .mock("POST", format!("/sessions/{}/login", SESSION_ID).as_str())
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"username": "alice"})))
            .with_body(format!(
                r#"{{"session_id":"{}","view":"predict_aqi","user":"alice"}}"#,
                SESSION_ID
            ))
            .create_async()
            .await;
        let ended = server
            .mock("DELETE", format!("/sessions/{}", SESSION_ID).as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let session = client.create_session().await.unwrap();
        assert_eq!(session.view, "logged_out");

        let session = client.login(&session.session_id, "alice", "pw").await.unwrap();
        assert_eq!(session.view, "predict_aqi");
        assert_eq!(session.user.as_deref(), Some("alice"));

        client.end_session(SESSION_ID).await.unwrap();

        created.assert_async().await;
        login.assert_async().await;
        ended.assert_async().await;
    }

    #[tokio::test]
    async fn test_stream_description_collects_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("/sessions/{}/description", SESSION_ID).as_str())
            .with_status(200)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body("About the Air Quality Index ozone (O₃) ")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let mut collected = String::new();
        client
            .stream_description(SESSION_ID, |text| collected.push_str(text))
            .await
            .unwrap();

        assert_eq!(collected, "About the Air Quality Index ozone (O₃) ");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
