//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all moodmix-server endpoints.
//!
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client identifying itself through the client id header
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Value sent in the client id header, if any
    pub client_id: Option<String>,
}

impl TestClient {
    /// Creates a client without a client id; the server falls back to its address
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            client_id: None,
        }
    }

    /// Creates a client that rate limits under its own id
    pub fn with_client_id(base_url: String, client_id: &str) -> Self {
        let mut client = Self::new(base_url);
        client.client_id = Some(client_id.to_string());
        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub async fn get_status(&self) -> Response {
        self.client
            .get(self.url("/v1/status"))
            .send()
            .await
            .expect("Status request failed")
    }

    // ========================================================================
    // Personas
    // ========================================================================

    pub async fn get_personas(&self) -> Response {
        self.client
            .get(self.url("/v1/personas"))
            .send()
            .await
            .expect("Personas request failed")
    }

    pub async fn get_persona(&self, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/personas/{}", id)))
            .send()
            .await
            .expect("Persona request failed")
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    /// POST an arbitrary JSON body to the recommendations endpoint
    pub async fn post_recommendations(&self, body: Value) -> Response {
        let mut request = self.client.post(self.url("/v1/recommendations")).json(&body);
        if let Some(id) = &self.client_id {
            request = request.header(CLIENT_ID_HEADER, id);
        }
        request.send().await.expect("Recommendations request failed")
    }

    /// Request recommendations for a mood and optional persona
    pub async fn recommend(&self, mood: Option<&str>, persona_id: Option<&str>) -> Response {
        let mut body = json!({});
        if let Some(mood) = mood {
            body["mood"] = json!(mood);
        }
        if let Some(persona_id) = persona_id {
            body["personaId"] = json!(persona_id);
        }
        self.post_recommendations(body).await
    }

    /// POST a raw, possibly malformed body
    pub async fn post_raw_recommendations(&self, body: &str) -> Response {
        self.client
            .post(self.url("/v1/recommendations"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Recommendations request failed")
    }
}
