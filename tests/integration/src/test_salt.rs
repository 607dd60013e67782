//! Salt issuance integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, fetch_salt, spawn_server};

    #[tokio::test]
    async fn test_should_issue_distinct_salts() {
        let server = spawn_server().await;
        let client = client();

        let response = client
            .get(server.url("/api/salt"))
            .send()
            .await
            .expect("GET /api/salt");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json: serde_json::Value = response.json().await.expect("salt JSON");
        assert_eq!(json["expires_in"], 60);
        assert_eq!(json["salt_id"].as_str().map(str::len), Some(32));

        let other = fetch_salt(&client, &server).await;
        assert_ne!(json["salt_id"].as_str(), Some(other.salt_id.as_str()));
        assert_eq!(server.store.len(), 2);
    }

    #[tokio::test]
    async fn test_should_answer_health_and_version() {
        let server = spawn_server().await;
        let client = client();

        let health: serde_json::Value = client
            .get(server.url("/health"))
            .send()
            .await
            .expect("GET /health")
            .json()
            .await
            .expect("health JSON");
        assert_eq!(health["status"], "running");

        let version: serde_json::Value = client
            .get(server.url("/api/version"))
            .send()
            .await
            .expect("GET /api/version")
            .json()
            .await
            .expect("version JSON");
        assert!(version["version"].is_string());
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_unknown_path() {
        let server = spawn_server().await;
        let response = client()
            .get(server.url("/api/unknown"))
            .send()
            .await
            .expect("GET unknown");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "not_found");
    }
}
