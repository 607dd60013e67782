//! Session lifecycle and CORS integration tests.

#[cfg(test)]
mod tests {
    use saltsign_auth::canonical::Payload;
    use saltsign_core::SaltSignConfig;

    use crate::{client, fetch_salt, login, now, signed_body, spawn_server, spawn_server_with};

    async fn session_json(
        client: &reqwest::Client,
        url: String,
        cookie: Option<&str>,
    ) -> serde_json::Value {
        let mut request = client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request
            .send()
            .await
            .expect("GET /api/session")
            .json()
            .await
            .expect("session JSON")
    }

    #[tokio::test]
    async fn test_should_track_session_until_logout() {
        let server = spawn_server().await;
        let client = client();

        let anonymous = session_json(&client, server.url("/api/session"), None).await;
        assert_eq!(anonymous["ok"], false);
        assert!(anonymous["user"].is_null());

        let cookie = login(&client, &server, "admin", "password").await;
        let active = session_json(&client, server.url("/api/session"), Some(&cookie)).await;
        assert_eq!(active["ok"], true);
        assert_eq!(active["user"], "admin");

        let response = client
            .post(server.url("/api/logout"))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .expect("POST /api/logout");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let after = session_json(&client, server.url("/api/session"), Some(&cookie)).await;
        assert_eq!(after["ok"], false);
    }

    #[tokio::test]
    async fn test_should_treat_forged_session_cookie_as_anonymous() {
        let server = spawn_server().await;
        let client = client();
        let forged = format!("session_id={}", "ab".repeat(32));
        let json = session_json(&client, server.url("/api/session"), Some(&forged)).await;
        assert_eq!(json["ok"], false);
    }

    #[tokio::test]
    async fn test_should_reject_reused_nonce_when_enabled() {
        let config = SaltSignConfig::builder()
            .nonce_replay_protection(true)
            .build();
        let server = spawn_server_with(config).await;
        let client = client();

        let mut statuses = Vec::new();
        for _ in 0..2 {
            let salt = fetch_salt(&client, &server).await;
            let body = signed_body(
                &salt,
                "/api/login",
                "admin",
                "password",
                now(),
                "fixed",
                &Payload::default(),
            );
            let response = client
                .post(server.url("/api/login"))
                .json(&body)
                .send()
                .await
                .expect("POST /api/login");
            statuses.push(response.status());
        }
        assert_eq!(
            statuses,
            [reqwest::StatusCode::OK, reqwest::StatusCode::UNAUTHORIZED]
        );
    }

    #[tokio::test]
    async fn test_should_answer_preflight_for_allowed_origin_only() {
        let server = spawn_server().await;
        let client = client();

        let allowed = client
            .request(reqwest::Method::OPTIONS, server.url("/api/login"))
            .header(reqwest::header::ORIGIN, "http://localhost:5000")
            .send()
            .await
            .expect("OPTIONS allowed");
        assert_eq!(allowed.status(), reqwest::StatusCode::NO_CONTENT);
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5000")
        );

        let denied = client
            .request(reqwest::Method::OPTIONS, server.url("/api/login"))
            .header(reqwest::header::ORIGIN, "http://evil.test")
            .send()
            .await
            .expect("OPTIONS denied");
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
