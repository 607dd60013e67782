//! Signed login integration tests.

#[cfg(test)]
mod tests {
    use saltsign_auth::canonical::Payload;

    use crate::{client, fetch_salt, now, session_cookie, signed_body, spawn_server};

    #[tokio::test]
    async fn test_should_login_then_reject_identical_replay() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/login",
            "admin",
            "password",
            now(),
            "n1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/login");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("Set-Cookie")
            .to_owned();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(session_cookie(&response).is_some());
        let json: serde_json::Value = response.json().await.expect("login JSON");
        assert_eq!(json["ok"], true);
        assert_eq!(json["user"], "admin");

        let replay = client
            .post(server.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("replayed POST /api/login");
        assert_eq!(replay.status(), reqwest::StatusCode::BAD_REQUEST);
        let json: serde_json::Value = replay.json().await.expect("replay JSON");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "salt_invalid");
    }

    #[tokio::test]
    async fn test_should_reject_stale_timestamp() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/login",
            "admin",
            "password",
            now() - 3_600,
            "n1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/login");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "timestamp_expired");
    }

    #[tokio::test]
    async fn test_should_reject_wrong_password() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/login",
            "admin",
            "not-the-password",
            now(),
            "n1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/login");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert!(session_cookie(&response).is_none());
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "sig_mismatch");
    }

    #[tokio::test]
    async fn test_should_reject_unknown_user() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/login",
            "mallory",
            "password",
            now(),
            "n1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/login"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/login");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "user_not_found");
    }

    #[tokio::test]
    async fn test_should_reject_missing_fields() {
        let server = spawn_server().await;
        let response = client()
            .post(server.url("/api/login"))
            .json(&serde_json::json!({ "username": "admin" }))
            .send()
            .await
            .expect("POST /api/login");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "input_malformed");
    }

    #[tokio::test]
    async fn test_should_allow_only_one_of_concurrent_logins_with_same_salt() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/login",
            "admin",
            "password",
            now(),
            "n1",
            &Payload::default(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            let url = server.url("/api/login");
            let body = body.clone();
            handles.push(tokio::spawn(async move {
                client
                    .post(url)
                    .json(&body)
                    .send()
                    .await
                    .expect("POST /api/login")
                    .status()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.expect("join") == reqwest::StatusCode::OK {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
    }
}
