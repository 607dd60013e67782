//! Session-bound query integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use saltsign_auth::canonical::Payload;

    use crate::{client, fetch_salt, login, now, signed_body, spawn_server};

    #[tokio::test]
    async fn test_should_return_rows_for_signed_query() {
        let server = spawn_server().await;
        let client = client();
        let cookie = login(&client, &server, "admin", "password").await;

        let salt = fetch_salt(&client, &server).await;
        let params = Payload::Params(BTreeMap::from([("q".to_owned(), "all users".to_owned())]));
        let body = signed_body(&salt, "/api/query", "admin", "password", now(), "q1", &params);

        let response = client
            .post(server.url("/api/query"))
            .header(reqwest::header::COOKIE, &cookie)
            .json(&body)
            .send()
            .await
            .expect("POST /api/query");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = response.json().await.expect("rows JSON");
        assert_eq!(json["ok"], true);
        let names: Vec<&str> = json["rows"]
            .as_array()
            .expect("rows")
            .iter()
            .filter_map(|row| row["name"].as_str())
            .collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_should_reject_query_without_session() {
        let server = spawn_server().await;
        let client = client();
        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/query",
            "admin",
            "password",
            now(),
            "q1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/query"))
            .json(&body)
            .send()
            .await
            .expect("POST /api/query");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "not_logged_in");
    }

    #[tokio::test]
    async fn test_should_reject_tampered_params() {
        let server = spawn_server().await;
        let client = client();
        let cookie = login(&client, &server, "admin", "password").await;

        let salt = fetch_salt(&client, &server).await;
        let params = Payload::Params(BTreeMap::from([("q".to_owned(), "mine".to_owned())]));
        let mut body = signed_body(&salt, "/api/query", "admin", "password", now(), "q1", &params);
        body["params"]["q"] = serde_json::Value::from("everything");

        let response = client
            .post(server.url("/api/query"))
            .header(reqwest::header::COOKIE, &cookie)
            .json(&body)
            .send()
            .await
            .expect("POST /api/query");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "sig_mismatch");
    }

    #[tokio::test]
    async fn test_should_reject_query_signed_by_another_user() {
        let server = spawn_server().await;
        let client = client();
        let cookie = login(&client, &server, "admin", "password").await;

        let salt = fetch_salt(&client, &server).await;
        let body = signed_body(
            &salt,
            "/api/query",
            "alice",
            "wonderland",
            now(),
            "q1",
            &Payload::default(),
        );

        let response = client
            .post(server.url("/api/query"))
            .header(reqwest::header::COOKIE, &cookie)
            .json(&body)
            .send()
            .await
            .expect("POST /api/query");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = response.json().await.expect("error JSON");
        assert_eq!(json["error"], "session_mismatch");
    }
}
