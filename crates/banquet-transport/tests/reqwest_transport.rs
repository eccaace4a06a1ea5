//! Integration tests for the reqwest transport against a local mock server.
//!
//! `wiremock` spins up a real HTTP server on a random port, so these tests
//! exercise the full request path: URL joining, headers, body, and status
//! passthrough.

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use banquet_transport::{
        ApiRequest, HttpTransport, ReqwestTransport, TransportError,
    };
    use http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_get_with_bearer_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri()).unwrap();
        let resp = transport
            .send(ApiRequest::get("/api/users").bearer("A1").unwrap())
            .await
            .expect("request should succeed");

        assert_eq!(resp.status, StatusCode::OK);
        let users: serde_json::Value = resp.json().unwrap();
        assert_eq!(users[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_send_post_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "refreshToken": "R1" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri()).unwrap();
        let req = ApiRequest::post("/api/auth/refresh")
            .json(&json!({ "refreshToken": "R1" }))
            .unwrap();
        let resp = transport.send(req).await.unwrap();

        assert!(resp.is_success());
    }

    #[tokio::test]
    async fn test_send_unauthorized_is_a_response_not_an_error() {
        // Status codes never turn into TransportError; the session layer
        // needs to see the 401 to decide whether to refresh.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri()).unwrap();
        let resp = transport.send(ApiRequest::get("/api/auth/me")).await;

        assert!(resp.expect("401 is still a response").is_unauthorized());
    }

    #[tokio::test]
    async fn test_send_to_closed_port_returns_request_error() {
        // Bind a server, grab its address, then drop it so nothing listens.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let transport = ReqwestTransport::new(uri).unwrap();
        let result = transport.send(ApiRequest::get("/api/auth/me")).await;

        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
