//! E2E tests for the access gate

mod common;

use std::sync::atomic::Ordering;

use common::{SESSION_COOKIE, TEST_EMAIL, TestServer, location, no_redirect_client};

#[tokio::test]
async fn test_protected_route_without_session_redirects_to_login() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/dashboard"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(location(&response), "/auth/login?redirectTo=%2Fdashboard");
}

#[tokio::test]
async fn test_nested_protected_route_keeps_full_return_path() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/formulario/nueva"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(
        location(&response),
        "/auth/login?redirectTo=%2Fformulario%2Fnueva"
    );
}

#[tokio::test]
async fn test_every_protected_prefix_is_enforced() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    for path in ["/admin", "/dashboard", "/formulario", "/profile", "/settings"] {
        let response = client.get(&server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 307, "{path} should be protected");
    }
}

#[tokio::test]
async fn test_prefix_lookalike_is_not_protected() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/dashboards"))
        .send()
        .await
        .unwrap();

    // Falls through to the router: no such page
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_public_route_passes_through() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        server.fakes.authority.refresh_calls.load(Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn test_login_page_with_session_redirects_to_landing() {
    let server = TestServer::new().await;
    let client = no_redirect_client();

    for path in ["/auth/login", "/login"] {
        let response = client
            .get(&server.url(path))
            .header("Cookie", server.session_cookie())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 307, "{path}");
        assert_eq!(location(&response), "/dashboard");
    }
}

#[tokio::test]
async fn test_protected_route_with_session_is_served() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/dashboard"))
        .header("Cookie", server.session_cookie())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains(TEST_EMAIL));
}

#[tokio::test]
async fn test_chunked_session_cookie_counts_as_evidence() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/dashboard"))
        .header("Cookie", format!("{SESSION_COOKIE}.0=base64-eyJ"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_expiring_session_is_refreshed() {
    let server = TestServer::new().await;

    let response = no_redirect_client()
        .get(&server.url("/dashboard"))
        .header("Cookie", server.session_cookie_expiring_in(-30))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        server.fakes.authority.refresh_calls.load(Ordering::SeqCst),
        1
    );

    let renewed = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with(&format!("{SESSION_COOKIE}=base64-")));
    assert!(renewed, "refreshed cookie should be written back");
}

#[tokio::test]
async fn test_refresh_failure_does_not_block_request() {
    let server = TestServer::new().await;
    server
        .fakes
        .authority
        .fail_refresh
        .store(true, Ordering::SeqCst);

    let client = no_redirect_client();
    for path in ["/", "/dashboard"] {
        let response = client
            .get(&server.url(path))
            .header("Cookie", server.session_cookie_expiring_in(-30))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200, "{path}");
        assert!(!response.headers().contains_key("set-cookie"));
    }
    assert_eq!(
        server.fakes.authority.refresh_calls.load(Ordering::SeqCst),
        2
    );
}

#[tokio::test]
async fn test_forged_cookie_passes_gate_but_not_api() {
    let server = TestServer::new().await;
    let forged = format!("{SESSION_COOKIE}=not-a-real-session");
    let client = no_redirect_client();

    // Presence alone satisfies the gate
    let response = client
        .get(&server.url("/dashboard"))
        .header("Cookie", &forged)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The handler re-verifies identity
    let response = client
        .post(&server.url("/api/visitas/estado"))
        .header("Cookie", &forged)
        .json(&serde_json::json!({ "visitaId": "v1", "estado": "APROBADO" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
