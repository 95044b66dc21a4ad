mod common;

use anyhow::Result;
use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{expired_token, json_body, mint, request, router, send, token_for, Canned, FakeUpstream};

#[tokio::test]
async fn missing_cookie_is_401_without_upstream_call() -> Result<()> {
    let upstream = FakeUpstream::new();
    let app = router(upstream.clone());

    // Problem envelope family
    let res = send(&app, request(Method::GET, "/api/roles", None, None)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(res).await?;
    assert_eq!(body["status"], 401);
    assert_eq!(body["errors"]["Authorization"][0], "Unauthorized access. Please login.");

    // Message envelope family
    let res = send(&app, request(Method::POST, "/api/appointments", None, Some(json!({})))).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await?, json!({ "message": "Unauthorized" }));

    assert_eq!(upstream.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn expired_cookie_still_passes_the_proxy_gate() -> Result<()> {
    // Per-resource routes check presence only; the upstream re-validates.
    let upstream = FakeUpstream::new();
    upstream.on(Method::GET, "/Roles", Canned::json(200, json!([])));
    let app = router(upstream.clone());

    let res = send(&app, request(Method::GET, "/api/roles", Some(&expired_token("admin")), None)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(upstream.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn login_requires_credentials_before_calling_upstream() -> Result<()> {
    let upstream = FakeUpstream::new();
    let app = router(upstream.clone());

    let res = send(&app, request(Method::POST, "/api/auth/login", None, Some(json!({ "username": "amina" })))).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await?;
    assert_eq!(body["errors"]["password"][0], "password is required");
    assert_eq!(upstream.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn login_sets_http_only_cookie_and_returns_user() -> Result<()> {
    let issued = token_for("Doctor");
    let upstream = FakeUpstream::new();
    upstream.on(Method::POST, "/Auth/login", Canned::json(200, json!({ "token": issued })));
    let app = router(upstream.clone());

    let res = send(
        &app,
        request(Method::POST, "/api/auth/login", None, Some(json!({ "username": " amina ", "password": "pw" }))),
    )
    .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers()[header::SET_COOKIE].to_str()?.to_string();
    assert!(cookie.starts_with(&format!("token={}", issued)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=3600"));

    let body = json_body(res).await?;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["role"], "doctor");
    assert_eq!(body["user"]["userName"], "amina");

    let call = &upstream.calls()[0];
    assert_eq!(call.token, None);
    assert_eq!(call.body.as_ref().unwrap()["username"], "amina");
    Ok(())
}

#[tokio::test]
async fn rejected_login_forwards_status_and_message() -> Result<()> {
    let upstream = FakeUpstream::new();
    upstream.on(
        Method::POST,
        "/Auth/login",
        Canned::json(401, json!({ "message": "Invalid username or password" })),
    );
    let app = router(upstream);

    let res = send(
        &app,
        request(Method::POST, "/api/auth/login", None, Some(json!({ "username": "amina", "password": "bad" }))),
    )
    .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(json_body(res).await?["message"], "Invalid username or password");
    Ok(())
}

#[tokio::test]
async fn logout_expires_the_cookie() -> Result<()> {
    let app = router(FakeUpstream::new());

    let res = send(&app, request(Method::POST, "/api/auth/logout", Some(&token_for("admin")), None)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers()[header::SET_COOKIE].to_str()?;
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn me_checks_expiry() -> Result<()> {
    let app = router(FakeUpstream::new());

    let res = send(&app, request(Method::GET, "/api/auth/me", Some(&token_for("Receptionist")), None)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await?;
    assert_eq!(body["userId"], "42");
    assert_eq!(body["role"], "receptionist");

    let res = send(&app, request(Method::GET, "/api/auth/me", Some(&expired_token("admin")), None)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await?, json!({ "message": "Unauthorized" }));

    let no_exp = mint(json!({ "userId": "1", "role": "admin" }));
    let res = send(&app, request(Method::GET, "/api/auth/me", Some(&no_exp), None)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, request(Method::GET, "/api/auth/me", Some("not-a-jwt"), None)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
