//! 端到端集成测试
//!
//! 通过 oneshot 驱动完整中间件链（语言/沙箱/认证/幂等/权限 gate），
//! 每个测试一套隔离的内存状态。

use std::sync::Arc;

use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Value, json};

use api_server::core::{Config, ServerState};
use api_server::routes::OneshotRouter;

async fn test_state() -> Arc<ServerState> {
    ServerState::initialize(&Config::for_tests()).await.unwrap()
}

struct TestRequest<'a> {
    method: &'a str,
    uri: &'a str,
    token: Option<&'a str>,
    body: Option<Value>,
    headers: Vec<(&'a str, String)>,
}

impl<'a> TestRequest<'a> {
    fn new(method: &'a str, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            token: None,
            body: None,
            headers: Vec::new(),
        }
    }

    fn bearer(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn header(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    async fn send(self, state: &Arc<ServerState>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }
        let request = match self.body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = state.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// 注册一个账户并返回 (user_id, access_token, refresh_token)
async fn register(
    state: &Arc<ServerState>,
    phone: &str,
    user_type: &str,
) -> (i64, String, String) {
    let (status, body) = TestRequest::new("POST", "/api/auth/register")
        .json(json!({
            "phone": phone,
            "password": "password-123",
            "type": user_type,
        }))
        .send(state)
        .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let data = &body["data"];
    (
        data["user"]["id"].as_i64().unwrap(),
        data["tokens"]["accessToken"].as_str().unwrap().to_string(),
        data["tokens"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// 初始 staff（admin）登录
async fn staff_token(state: &Arc<ServerState>) -> String {
    let (status, body) = TestRequest::new("POST", "/api/auth/login")
        .json(json!({
            "phone": "+10000000000",
            "password": "bootstrap-password-1",
        }))
        .send(state)
        .await;
    assert_eq!(status, StatusCode::OK, "staff login failed: {body}");
    body["data"]["tokens"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_address(state: &Arc<ServerState>, token: &str) -> i64 {
    let (status, body) = TestRequest::new("POST", "/api/addresses")
        .bearer(token)
        .json(json!({"line": "12 Recycling Way", "city": "Springfield"}))
        .send(state)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().unwrap()
}

async fn create_order(state: &Arc<ServerState>, token: &str, address_id: i64) -> i64 {
    let (status, body) = TestRequest::new("POST", "/api/orders")
        .bearer(token)
        .json(json!({"addressId": address_id, "price": 50.0}))
        .send(state)
        .await;
    assert_eq!(status, StatusCode::CREATED, "order create failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

// ==================== 健康与信封 ====================

#[tokio::test]
async fn test_health_is_public() {
    let state = test_state().await;
    let (status, body) = TestRequest::new("GET", "/api/health").send(&state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_language_negotiation_sets_content_language() {
    let state = test_state().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .header("accept-language", "ru-RU,ru;q=0.9")
        .body(Body::empty())
        .unwrap();
    let response = state.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("content-language").unwrap(),
        "ru"
    );
}

#[tokio::test]
async fn test_error_envelope_shape() {
    let state = test_state().await;
    let (status, body) = TestRequest::new("GET", "/api/orders").send(&state).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"]["key"].as_str().unwrap().starts_with("error."));
}

// ==================== 订单全流程 ====================

#[tokio::test]
async fn test_full_order_lifecycle() {
    let state = test_state().await;
    let (_, client_token, _) = register(&state, "+15550000001", "client").await;
    let (courier_id, courier_token, _) = register(&state, "+15550000002", "courier").await;
    let staff = staff_token(&state).await;

    let address_id = create_address(&state, &client_token).await;
    let order_id = create_order(&state, &client_token, address_id).await;

    // 指派（staff 持 orders.assign）
    let (status, body) = TestRequest::new("POST", &format!("/api/orders/{order_id}/assign"))
        .bearer(&staff)
        .json(json!({"courierId": courier_id}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK, "assign failed: {body}");
    assert_eq!(body["data"]["status"], "assigned");

    // 快递员接单
    let (status, _) = TestRequest::new(
        "POST",
        &format!("/api/courier/orders/{order_id}/accept"),
    )
    .bearer(&courier_token)
    .json(json!({}))
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::OK);

    // 完成：财务快照 + 完成数
    let (status, body) = TestRequest::new(
        "POST",
        &format!("/api/courier/orders/{order_id}/complete"),
    )
    .bearer(&courier_token)
    .json(json!({}))
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["finance"]["courierPayout"], 40.0);
    assert_eq!(body["data"]["finance"]["platformFee"], 10.0);

    let (_, profile) = TestRequest::new("GET", "/api/courier/profile")
        .bearer(&courier_token)
        .send(&state)
        .await;
    assert_eq!(profile["data"]["completedOrdersCount"], 1);

    // 终态后取消 → 409
    let (status, body) = TestRequest::new("POST", &format!("/api/orders/{order_id}/cancel"))
        .bearer(&client_token)
        .json(json!({"reason": "too late"}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["key"], "error.order.invalid_transition");
    assert_eq!(body["error"]["params"]["from"], "completed");

    // 时间线包含四个事件
    let (_, events) = TestRequest::new("GET", &format!("/api/orders/{order_id}/events"))
        .bearer(&client_token)
        .send(&state)
        .await;
    assert_eq!(events["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_cancel_reason_recorded() {
    let state = test_state().await;
    let (_, client_token, _) = register(&state, "+15550000011", "client").await;
    let address_id = create_address(&state, &client_token).await;
    let order_id = create_order(&state, &client_token, address_id).await;

    let (status, _) = TestRequest::new("POST", &format!("/api/orders/{order_id}/cancel"))
        .bearer(&client_token)
        .json(json!({"reason": "schedule conflict"}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, events) = TestRequest::new("GET", &format!("/api/orders/{order_id}/events"))
        .bearer(&client_token)
        .send(&state)
        .await;
    let cancelled = events["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["eventType"] == "cancelled")
        .unwrap();
    assert_eq!(cancelled["metadata"]["reason"], "schedule conflict");
}

#[tokio::test]
async fn test_assign_requires_permission() {
    let state = test_state().await;
    let (_, client_token, _) = register(&state, "+15550000021", "client").await;
    let (courier_id, _, _) = register(&state, "+15550000022", "courier").await;
    let address_id = create_address(&state, &client_token).await;
    let order_id = create_order(&state, &client_token, address_id).await;

    // 普通 client 无 orders.assign
    let (status, body) = TestRequest::new("POST", &format!("/api/orders/{order_id}/assign"))
        .bearer(&client_token)
        .json(json!({"courierId": courier_id}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // 错误只点名要求的权限
    assert_eq!(body["error"]["params"]["required"], json!(["orders.assign"]));
}

#[tokio::test]
async fn test_orders_are_owner_scoped() {
    let state = test_state().await;
    let (_, owner_token, _) = register(&state, "+15550000031", "client").await;
    let (_, stranger_token, _) = register(&state, "+15550000032", "client").await;
    let address_id = create_address(&state, &owner_token).await;
    let order_id = create_order(&state, &owner_token, address_id).await;

    let (status, _) = TestRequest::new("GET", &format!("/api/orders/{order_id}"))
        .bearer(&stranger_token)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 他人地址不可用于下单
    let (status, _) = TestRequest::new("POST", "/api/orders")
        .bearer(&stranger_token)
        .json(json!({"addressId": address_id, "price": 10.0}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== 幂等 ====================

#[tokio::test]
async fn test_idempotent_order_creation() {
    let state = test_state().await;
    let (_, client_token, _) = register(&state, "+15550000041", "client").await;
    let address_id = create_address(&state, &client_token).await;

    let make = |key: &'static str| {
        TestRequest::new("POST", "/api/orders")
            .bearer(&client_token)
            .header("Idempotency-Key", key)
            .json(json!({"addressId": address_id, "price": 25.0}))
    };

    let (status1, body1) = make("order-abc").send(&state).await;
    let (status2, body2) = make("order-abc").send(&state).await;
    assert_eq!(status1, StatusCode::CREATED);
    // 重放：状态码与响应体逐字一致
    assert_eq!(status2, StatusCode::CREATED);
    assert_eq!(body1, body2);

    let (_, list) = TestRequest::new("GET", "/api/orders")
        .bearer(&client_token)
        .send(&state)
        .await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1, "mutation ran twice");

    // 不同 key 正常创建第二单
    let (status3, body3) = make("order-def").send(&state).await;
    assert_eq!(status3, StatusCode::CREATED);
    assert_ne!(body1["data"]["id"], body3["data"]["id"]);
}

// ==================== 会话与认证 ====================

#[tokio::test]
async fn test_refresh_rotation_is_single_use() {
    let state = test_state().await;
    let (_, _, refresh_token) = register(&state, "+15550000051", "client").await;

    let (status, body) = TestRequest::new("POST", "/api/auth/refresh")
        .json(json!({"refreshToken": refresh_token}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refreshToken"].as_str().unwrap().to_string();

    // 旧 token 重放失败，且错误是泛化的
    let (status, body) = TestRequest::new("POST", "/api/auth/refresh")
        .json(json!({"refreshToken": refresh_token}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["key"], "error.auth.unauthenticated");

    let (status, _) = TestRequest::new("POST", "/api/auth/refresh")
        .json(json!({"refreshToken": rotated}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_all_kills_refresh() {
    let state = test_state().await;
    let (_, access, refresh) = register(&state, "+15550000061", "client").await;

    let (status, _) = TestRequest::new("POST", "/api/auth/logout-all")
        .bearer(&access)
        .json(json!({}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = TestRequest::new("POST", "/api/auth/refresh")
        .json(json!({"refreshToken": refresh}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blocked_user_is_rejected_mid_session() {
    let state = test_state().await;
    let (user_id, access, _) = register(&state, "+15550000071", "client").await;
    let staff = staff_token(&state).await;

    let (status, _) = TestRequest::new("PATCH", &format!("/api/users/{user_id}"))
        .bearer(&staff)
        .json(json!({"status": "blocked"}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);

    // 未过期的 access token 也被拒
    let (status, body) = TestRequest::new("GET", "/api/auth/me")
        .bearer(&access)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["key"], "error.auth.account_blocked");
}

#[tokio::test]
async fn test_soft_deleted_user_rejected_and_listed_with_flag() {
    let state = test_state().await;
    let (user_id, access, _) = register(&state, "+15550000081", "client").await;
    let staff = staff_token(&state).await;

    let (status, _) = TestRequest::new("DELETE", &format!("/api/users/{user_id}"))
        .bearer(&staff)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = TestRequest::new("GET", "/api/auth/me")
        .bearer(&access)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 默认列表不含墓碑；includeDeleted=true 可见
    let (_, body) = TestRequest::new("GET", "/api/users")
        .bearer(&staff)
        .send(&state)
        .await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["id"].as_i64() != Some(user_id))
    );
    let (_, body) = TestRequest::new("GET", "/api/users?includeDeleted=true")
        .bearer(&staff)
        .send(&state)
        .await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|u| u["id"].as_i64() == Some(user_id))
    );

    // 同手机号不可再注册
    let (status, body) = TestRequest::new("POST", "/api/auth/register")
        .json(json!({"phone": "+15550000081", "password": "password-123"}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

// ==================== RBAC ====================

#[tokio::test]
async fn test_role_revocation_is_immediate() {
    let state = test_state().await;
    let (user_id, access, _) = register(&state, "+15550000091", "client").await;
    let staff = staff_token(&state).await;

    // 建一个带 audit.read 的角色并授予
    let (status, body) = TestRequest::new("POST", "/api/roles")
        .bearer(&staff)
        .json(json!({"name": "auditor", "permissions": ["audit.read"]}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = TestRequest::new("POST", &format!("/api/users/{user_id}/roles"))
        .bearer(&staff)
        .json(json!({"roleId": role_id}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = TestRequest::new("GET", "/api/audit-logs")
        .bearer(&access)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);

    // 回收后同一 access token 下一个请求即 403
    let (status, _) = TestRequest::new(
        "DELETE",
        &format!("/api/users/{user_id}/roles/{role_id}"),
    )
    .bearer(&staff)
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = TestRequest::new("GET", "/api/audit-logs")
        .bearer(&access)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_permission_rejected_at_role_creation() {
    let state = test_state().await;
    let staff = staff_token(&state).await;

    let (status, _) = TestRequest::new("POST", "/api/roles")
        .bearer(&staff)
        .json(json!({"name": "bogus", "permissions": ["orders.world_domination"]}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ==================== 审计 ====================

#[tokio::test]
async fn test_audit_trail_for_privileged_actions() {
    let state = test_state().await;
    let (user_id, _, _) = register(&state, "+15550000101", "client").await;
    let staff = staff_token(&state).await;

    TestRequest::new("PATCH", &format!("/api/users/{user_id}"))
        .bearer(&staff)
        .json(json!({"status": "blocked"}))
        .send(&state)
        .await;

    let (status, body) = TestRequest::new("GET", "/api/audit-logs?action=user_blocked")
        .bearer(&staff)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["data"].as_array().unwrap()[0];
    assert_eq!(entry["entityType"], "user");
    // diff 只含实际变化的字段
    let changes = entry["changes"].as_array().unwrap();
    assert!(changes.iter().any(|c| c["field"] == "status"));

    // 链验证
    let (status, body) = TestRequest::new("GET", "/api/audit-logs/verify")
        .bearer(&staff)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chainIntact"], true);
}

// ==================== 沙箱与限流 ====================

#[tokio::test]
async fn test_sandbox_write_guard() {
    let state = test_state().await;
    let staff = staff_token(&state).await;

    // 允许路径：沙箱下照常写
    let (_, client_token, _) = register(&state, "+15550000111", "client").await;
    let address_id = create_address(&state, &client_token).await;
    let (status, _) = TestRequest::new("POST", "/api/orders")
        .bearer(&client_token)
        .header("X-Sandbox", "true")
        .json(json!({"addressId": address_id, "price": 5.0}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // 允许路径之外的写被 403
    let (status, body) = TestRequest::new("POST", "/api/webhooks")
        .bearer(&staff)
        .header("X-Sandbox", "true")
        .json(json!({
            "url": "https://example.com/hook",
            "secret": "0123456789abcdef",
            "events": ["order.created"],
        }))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["key"], "error.sandbox.write_blocked");

    // 读不受限
    let (status, _) = TestRequest::new("GET", "/api/webhooks")
        .bearer(&staff)
        .header("X-Sandbox", "true")
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_rate_limit() {
    let state = test_state().await;
    let attempt = || {
        TestRequest::new("POST", "/api/auth/login").json(json!({
            "phone": "+19990000000",
            "password": "wrong",
        }))
    };

    for _ in 0..10 {
        let (status, _) = attempt().send(&state).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = attempt().send(&state).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["key"], "error.throttle.rate_limited");
}

// ==================== Webhook 管理 ====================

#[tokio::test]
async fn test_webhook_crud_hides_secret() {
    let state = test_state().await;
    let staff = staff_token(&state).await;

    let (status, body) = TestRequest::new("POST", "/api/webhooks")
        .bearer(&staff)
        .json(json!({
            "url": "https://example.com/hook",
            "secret": "0123456789abcdef",
            "events": ["order.created", "order.completed"],
        }))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["data"].get("secret").is_none(), "secret leaked");
    let hook_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = TestRequest::new("PATCH", &format!("/api/webhooks/{hook_id}"))
        .bearer(&staff)
        .json(json!({"isActive": false}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (status, body) = TestRequest::new(
        "GET",
        &format!("/api/webhooks/{hook_id}/deliveries"),
    )
    .bearer(&staff)
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = TestRequest::new("DELETE", &format!("/api/webhooks/{hook_id}"))
        .bearer(&staff)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_webhook_creation_audited_without_secret() {
    let state = test_state().await;
    let staff = staff_token(&state).await;

    let (status, _) = TestRequest::new("POST", "/api/webhooks")
        .bearer(&staff)
        .json(json!({
            "url": "https://example.com/audited",
            "secret": "fedcba9876543210",
            "events": ["order.completed"],
        }))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = TestRequest::new("GET", "/api/audit-logs?action=webhook_created")
        .bearer(&staff)
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["data"].as_array().unwrap()[0];
    assert_eq!(entry["entityType"], "webhook");
    let changes = entry["changes"].as_array().unwrap();
    assert!(changes.iter().any(|c| c["field"] == "url"));
    // secret 不入审计日志
    assert!(changes.iter().all(|c| c["field"] != "secret"));
}

// ==================== 快递员资质审核 ====================

#[tokio::test]
async fn test_staff_verifies_courier() {
    let state = test_state().await;
    let (courier_id, courier_token, _) = register(&state, "+15550000201", "courier").await;
    let staff = staff_token(&state).await;

    // 新注册的快递员处于 pending
    let (_, body) = TestRequest::new("GET", "/api/courier/profile")
        .bearer(&courier_token)
        .send(&state)
        .await;
    assert_eq!(body["data"]["verificationStatus"], "pending");

    let (status, body) = TestRequest::new(
        "PATCH",
        &format!("/api/courier/{courier_id}/verification"),
    )
    .bearer(&staff)
    .json(json!({"verificationStatus": "verified"}))
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["verificationStatus"], "verified");

    // 裁决进入审计，diff 只含变化的字段
    let (status, body) = TestRequest::new(
        "GET",
        "/api/audit-logs?action=courier_verification_changed",
    )
    .bearer(&staff)
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["data"].as_array().unwrap()[0];
    assert_eq!(entry["entityType"], "courier");
    let changes = entry["changes"].as_array().unwrap();
    assert!(changes.iter().any(|c| {
        c["field"] == "verificationStatus" && c["from"] == "pending" && c["to"] == "verified"
    }));
}

#[tokio::test]
async fn test_courier_cannot_self_verify() {
    let state = test_state().await;
    let (courier_id, courier_token, _) = register(&state, "+15550000211", "courier").await;

    let (status, body) = TestRequest::new(
        "PATCH",
        &format!("/api/courier/{courier_id}/verification"),
    )
    .bearer(&courier_token)
    .json(json!({"verificationStatus": "verified"}))
    .send(&state)
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"]["params"]["required"],
        json!(["couriers.verify"])
    );
}

// ==================== 确认消息 ====================

#[tokio::test]
async fn test_auth_confirmation_message_keys() {
    let state = test_state().await;

    let (status, body) = TestRequest::new("POST", "/api/auth/register")
        .json(json!({
            "phone": "+15550000221",
            "password": "password-123",
            "type": "client",
        }))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["key"], "message.auth.registered");
    let refresh = body["data"]["tokens"]["refreshToken"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = TestRequest::new("POST", "/api/auth/logout")
        .json(json!({"refreshToken": refresh}))
        .send(&state)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["key"], "message.auth.logged_out");
    assert!(body.get("data").is_none());
}
