use crate::auth::JwtConfig;

/// 服务器配置 - 平台 API 的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | BOOTSTRAP_STAFF_PHONE | +10000000000 | 初始管理员手机号 |
/// | BOOTSTRAP_STAFF_PASSWORD | (开发默认) | 初始管理员密码 |
/// | IDEMPOTENCY_TTL_HOURS | 24 | 幂等缓存 TTL |
/// | AUTH_RATE_LIMIT | 10 | 认证接口每窗口最大请求数 |
/// | AUTH_RATE_WINDOW_SECS | 60 | 认证接口限流窗口 |
/// | WEBHOOK_TIMEOUT_SECS | 10 | 单次推送超时 |
/// | WEBHOOK_MAX_ATTEMPTS | 3 | 推送重试次数 |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 ENVIRONMENT=production cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志目录 (可选)
    pub log_dir: Option<String>,

    // === 初始管理员 ===
    /// 初始 staff 账户手机号（首次启动播种）
    pub bootstrap_staff_phone: String,
    /// 初始 staff 账户密码
    pub bootstrap_staff_password: String,

    // === 中间件参数 ===
    /// 幂等缓存 TTL (毫秒)
    pub idempotency_ttl_ms: i64,
    /// 认证接口限流：窗口内最大请求数
    pub auth_rate_limit: u32,
    /// 认证接口限流：窗口长度 (毫秒)
    pub auth_rate_window_ms: i64,

    // === Webhook 推送 ===
    /// 单次推送超时 (秒)
    pub webhook_timeout_secs: u64,
    /// 最大尝试次数（含首次）
    pub webhook_max_attempts: u32,
    /// 线性退避步长 (毫秒)：第 n 次重试前等待 n * backoff
    pub webhook_backoff_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok(),

            bootstrap_staff_phone: std::env::var("BOOTSTRAP_STAFF_PHONE")
                .unwrap_or_else(|_| "+10000000000".into()),
            bootstrap_staff_password: std::env::var("BOOTSTRAP_STAFF_PASSWORD")
                .unwrap_or_else(|_| "change-me-on-first-login".into()),

            idempotency_ttl_ms: std::env::var("IDEMPOTENCY_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24)
                * 60
                * 60
                * 1000,
            auth_rate_limit: std::env::var("AUTH_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            auth_rate_window_ms: std::env::var("AUTH_RATE_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60)
                * 1000,

            webhook_timeout_secs: std::env::var("WEBHOOK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            webhook_max_attempts: std::env::var("WEBHOOK_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            webhook_backoff_ms: std::env::var("WEBHOOK_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.http_port = http_port;
        config
    }

    /// 测试用配置：固定密钥、零退避、快超时
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-characters!".into(),
                access_minutes: 15,
                refresh_days: 7,
                issuer: "haul-api".into(),
                audience: "haul-clients".into(),
            },
            environment: "test".into(),
            log_dir: None,
            bootstrap_staff_phone: "+10000000000".into(),
            bootstrap_staff_password: "bootstrap-password-1".into(),
            idempotency_ttl_ms: 24 * 60 * 60 * 1000,
            auth_rate_limit: 10,
            auth_rate_window_ms: 60_000,
            webhook_timeout_secs: 2,
            webhook_max_attempts: 1,
            webhook_backoff_ms: 0,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
