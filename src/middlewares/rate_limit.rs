/*!
 * 速率限制中间件
 *
 * 固定窗口计数：同一客户端在一个窗口内超过上限即返回 429。
 * 计数保存在进程内的 moka 缓存里，多实例部署时各自计数。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::{IpAddr, SocketAddr};
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::users::User;
use crate::models::{ApiResponse, ErrorCode};

/// 键: 前缀:客户端:窗口序号，值: 窗口内请求数
static RATE_LIMIT_CACHE: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(MAX_WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

const MAX_WINDOW_SECS: u64 = 3600;

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    /// `window_secs` 超过一小时按一小时计
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, MAX_WINDOW_SECS),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录：5 次/分钟
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 注册：10 次/分钟，同一机房多人注册的情况比较常见
    pub fn register() -> Self {
        Self::new(10, 60).with_prefix("register")
    }

    fn bucket_key(&self, identifier: &str, now_secs: u64) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix,
            identifier,
            now_secs / self.window_secs
        )
    }

    /// 距当前窗口结束的秒数
    fn retry_after(&self, now_secs: u64) -> u64 {
        self.window_secs - now_secs % self.window_secs
    }

    /// 记录一次请求并返回窗口内的累计次数
    async fn hit(&self, identifier: &str, now_secs: u64) -> u32 {
        RATE_LIMIT_CACHE
            .entry(self.bucket_key(identifier, now_secs))
            .and_upsert_with(|current| {
                let next = current.map(|e| e.into_value().saturating_add(1)).unwrap_or(1);
                std::future::ready(next)
            })
            .await
            .into_value()
    }
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// 客户端 IP：优先连接信息，其次 X-Forwarded-For 的第一跳
///
/// 服务直接暴露在公网时转发头可以伪造，需要由反向代理改写。
fn client_ip(req: &ServiceRequest) -> String {
    if let Some(ip) = req.connection_info().realip_remote_addr().and_then(parse_ip) {
        return ip.to_string();
    }

    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next().and_then(parse_ip)
    {
        return ip.to_string();
    }

    "unknown".to_string()
}

fn client_identifier(req: &ServiceRequest) -> String {
    match req.extensions().get::<User>() {
        Some(user) => format!("user:{}", user.id),
        None => format!("ip:{}", client_ip(req)),
    }
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let identifier = client_identifier(&req);
            let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
            let count = limit.hit(&identifier, now_secs).await;

            if count > limit.max_requests {
                warn!(
                    "Rate limit exceeded on {} for {} ({}/{})",
                    limit.key_prefix, identifier, count, limit.max_requests
                );
                return Ok(req.into_response(
                    create_rate_limit_response(limit.retry_after(now_secs)).map_into_right_body(),
                ));
            }

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");
        assert_eq!(RateLimit::new(1, 0).window_secs, 1);
        assert_eq!(RateLimit::new(1, 86_400).window_secs, MAX_WINDOW_SECS);
    }

    #[test]
    fn buckets_roll_over_with_the_window() {
        let limit = RateLimit::new(3, 60).with_prefix("t");
        assert_eq!(limit.bucket_key("ip:1.2.3.4", 120), "t:ip:1.2.3.4:2");
        assert_eq!(limit.bucket_key("ip:1.2.3.4", 179), "t:ip:1.2.3.4:2");
        assert_eq!(limit.bucket_key("ip:1.2.3.4", 180), "t:ip:1.2.3.4:3");
        assert_eq!(limit.retry_after(170), 10);
    }

    #[tokio::test]
    async fn counts_hits_per_window() {
        let limit = RateLimit::new(2, 60).with_prefix("counts_hits_per_window");
        assert_eq!(limit.hit("ip:10.0.0.1", 600).await, 1);
        assert_eq!(limit.hit("ip:10.0.0.1", 601).await, 2);
        assert_eq!(limit.hit("ip:10.0.0.1", 602).await, 3);
        // 新窗口重新计数
        assert_eq!(limit.hit("ip:10.0.0.1", 660).await, 1);
        assert_eq!(limit.hit("ip:10.0.0.2", 602).await, 1);
    }

    #[test]
    fn ip_parsing_accepts_socket_addresses() {
        assert_eq!(parse_ip("10.1.2.3:443"), "10.1.2.3".parse().ok());
        assert_eq!(parse_ip(" ::1 "), "::1".parse().ok());
        assert_eq!(parse_ip("not-an-ip"), None);
    }
}
