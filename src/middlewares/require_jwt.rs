/*!
 * Bearer 令牌认证
 *
 * 通过后把 `User` 放进请求扩展，处理程序用 `RequireJWT::current_user` 取出。
 * 用户记录按 ID 缓存 `cache.default_ttl` 秒，账号停用在缓存过期后才生效。
 *
 * ```rust,ignore
 * web::scope("/api/v1/reports")
 *     .wrap(RequireJWT)
 *     .route("/accomplishment/{id}/peers", web::get().to(peers))
 * ```
 */

use crate::cache::{ObjectCache, user_key};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserStatus};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::fmt;
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info, warn};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireJWT;

#[derive(Debug)]
enum AuthFailure {
    MissingToken,
    BadToken,
    UnknownUser(i64),
    Inactive(i64),
    Backend,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::MissingToken => f.write_str("missing bearer token"),
            AuthFailure::BadToken => f.write_str("invalid or expired token"),
            AuthFailure::UnknownUser(id) => write!(f, "user {id} no longer exists"),
            AuthFailure::Inactive(id) => write!(f, "user {id} is not active"),
            AuthFailure::Backend => f.write_str("user lookup failed"),
        }
    }
}

fn app_cache(req: &ServiceRequest) -> Option<Arc<dyn ObjectCache>> {
    req.app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

async fn load_user(req: &ServiceRequest, user_id: i64) -> Result<User, AuthFailure> {
    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or(AuthFailure::Backend)?;

    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.status == UserStatus::Active => Ok(user),
        Ok(Some(_)) => Err(AuthFailure::Inactive(user_id)),
        Ok(None) => Err(AuthFailure::UnknownUser(user_id)),
        Err(e) => {
            warn!("Loading user {} for authentication failed: {}", user_id, e);
            Err(AuthFailure::Backend)
        }
    }
}

/// 缓存中只存放 active 用户
async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = JwtUtils::extract_bearer_token(req.request()).ok_or(AuthFailure::MissingToken)?;
    let user_id = JwtUtils::verify_access_token(&token)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthFailure::BadToken
        })?
        .user_id()
        .ok_or(AuthFailure::BadToken)?;

    let cache = app_cache(req);
    if let Some(cache) = &cache
        && let Some(user) = cache.get_json::<User>(&user_key(user_id)).await
    {
        return Ok(user);
    }

    let user = load_user(req, user_id).await?;
    if let Some(cache) = &cache {
        cache
            .insert_json(user_key(user_id), &user, AppConfig::get().cache.default_ttl)
            .await;
    }
    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // 预检请求不带令牌
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match authenticate(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(failure) => {
                    info!("Rejected {} {}: {}", req.method(), req.path(), failure);
                    let response = create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        &format!("Unauthorized: {failure}"),
                    );
                    Ok(req.into_response(response.map_into_right_body()))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 仅在挂了 RequireJWT 的路由里有值
    pub fn current_user(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test::{TestRequest, call_service, init_service};

    #[actix_web::test]
    async fn test_missing_and_malformed_tokens_are_rejected() {
        let app = init_service(
            App::new().service(
                web::scope("/secured")
                    .wrap(RequireJWT)
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = TestRequest::get().uri("/secured").to_request();
        assert_eq!(
            call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = TestRequest::get()
            .uri("/secured")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        assert_eq!(
            call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/secured")
            .to_request();
        assert_eq!(
            call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );
    }
}
