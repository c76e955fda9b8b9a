/*!
 * 基于角色的访问控制中间件
 *
 * 必须挂在 RequireJWT 之后：
 *
 * ```rust,ignore
 * web::scope("/reports")
 *     .wrap(RequireRole::new_any(UserRole::reviewer_roles()))
 *     .wrap(RequireJWT)
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed_roles: Rc<[UserRole]>,
}

impl RequireRole {
    pub fn new(role: &UserRole) -> Self {
        Self {
            allowed_roles: Rc::from([role.clone()]),
        }
    }

    /// 任一角色即可
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed_roles: roles.iter().map(|r| (*r).clone()).collect(),
        }
    }

    fn admits(&self, role: &UserRole) -> bool {
        self.allowed_roles.contains(role)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            policy: self.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    policy: RequireRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let policy = self.policy.clone();

        Box::pin(async move {
            let caller = req
                .extensions()
                .get::<User>()
                .map(|u| (u.id, u.role.clone()));

            let denial = match caller {
                Some((_, role)) if policy.admits(&role) => None,
                Some((user_id, role)) => {
                    info!(
                        "User {} with role {} denied on {}, needs one of {:?}",
                        user_id,
                        role,
                        req.path(),
                        policy.allowed_roles
                    );
                    Some(deny(StatusCode::FORBIDDEN))
                }
                None => {
                    info!("No authenticated user on {}, RequireJWT missing?", req.path());
                    Some(deny(StatusCode::UNAUTHORIZED))
                }
            };

            match denial {
                Some(response) => Ok(req.into_response(response.map_into_right_body())),
                None => Ok(srv.call(req).await?.map_into_left_body()),
            }
        })
    }
}

fn deny(status: StatusCode) -> HttpResponse {
    if status == StatusCode::UNAUTHORIZED {
        create_error_response(status, ErrorCode::Unauthorized, "Authentication required")
    } else {
        create_error_response(status, ErrorCode::Forbidden, "Access denied")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserProfile, UserStatus};
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, web};

    fn user(role: UserRole) -> User {
        User {
            id: 9,
            username: "reviewer".to_string(),
            email: "reviewer@school.test".to_string(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            profile: UserProfile {
                profile_name: "Reviewer".to_string(),
                avatar_url: None,
            },
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_reviewer_policy() {
        let policy = RequireRole::new_any(UserRole::reviewer_roles());
        assert!(policy.admits(&UserRole::Coordinator));
        assert!(policy.admits(&UserRole::Principal));
        assert!(!policy.admits(&UserRole::Teacher));
    }

    #[actix_web::test]
    async fn test_teacher_is_forbidden() {
        let app = init_service(
            App::new().service(
                web::scope("")
                    .wrap(RequireRole::new_any(UserRole::reviewer_roles()))
                    .route(
                        "/peers",
                        web::get().to(|| async { HttpResponse::Ok().finish() }),
                    ),
            ),
        )
        .await;

        let req = TestRequest::get().uri("/peers").to_request();
        req.extensions_mut().insert(user(UserRole::Teacher));
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = TestRequest::get().uri("/peers").to_request();
        req.extensions_mut().insert(user(UserRole::Coordinator));
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = TestRequest::get().uri("/peers").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
