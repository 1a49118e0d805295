use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    /// Canteen the user belongs to; every query is scoped by it.
    pub tenant_id: u64,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Accepts access tokens only.
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            tenant_id: claims.tenant_id,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_manager(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(ErrorForbidden("Manager/Admin only"))
        }
    }

    /// Roles allowed to submit badge scans.
    pub fn require_scanner(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager | Role::Kiosk) {
            Ok(())
        } else {
            Err(ErrorForbidden("Scanner role required"))
        }
    }

    /// Staff may only read their own records.
    pub fn require_self_or_manager(&self, employee_id: u64) -> actix_web::Result<()> {
        if self.require_manager().is_ok() || self.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(ErrorForbidden("Not allowed to view this employee"))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by auth_middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}
