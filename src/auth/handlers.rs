use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::is_duplicate_key,
    model::{role::Role, user::User},
    models::{Claims, LoginReqDto, RegisterReq, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

#[derive(Serialize)]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and records the refresh token's jti.
async fn issue_token_pair(
    subject: &TokenSubject,
    pool: &MySqlPool,
    config: &Config,
) -> Result<TokenPair, HttpResponse> {
    let access_token = generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            HttpResponse::InternalServerError().finish()
        })?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl).map_err(|e| {
            error!(error = %e, "Failed to sign refresh token");
            HttpResponse::InternalServerError().finish()
        })?;

    debug!(user_id = subject.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(subject.user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Account registration, restricted to admins and scoped to their canteen.
pub async fn register(
    auth: AuthUser,
    user: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let username = user.username.trim().to_lowercase();

    if username.is_empty() || user.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Username and password must not be empty"
        })));
    }

    if Role::from_id(user.role_id).is_none() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Unknown role"
        })));
    }

    let hashed = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (tenant_id, username, password, role_id, employee_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(&username)
    .bind(&hashed)
    .bind(user.role_id)
    .bind(user.employee_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!(tenant_id = auth.tenant_id, username = %username, "User registered");
            Ok(HttpResponse::Created().json(json!({
                "message": "User registered successfully"
            })))
        }
        Err(e) if is_duplicate_key(&e) => Ok(HttpResponse::Conflict().json(json!({
            "error": "Username already exists"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to register user");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    let db_user = match sqlx::query_as::<_, User>(
        r#"
        SELECT id, tenant_id, username, password, role_id, employee_id
        FROM users
        WHERE username = ? AND is_active = TRUE
        "#,
    )
    .bind(user.username.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let subject = TokenSubject {
        user_id: db_user.id,
        username: db_user.username.clone(),
        role: db_user.role_id,
        tenant_id: db_user.tenant_id,
        employee_id: db_user.employee_id,
    };

    let pair = match issue_token_pair(&subject, pool.get_ref(), &config).await {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(tenant_id = db_user.tenant_id, "Login successful");

    HttpResponse::Ok().json(pair)
}

#[get("/me")]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "role": auth.role.to_string(),
        "role_id": auth.role.id(),
        "tenant_id": auth.tenant_id,
        "employee_id": auth.employee_id,
    }))
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer_token(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(claims) = refresh_claims(&req, &config) else {
        return HttpResponse::Unauthorized().finish();
    };

    // Only an unrevoked, unexpired token flips; anything else is a replay.
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    match revoked {
        Ok(r) if r.rows_affected() == 1 => {}
        Ok(_) => {
            info!(user_id = claims.user_id, jti = %claims.jti, "Refresh token reuse or unknown jti");
            return HttpResponse::Unauthorized().finish();
        }
        Err(e) => {
            error!(error = %e, "Failed to revoke refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    match issue_token_pair(&TokenSubject::from(&claims), pool.get_ref(), &config).await {
        Ok(pair) => HttpResponse::Ok().json(pair),
        Err(resp) => resp,
    }
}

/// Idempotent: always 204, revokes the refresh token when one is presented.
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(claims) = refresh_claims(&req, &config) else {
        return HttpResponse::NoContent().finish();
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}
