use crate::core::{Actor, AppError};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

pub const ADMIN_ID_HEADER: &str = "X-Admin-Id";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Admin id → argon2 PHC hash of that admin's API key
#[derive(Debug, Clone, Default)]
pub struct AdminKeyStore {
    keys: HashMap<String, String>,
}

impl AdminKeyStore {
    /// Build from `(admin id, hash)` pairs; every hash must parse
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> crate::core::Result<Self> {
        let mut keys = HashMap::new();
        for (admin_id, hash) in entries {
            PasswordHash::new(&hash).map_err(|e| {
                AppError::Configuration(format!(
                    "Admin key hash for '{}' is not a valid PHC string: {}",
                    admin_id, e
                ))
            })?;
            keys.insert(admin_id, hash);
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check a presented key for an admin id
    pub fn verify(&self, admin_id: &str, api_key: &str) -> crate::core::Result<()> {
        let hash = self
            .keys
            .get(admin_id)
            .ok_or_else(|| AppError::unauthorized("Invalid admin credentials"))?;

        if verify_api_key(api_key, hash)? {
            Ok(())
        } else {
            Err(AppError::unauthorized("Invalid admin credentials"))
        }
    }
}

/// Authenticated admin, inserted into request extensions by `AdminAuth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal(pub String);

impl AdminPrincipal {
    pub fn actor(&self) -> crate::core::Result<Actor> {
        Actor::admin(self.0.clone())
    }
}

impl FromRequest for AdminPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AdminPrincipal>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Admin authentication required")),
        )
    }
}

/// Admin authentication middleware (`X-Admin-Id` + `X-API-Key`)
pub struct AdminAuth {
    keys: Arc<AdminKeyStore>,
}

impl AdminAuth {
    pub fn new(keys: Arc<AdminKeyStore>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
    keys: Arc<AdminKeyStore>,
}

fn header_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let keys = self.keys.clone();

        Box::pin(async move {
            let credentials = match (
                header_value(&req, ADMIN_ID_HEADER),
                header_value(&req, API_KEY_HEADER),
            ) {
                (Some(admin_id), Some(api_key)) => Ok((admin_id, api_key)),
                _ => Err(AppError::unauthorized(
                    "Missing X-Admin-Id or X-API-Key header",
                )),
            };

            let verified = match credentials {
                Ok((admin_id, api_key)) => {
                    let id = admin_id.clone();
                    // argon2 is deliberately slow; keep it off the worker thread
                    match web::block(move || keys.verify(&id, &api_key)).await {
                        Ok(Ok(())) => Ok(admin_id),
                        Ok(Err(e)) => Err(e),
                        Err(e) => Err(AppError::internal(format!(
                            "Admin key verification aborted: {}",
                            e
                        ))),
                    }
                }
                Err(e) => Err(e),
            };

            match verified {
                Ok(admin_id) => {
                    tracing::debug!(admin_id = %admin_id, "Admin authenticated");
                    req.extensions_mut().insert(AdminPrincipal(admin_id));
                    svc.call(req).await.map(|res| res.map_into_left_body())
                }
                Err(e) => {
                    tracing::warn!(path = %req.path(), error = %e, "Admin authentication failed");
                    let response = e.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Hash an API key with Argon2 for `ADMIN_API_KEYS`
pub fn hash_api_key(api_key: &str) -> crate::core::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

/// Verify an API key against an Argon2 hash
pub fn verify_api_key(api_key: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}
