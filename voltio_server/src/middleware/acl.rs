//! Role-based access control middleware.
//!
//! Placed on any route that is restricted to specific roles. It decodes the
//! bearer token, checks the claimed role against the allowed set, and stashes
//! the claims in the request extensions so handlers extract them without a
//! second decode. Requests without a valid token get 401; a valid token with
//! the wrong role gets 403.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ok, Future, Ready};
use log::warn;
use voltio_engine::db_types::Role;

use crate::{
    auth::{bearer_token, TokenVerifier},
    errors::ServerError,
};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService {
            allowed_roles: self.allowed_roles.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let verifier = req
                .app_data::<web::Data<TokenVerifier>>()
                .ok_or_else(|| {
                    warn!("No TokenVerifier found in app data");
                    ServerError::Unspecified("TokenVerifier is not configured".to_string())
                })?
                .clone();
            let token = bearer_token(req.request())?;
            let claims = verifier.decode(&token)?;
            if !allowed_roles.contains(&claims.role) {
                return Err(ServerError::InsufficientPermissions(format!(
                    "role {} may not access this resource",
                    claims.role
                ))
                .into());
            }
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
