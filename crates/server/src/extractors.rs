//! Request extractors: authenticated caller, tenant, and enveloped body/query/path parsing.

use std::ops::Deref;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use db::models::profile::Profile;
use deployment::Deployment;
use services::services::{
    auth::{AuthError, AuthUser},
    tenancy::{self, TenantContext},
};
use utils::server_timing;

use crate::{DeploymentImpl, error::ApiError};

/// `axum::Json` whose rejection is an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

fn authenticate(parts: &Parts, deployment: &DeploymentImpl) -> Result<AuthUser, AuthError> {
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::MalformedHeader)?),
        None => None,
    };
    deployment.auth().authenticate_header(header)
}

/// A verified caller and their profile. The profile may not belong to a company yet.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthUser,
    pub profile: Profile,
}

impl FromRequestParts<DeploymentImpl> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, deployment)?;
        let profile =
            server_timing::db(tenancy::load_profile(&deployment.db().pool, &user)).await?;
        Ok(Session { user, profile })
    }
}

/// A verified caller who belongs to a company.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl Deref for Tenant {
    type Target = TenantContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<DeploymentImpl> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, deployment)?;
        let ctx = server_timing::db(tenancy::resolve(&deployment.db().pool, &user)).await?;
        tracing::Span::current().record("company_id", tracing::field::display(ctx.company_id));
        Ok(Tenant(ctx))
    }
}
