//! Per-request caller identity
//!
//! Authentication happens upstream. By the time a request reaches us the
//! gateway has put the caller's actor id in a header; this extractor reads it.
//! Capabilities are never taken from the request, they are resolved from the
//! store by the engine.

use crate::app_config::IdentityConfig;
use crate::constants::DEFAULT_IDENTITY_HEADER;
use crate::error::ModerationError;
use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Identity of the client making the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientCtx {
    actor_id: Option<i32>,
}

impl ClientCtx {
    /// Read the identity header from a request.
    ///
    /// A missing header, or one that is not a positive integer, yields a guest.
    pub fn from_request_headers(req: &HttpRequest, header: &str) -> Self {
        let actor_id = req
            .headers()
            .get(header)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|id| *id > 0);

        Self { actor_id }
    }

    pub fn get_id(&self) -> Option<i32> {
        self.actor_id
    }

    /// Require an identified caller. Returns the actor id or Unauthenticated.
    pub fn require_login(&self) -> Result<i32, ModerationError> {
        self.actor_id.ok_or(ModerationError::Unauthenticated)
    }
}

impl FromRequest for ClientCtx {
    type Error = ModerationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = match req.app_data::<Data<IdentityConfig>>() {
            Some(identity) => Self::from_request_headers(req, &identity.header),
            None => Self::from_request_headers(req, DEFAULT_IDENTITY_HEADER),
        };

        ready(Ok(ctx))
    }
}
