use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::Claims;

/// The verified identity behind a request, if any.
///
/// `AuthMiddleware` stores the claims of a valid bearer token in the request
/// extensions; this extractor reads them back. It never fails: a request that
/// carried no token yields `Caller(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<Uuid>);

impl Caller {
    /// The verified user id, falling back to a client-supplied one.
    pub fn or_claimed(self, claimed: Option<Uuid>) -> Option<Uuid> {
        self.0.or(claimed)
    }
}

impl FromRequest for Caller {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req.extensions().get::<Claims>().map(|claims| claims.sub);
        ready(Ok(Caller(user_id)))
    }
}
