//! Session middleware for Salvo

use async_trait::async_trait;
use salvo_core::http::cookie::time::{Duration, OffsetDateTime};
use salvo_core::http::cookie::{self, Cookie};
use salvo_core::http::ResBody;
use salvo_core::prelude::*;

use crate::config::{SameSite, SessionConfig};
use crate::depot_ext::SESSION_KEY;
use crate::lazy::LazySession;
use crate::manager::{CookieDirective, SessionManager};
use crate::store::KeyValueStore;

/// Session middleware for Salvo
///
/// Installs a [`LazySession`] in the depot before the rest of the chain runs
/// and saves it afterwards. Handlers that never touch the session cost no
/// store round trip and produce no `Set-Cookie` header.
pub struct SessionHandler<S: KeyValueStore> {
    manager: SessionManager<S>,
}

impl<S: KeyValueStore> SessionHandler<S> {
    /// Create a new session handler
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            manager: SessionManager::new(store, config),
        }
    }

    /// Create a handler around an existing manager
    pub fn from_manager(manager: SessionManager<S>) -> Self {
        Self { manager }
    }

    fn config(&self) -> &SessionConfig {
        self.manager.config()
    }

    /// Get session ID from cookie
    fn session_id_from_cookie(&self, req: &Request) -> Option<String> {
        let cookie = req.cookie(&self.config().cookie_name)?;
        let raw = cookie.value();

        // URL decode the value (cookies may be URL encoded)
        let decoded = match urlencoding::decode(raw) {
            Ok(d) => d.into_owned(),
            Err(_) => raw.to_string(),
        };
        Some(decoded)
    }

    fn apply_directive(&self, res: &mut Response, directive: CookieDirective) {
        match directive {
            CookieDirective::Keep => {}
            CookieDirective::Set {
                id,
                max_age_secs,
                expires,
            } => {
                let mut builder = self
                    .cookie_builder(id)
                    .max_age(max_age(max_age_secs));
                if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
                    builder = builder.expires(expires);
                }
                res.add_cookie(builder.build());
            }
            CookieDirective::Remove => {
                let cookie = self
                    .cookie_builder(String::new())
                    .max_age(Duration::ZERO)
                    .expires(OffsetDateTime::UNIX_EPOCH)
                    .build();
                res.add_cookie(cookie);
            }
        }
    }

    fn cookie_builder(&self, value: String) -> cookie::CookieBuilder<'static> {
        let config = self.config();
        let mut builder = Cookie::build((config.cookie_name.clone(), value))
            .path(config.cookie_path.clone())
            .http_only(true)
            .secure(config.cookie_secure);

        if let Some(domain) = config.cookie_domain.clone() {
            builder = builder.domain(domain);
        }

        match config.cookie_same_site {
            SameSite::Strict => builder.same_site(cookie::SameSite::Strict),
            SameSite::Lax => builder.same_site(cookie::SameSite::Lax),
            SameSite::None => builder.same_site(cookie::SameSite::None),
        }
    }
}

/// Cookie Max-Age, saturating at the largest representable lifetime
fn max_age(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

impl<S: KeyValueStore> Clone for SessionHandler<S> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore> Handler for SessionHandler<S> {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let cookie_id = self.session_id_from_cookie(req);
        let manager = self.manager.clone();
        let lazy = LazySession::new(move || async move { manager.open(cookie_id.as_deref()).await });
        depot.insert(SESSION_KEY, lazy);

        ctrl.call_next(req, depot, res).await;

        let Ok(lazy) = depot.remove::<LazySession>(SESSION_KEY) else {
            return;
        };
        let Some(session) = lazy.into_inner() else {
            return;
        };

        match self.manager.save(&session).await {
            Ok(directive) => self.apply_directive(res, directive),
            Err(e) => {
                tracing::error!("Failed to save session: {}", e);
                res.body(ResBody::None);
                res.render(StatusError::internal_server_error().brief("Session could not be saved"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_age_saturates() {
        assert_eq!(max_age(86400), Duration::seconds(86400));
        assert_eq!(max_age(u64::MAX), Duration::seconds(i64::MAX));
    }
}
