//! Login flow with lazy sessions, id rotation and CSRF-protected forms.
//!
//! Uses Redis when `REDIS_URL` is set, the in-memory store otherwise.

use salvo::prelude::*;
use expenses_session::{
    CsrfGuard, KeyValueStore, MemoryStore, RedisStore, SessionAccess, SessionConfig,
    SessionDepotExt, SessionError, SessionHandler,
};

fn internal(e: SessionError) -> StatusError {
    tracing::error!("session error: {}", e);
    StatusError::internal_server_error()
}

#[handler]
async fn health() -> &'static str {
    // Never touches the session: no store round trip, no cookie
    "ok"
}

#[handler]
async fn index(depot: &mut Depot) -> Result<Text<String>, StatusError> {
    let session = depot.session_mut().ok_or_else(StatusError::internal_server_error)?;
    let user = session.get("user").await.map_err(internal)?;
    let token = session.csrf_token().await.map_err(internal)?.unwrap_or_default();

    let body = match user {
        Some(user) => format!(
            "<p>Logged in as {user}</p>\
             <form method=\"post\" action=\"/logout\">\
             <input type=\"hidden\" name=\"token\" value=\"{token}\">\
             <button>Log out</button></form>"
        ),
        None => format!(
            "<form method=\"post\" action=\"/login\">\
             <input name=\"username\">\
             <label><input type=\"checkbox\" name=\"remember\" value=\"1\"> Remember me</label>\
             <input type=\"hidden\" name=\"token\" value=\"{token}\">\
             <button>Log in</button></form>"
        ),
    };
    Ok(Text::Html(body))
}

#[handler]
async fn login(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), StatusError> {
    let username = req
        .form::<String>("username")
        .await
        .filter(|name| !name.is_empty())
        .ok_or_else(StatusError::bad_request)?;
    let remember = req.form::<String>("remember").await.is_some();

    let session = depot.session_mut().ok_or_else(StatusError::internal_server_error)?;
    // New id on every privilege change
    session.rotate().await.map_err(internal)?;
    session.set("user", &username).await.map_err(internal)?;
    session.set_permanent(remember).await.map_err(internal)?;

    res.render(Redirect::other("/"));
    Ok(())
}

#[handler]
async fn logout(depot: &mut Depot, res: &mut Response) -> Result<(), StatusError> {
    let session = depot.session_mut().ok_or_else(StatusError::internal_server_error)?;
    session.clear().await.map_err(internal)?;
    res.render(Redirect::other("/"));
    Ok(())
}

fn router<S: KeyValueStore>(store: S) -> Router {
    let config = SessionConfig::new().with_cookie_name("session");

    Router::new()
        .push(Router::with_path("health").get(health))
        .push(
            Router::new()
                .hoop(SessionHandler::new(store, config))
                .get(index)
                .push(Router::with_path("login").hoop(CsrfGuard::new()).post(login))
                .push(Router::with_path("logout").hoop(CsrfGuard::new()).post(logout)),
        )
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    let router = match std::env::var("REDIS_URL") {
        Ok(url) => {
            let store = RedisStore::from_url(&url)
                .await
                .expect("Failed to connect to Redis");
            router(store)
        }
        Err(_) => router(MemoryStore::new()),
    };

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    Server::new(acceptor).serve(router).await;
}
