//! Dashboard pages behind the session gate

use axum::{
    extract::{Query, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, AppResult};
use crate::gate::{decide, resolve_session, AppRoute, Navigation, Session, SessionUser};

/// Serve any page path through the gate
pub async fn render(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> AppResult<Response> {
    let route = AppRoute::from_path(uri.path());
    let session = if route.is_protected() {
        resolve_session(&state, &headers).await?
    } else {
        Session::resolved(None)
    };

    Ok(respond(decide(route, &session), session.user.as_ref()))
}

fn respond(navigation: Navigation, user: Option<&SessionUser>) -> Response {
    match navigation {
        Navigation::Initializing => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(RETRY_AFTER, "1"), (HeaderName::from_static("refresh"), "1")],
            Html(initializing_page()),
        )
            .into_response(),
        Navigation::Redirect { to, .. } => Redirect::to(to).into_response(),
        Navigation::Render { route: AppRoute::NotFound, .. } => {
            (StatusCode::NOT_FOUND, Html(not_found_page())).into_response()
        }
        Navigation::Render { route, shell: true } => match user {
            Some(user) => Html(shell_page(route, user)).into_response(),
            None => Redirect::to(crate::gate::LOGIN_PATH).into_response(),
        },
        Navigation::Render { route, shell: false } => Html(public_page(route)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    pub route: AppRoute,
    pub navigation: Navigation,
}

/// Gate decision as JSON, for clients that render pages themselves
pub async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NavigateQuery>,
) -> AppResult<Json<NavigateResponse>> {
    let route = AppRoute::from_path(&query.path);
    let session = resolve_session(&state, &headers).await?;

    Ok(Json(NavigateResponse {
        route,
        navigation: decide(route, &session),
    }))
}

/// Data endpoint a shell page pulls from
fn feed(route: AppRoute) -> &'static str {
    match route {
        AppRoute::Dashboard | AppRoute::Analytics => "/api/v1/stats",
        AppRoute::ThreatMap | AppRoute::Alerts => "/api/v1/threats",
        AppRoute::AiInsights => "/api/threats/live",
        AppRoute::Honeypot => "/api/v1/honeypot",
        AppRoute::Settings => "/api/user/progress",
        _ => "",
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} | Aegis</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn initializing_page() -> String {
    document("Initializing", "<div class=\"initializing\">INITIALIZING AEGIS...</div>")
}

fn not_found_page() -> String {
    document(
        AppRoute::NotFound.title(),
        "<main><h1>404</h1><p>Page not found.</p><a href=\"/\">Return to dashboard</a></main>",
    )
}

fn public_page(route: AppRoute) -> String {
    let body = match route {
        AppRoute::ResetPassword => concat!(
            "<main><h1>Reset Password</h1>",
            "<form id=\"reset-form\"><input type=\"email\" name=\"email\" required>",
            "<button type=\"submit\">Send reset link</button></form>",
            "<a href=\"/login\">Back to sign in</a></main>"
        ),
        _ => concat!(
            "<main><h1>Sign In</h1>",
            "<form id=\"login-form\" data-endpoint=\"/api/v1/auth/login\">",
            "<input type=\"email\" name=\"email\" required>",
            "<input type=\"password\" name=\"password\" required>",
            "<button type=\"submit\">Sign in</button></form>",
            "<a href=\"/reset-password\">Forgot password?</a></main>"
        ),
    };
    document(route.title(), body)
}

fn shell_page(route: AppRoute, user: &SessionUser) -> String {
    let nav: String = AppRoute::SHELL_PAGES
        .iter()
        .map(|page| {
            let current = if *page == route { " aria-current=\"page\"" } else { "" };
            format!(
                "<li><a href=\"{}\"{}>{}</a></li>",
                page.path().unwrap_or("/"),
                current,
                page.title()
            )
        })
        .collect();

    let body = format!(
        "<header><span class=\"brand\">AEGIS</span><span class=\"user\">{}</span></header>\n\
         <nav><ul>{}</ul></nav>\n\
         <main><h1>{}</h1><section id=\"page\" data-feed=\"{}\"></section></main>",
        escape_html(user.display_name()),
        nav,
        route.title(),
        feed(route)
    );
    document(route.title(), &body)
}
