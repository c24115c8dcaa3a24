//! Page routing table and navigation decisions

use serde::Serialize;

use super::{GatePhase, Session};

pub const LOGIN_PATH: &str = "/login";

/// Every page the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppRoute {
    Login,
    ResetPassword,
    Dashboard,
    ThreatMap,
    Alerts,
    AiInsights,
    Analytics,
    Honeypot,
    Settings,
    NotFound,
}

impl AppRoute {
    /// Pages hosted inside the dashboard shell, in navigation order
    pub const SHELL_PAGES: [AppRoute; 7] = [
        AppRoute::Dashboard,
        AppRoute::ThreatMap,
        AppRoute::Alerts,
        AppRoute::AiInsights,
        AppRoute::Analytics,
        AppRoute::Honeypot,
        AppRoute::Settings,
    ];

    pub fn from_path(path: &str) -> Self {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match path {
            "/login" => Self::Login,
            "/reset-password" => Self::ResetPassword,
            "/" => Self::Dashboard,
            "/threat-map" => Self::ThreatMap,
            "/alerts" => Self::Alerts,
            "/ai-insights" => Self::AiInsights,
            "/analytics" => Self::Analytics,
            "/honeypot" => Self::Honeypot,
            "/settings" => Self::Settings,
            _ => Self::NotFound,
        }
    }

    /// Canonical path; `None` for the catch-all
    pub fn path(&self) -> Option<&'static str> {
        match self {
            Self::Login => Some("/login"),
            Self::ResetPassword => Some("/reset-password"),
            Self::Dashboard => Some("/"),
            Self::ThreatMap => Some("/threat-map"),
            Self::Alerts => Some("/alerts"),
            Self::AiInsights => Some("/ai-insights"),
            Self::Analytics => Some("/analytics"),
            Self::Honeypot => Some("/honeypot"),
            Self::Settings => Some("/settings"),
            Self::NotFound => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::ResetPassword => "Reset Password",
            Self::Dashboard => "Dashboard",
            Self::ThreatMap => "Threat Map",
            Self::Alerts => "Alerts",
            Self::AiInsights => "AI Insights",
            Self::Analytics => "Analytics",
            Self::Honeypot => "Honeypot",
            Self::Settings => "Settings",
            Self::NotFound => "Not Found",
        }
    }

    pub fn is_protected(&self) -> bool {
        Self::SHELL_PAGES.contains(self)
    }
}

/// What the router does for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Navigation {
    /// Session still resolving: neutral indicator only
    Initializing,
    /// Replace the current history entry with `to`
    Redirect { to: &'static str, replace: bool },
    Render { route: AppRoute, shell: bool },
}

pub fn decide(route: AppRoute, session: &Session) -> Navigation {
    if !route.is_protected() {
        return Navigation::Render { route, shell: false };
    }

    match session.phase() {
        GatePhase::Loading => Navigation::Initializing,
        GatePhase::Unauthenticated => Navigation::Redirect { to: LOGIN_PATH, replace: true },
        GatePhase::Authenticated => Navigation::Render { route, shell: true },
    }
}
