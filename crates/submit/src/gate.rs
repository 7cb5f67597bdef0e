use async_trait::async_trait;

use crate::api::SetupApiError;

pub const SETUP_ROUTE: &str = "/setup";
pub const HOME_ROUTE: &str = "/";

/// Answers "has this instance been configured yet?".
#[async_trait(?Send)]
pub trait ConfigGate {
    async fn is_configured(&self) -> Result<bool, SetupApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Proceed,
    Redirect(String),
}

pub fn is_setup_route(path: &str) -> bool {
    path == SETUP_ROUTE
        || path
            .strip_prefix(SETUP_ROUTE)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Configured instances keep operators out of the wizard; unconfigured ones
/// send every other route into it.
pub fn route_decision(path: &str, configured: bool) -> RouteDecision {
    match (configured, is_setup_route(path)) {
        (true, true) => RouteDecision::Redirect(HOME_ROUTE.to_string()),
        (false, false) => RouteDecision::Redirect(SETUP_ROUTE.to_string()),
        _ => RouteDecision::Proceed,
    }
}

/// Asks the gate and decides. A failing check counts as unconfigured.
pub async fn resolve_route<G: ConfigGate + ?Sized>(gate: &G, path: &str) -> RouteDecision {
    let configured = match gate.is_configured().await {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(%err, "configuration check failed; treating as unconfigured");
            false
        }
    };
    tracing::debug!(path, configured, "route gate");
    route_decision(path, configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<bool, u16>);

    #[async_trait(?Send)]
    impl ConfigGate for Fixed {
        async fn is_configured(&self) -> Result<bool, SetupApiError> {
            self.0.map_err(|status| SetupApiError::Rejected {
                status,
                body: String::new(),
            })
        }
    }

    #[test]
    fn setup_routes_are_prefix_aware() {
        assert!(is_setup_route("/setup"));
        assert!(is_setup_route("/setup/step-2"));
        assert!(!is_setup_route("/setups"));
        assert!(!is_setup_route("/"));
    }

    #[test]
    fn decisions() {
        assert_eq!(
            route_decision("/setup/step-1", true),
            RouteDecision::Redirect("/".into())
        );
        assert_eq!(route_decision("/browse", true), RouteDecision::Proceed);
        assert_eq!(
            route_decision("/browse", false),
            RouteDecision::Redirect("/setup".into())
        );
        assert_eq!(route_decision("/setup", false), RouteDecision::Proceed);
    }

    #[test]
    fn failed_check_means_unconfigured() {
        let decision = pollster::block_on(resolve_route(&Fixed(Err(503)), "/about"));
        assert_eq!(decision, RouteDecision::Redirect("/setup".into()));
        let decision = pollster::block_on(resolve_route(&Fixed(Ok(true)), "/about"));
        assert_eq!(decision, RouteDecision::Proceed);
    }
}
