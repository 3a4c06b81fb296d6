// OAuth redirect handling
// Captures the authorization code either from a loopback listener or a pasted redirect URL

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use url::{Host, Url};

use crate::error::{Result, VolvoError};

const OPERATION: &str = "authorization callback";

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Volvo Cars</title></head>
<body style="font-family: system-ui; text-align: center; padding-top: 80px;">
<h2>Authorization received</h2>
<p>You can close this tab and return to the terminal.</p>
</body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Volvo Cars</title></head>
<body style="font-family: system-ui; text-align: center; padding-top: 80px;">
<h2>Authorization failed</h2>
<p>Check the terminal for details.</p>
</body>
</html>"#;

const STALE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Volvo Cars</title></head>
<body style="font-family: system-ui; text-align: center; padding-top: 80px;">
<h2>No longer waiting for authorization</h2>
<p>A redirect was already received. Start a new sign-in from the terminal if needed.</p>
</body>
</html>"#;

/// Code and state returned to the redirect URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    pub code: String,
    pub state: Option<String>,
}

impl AuthorizationCallback {
    /// Parse the URL the browser was redirected to
    pub fn from_redirect_url(redirect_url: &str) -> Result<Self> {
        let url = Url::parse(redirect_url.trim()).map_err(|e| {
            VolvoError::Configuration(format!("Invalid redirect URL: {}", e))
        })?;

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        Self::from_query(&params)
    }

    fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        if let Some(error) = params.get("error") {
            return Err(VolvoError::Auth {
                operation: OPERATION.to_string(),
                status: None,
                code: Some(error.clone()),
                description: params.get("error_description").cloned(),
            });
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .cloned()
            .ok_or_else(|| VolvoError::auth(OPERATION, "Redirect carries no authorization code"))?;

        Ok(Self {
            code,
            state: params.get("state").cloned(),
        })
    }

    /// Reject a callback whose state differs from the one sent with the authorization request
    pub fn verify_state(&self, expected: Option<&str>) -> Result<()> {
        match (expected, self.state.as_deref()) {
            (None, _) => Ok(()),
            (Some(expected), Some(actual)) if expected == actual => Ok(()),
            _ => Err(VolvoError::auth(
                OPERATION,
                "State mismatch; the redirect does not belong to this authorization request",
            )),
        }
    }
}

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<Result<AuthorizationCallback>>>>>;

#[derive(Clone)]
struct CallbackState {
    tx: CallbackSender,
}

/// Single-shot HTTP listener on the loopback redirect URI
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

impl CallbackListener {
    /// Bind the address named by a loopback redirect URI such as `http://localhost:8080/callback`
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let (addr, path) = loopback_target(redirect_uri)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            VolvoError::Configuration(format!(
                "Failed to bind callback listener on {}: {}",
                addr, e
            ))
        })?;

        tracing::debug!(addr = %addr, path = %path, "Callback listener bound");

        Ok(Self { listener, path })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|e| {
            VolvoError::Configuration(format!("Callback listener has no address: {}", e))
        })
    }

    /// Serve until the first redirect arrives or `timeout` elapses
    pub async fn wait(self, timeout: Duration) -> Result<AuthorizationCallback> {
        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(&self.path, Arc::new(Mutex::new(Some(tx))));

        tokio::spawn(async move {
            let server = axum::serve(self.listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::warn!(error = %e, "Callback listener failed");
            }
        });

        let result = tokio::time::timeout(timeout, rx).await;
        let _ = shutdown_tx.send(());

        match result {
            Ok(Ok(callback)) => callback,
            Ok(Err(_)) => Err(VolvoError::auth(
                OPERATION,
                "Callback listener stopped before a redirect arrived",
            )),
            Err(_) => Err(VolvoError::auth(
                OPERATION,
                format!(
                    "Timed out after {}s waiting for the redirect",
                    timeout.as_secs()
                ),
            )),
        }
    }
}

fn router(path: &str, tx: CallbackSender) -> Router {
    Router::new()
        .route(path, get(handle_callback))
        .with_state(CallbackState { tx })
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let Some(sender) = state.tx.lock().await.take() else {
        tracing::debug!("Ignoring redirect; a callback was already received");
        return (StatusCode::GONE, Html(STALE_PAGE));
    };

    let callback = AuthorizationCallback::from_query(&params);

    let response = match &callback {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        Err(e) => {
            tracing::warn!(error = %e, "Authorization redirect carried an error");
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    };

    let _ = sender.send(callback);
    response
}

/// Socket address and path for a loopback redirect URI
fn loopback_target(redirect_uri: &str) -> Result<(SocketAddr, String)> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| VolvoError::Configuration(format!("Invalid redirect_uri: {}", e)))?;

    if url.scheme() != "http" {
        return Err(VolvoError::Configuration(format!(
            "Callback listener needs an http redirect_uri, got {}",
            url.scheme()
        )));
    }

    let ip = match url.host() {
        Some(Host::Domain(domain)) if domain.eq_ignore_ascii_case("localhost") => {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
        Some(Host::Ipv4(ip)) if ip.is_loopback() => IpAddr::V4(ip),
        Some(Host::Ipv6(ip)) if ip.is_loopback() => IpAddr::V6(ip),
        _ => {
            return Err(VolvoError::Configuration(format!(
                "redirect_uri {} is not a loopback address",
                redirect_uri
            )))
        }
    };

    let port = url.port_or_known_default().unwrap_or(80);
    Ok((SocketAddr::new(ip, port), url.path().to_string()))
}
