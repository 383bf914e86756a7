//! Development server with live reload.
//!
//! Serves the output directory, watches the sources and asset paths, rebuilds once per burst of
//! changes and tells every open browser tab to reload after each successful rebuild.

use crate::{
    error::ZettelError,
    project::Project,
    serve::{
        clients::{ClientRegistry, ReloadSignal, RELOAD_TOKEN},
        coalesce::{run_coalesced, CoalesceTiming},
        port::{probe_port, DEFAULT_PORT_RANGE},
        resolve::resolve_request,
    },
};
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use notify::{EventKind, RecursiveMode, Watcher};
use std::{future::Future, path::Path, sync::Arc};
use tokio::sync::mpsc::unbounded_channel;
use tower_http::{services::ServeFile, trace::TraceLayer};

/// Path of the live reload WebSocket endpoint.
pub const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Client side of live reload, injected into every served HTML page.
pub const LIVE_RELOAD_SCRIPT: &str = r#"<script>
(() => {
  let reconnecting = false;
  const connect = () => {
    const socket = new WebSocket(`ws://${location.host}/__livereload`);
    socket.addEventListener("open", () => {
      if (reconnecting) location.reload();
    });
    socket.addEventListener("message", (event) => {
      if (event.data === "reload") location.reload();
    });
    socket.addEventListener("close", () => {
      if (!reconnecting) console.log("Reconnecting...");
      reconnecting = true;
      setTimeout(connect, 1000);
    });
  };
  connect();
})();
</script>"#;

#[derive(Clone)]
struct DevServerState {
    project: Arc<Project>,
    clients: ClientRegistry,
}

pub struct DevServer {
    project: Arc<Project>,
    clients: ClientRegistry,
    timing: CoalesceTiming,
}

impl DevServer {
    pub fn new(project: Arc<Project>) -> Self {
        let server = project.config().server;
        DevServer {
            project,
            clients: ClientRegistry::new(),
            timing: CoalesceTiming {
                warmup: server.warmup(),
                cooldown: server.cooldown(),
            },
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Request handling: the live reload endpoint plus files from the output directory.
    pub fn router(&self) -> Router {
        let state = DevServerState {
            project: self.project.clone(),
            clients: self.clients.clone(),
        };
        Router::new()
            .route(LIVE_RELOAD_PATH, get(live_reload))
            .fallback(serve_file)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Build, then serve and rebuild on change until `shutdown_signal` resolves.
    ///
    /// A failing build is logged and leaves the previous output in place; only a free port
    /// that can't be found or bound, or a watch that can't be set up, stops the server.
    pub async fn serve(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ZettelError> {
        rebuild_and_notify(&self.project, &self.clients).await;

        let config = self.project.config();
        let port = match config.port {
            Some(port) => port,
            None => probe_port(DEFAULT_PORT_RANGE)?,
        };

        let (trigger_tx, trigger_rx) = unbounded_channel();
        let build_dir = std::fs::canonicalize(&config.build_dir)
            .unwrap_or_else(|_| config.build_dir.clone());
        let mut watcher = notify::recommended_watcher(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) if is_source_change(&event, &build_dir) => {
                    tracing::trace!("Change detected: {:?}", event.paths);
                    let _ = trigger_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("File watcher error: {e}"),
            },
        )?;
        for path in self.project.watch_paths() {
            if path.exists() {
                watcher.watch(&path, RecursiveMode::Recursive)?;
                tracing::debug!("Watching {:?}", path);
            } else {
                tracing::warn!("Not watching {:?}: path does not exist", path);
            }
        }

        let project = self.project.clone();
        let clients = self.clients.clone();
        let rebuilds = tokio::spawn(run_coalesced(trigger_rx, self.timing, move |_| {
            let project = project.clone();
            let clients = clients.clone();
            async move {
                rebuild_and_notify(&project, &clients).await;
            }
        }));

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        tracing::info!(
            "Serving {} at http://localhost:{}{}",
            config.build_dir.display(),
            port,
            config.url_root
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        drop(watcher);
        rebuilds.abort();
        tracing::info!("Dev server shut down");
        Ok(())
    }
}

/// Rebuild the project and, on success, signal every live reload client.
///
/// Returns whether the build succeeded.
pub async fn rebuild_and_notify(project: &Project, clients: &ClientRegistry) -> bool {
    match project.build().await {
        Ok(report) => {
            let reached = clients.broadcast_reload();
            tracing::info!("Built site in {}ms", report.elapsed.as_millis());
            tracing::debug!(
                "{} notes, {} pages, {} assets; reloaded {} clients",
                report.notes,
                report.pages,
                report.assets,
                reached
            );
            true
        }
        Err(e) => {
            tracing::error!("Build failed, keeping previous output: {e}");
            false
        }
    }
}

/// Whether a watch event should trigger a rebuild. Writes to the output directory don't.
pub fn is_source_change(event: &notify::Event, build_dir: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|path| !path.starts_with(build_dir))
}

/// Insert the live reload client before `</body>`, or at the end if there is none.
pub fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], LIVE_RELOAD_SCRIPT, &html[at..]),
        None => format!("{html}{LIVE_RELOAD_SCRIPT}"),
    }
}

async fn serve_file(State(state): State<DevServerState>, request: Request) -> Response {
    let config = state.project.config();
    let url_path = request.uri().path().to_string();
    let path = match resolve_request(&config.build_dir, &config.url_root, &url_path).await {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("{e}");
            return (e.status_code(), e.to_string()).into_response();
        }
    };
    match send_file(&path, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to serve {:?}: {e}", path);
            (e.status_code(), e.to_string()).into_response()
        }
    }
}

/// Answer `request` with the file at `path`, adding the live reload client to full HTML bodies.
async fn send_file(path: &Path, request: Request) -> Result<Response, ZettelError> {
    let head = request.method() == Method::HEAD;
    let response = ServeFile::new(path).try_call(request).await?;
    let is_html = response.status() == StatusCode::OK
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|mime| mime.to_str().ok())
            .is_some_and(|mime| mime.starts_with("text/html"));
    if head || !is_html {
        return Ok(response.map(Body::new));
    }

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
        .await
        .map_err(|e| ZettelError::Io(format!("Reading {path:?} failed: {e}")))?;
    let html = inject_live_reload(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(html)))
}

async fn live_reload(ws: WebSocketUpgrade, State(state): State<DevServerState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, state.clients))
}

async fn client_session(mut socket: WebSocket, clients: ClientRegistry) {
    let (id, mut reloads) = clients.connect();
    loop {
        tokio::select! {
            signal = reloads.recv() => match signal {
                Some(ReloadSignal) => {
                    if socket.send(Message::Text(RELOAD_TOKEN.to_string())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    clients.disconnect(id);
}
