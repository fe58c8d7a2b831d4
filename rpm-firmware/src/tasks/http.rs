// HTTP Server Task - Serviert Status-Seite und JSON State/Config WebSocket
use core::convert::Infallible;
use core::future::pending;
use defmt::{info, warn};
use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant};
use picoserve::{io::embedded_io_async, response::IntoResponse, response::ws, routing::get};
use serde::Serialize;

use crate::config::*;
use crate::web::{
    INDEX_HTML,
    protocol::{WsClientMessage, WsServerMessage},
};
use crate::{ConfigCommandSender, RpmStatus, RpmStatusChannel, RpmStatusSubscriber};

/// Response-Enum für WebSocket-Endpoint
/// Ermöglicht Rückgabe von entweder WebSocket-Upgrade oder HTTP-Fehler
enum WebSocketResponse {
    Upgrade(
        ws::UpgradedWebSocket<ws::UnspecifiedProtocol, ws::CallbackNotUsingState<WebSocketHandler>>,
    ),
    ServiceUnavailable,
}

impl IntoResponse for WebSocketResponse {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        match self {
            WebSocketResponse::Upgrade(ws) => ws.write_to(connection, response_writer).await,
            WebSocketResponse::ServiceUnavailable => {
                picoserve::response::Response::new(
                    picoserve::response::StatusCode::new(503),
                    "Service Unavailable: Too many WebSocket connections",
                )
                .with_header("Retry-After", "5")
                .write_to(connection, response_writer)
                .await
            }
        }
    }
}

/// HTTP Server Task - läuft parallel zum RPM-Task
///
/// - Serviert die Status-Seite auf GET /
/// - WebSocket-Endpoint auf /ws: State-Updates raus, Config-Kommandos rein
///
/// **Task Pool:** Mehrfach gespawnt, damit Seite und WebSocket
/// gleichzeitig bedient werden können.
///
/// # Parameter
/// - `task_id`: Eindeutige ID für diese Server-Instanz
/// - `stack`: embassy-net Stack für Netzwerk-Zugriff
/// - `status_channel`: PubSub Channel für Status-Broadcasts (Subscriber pro WebSocket)
/// - `command_sender`: Channel Sender für Config-Kommandos
#[embassy_executor::task(pool_size = HTTP_TASK_COUNT)]
pub async fn http_server_task(
    task_id: usize,
    stack: &'static Stack<'static>,
    status_channel: &'static RpmStatusChannel,
    command_sender: ConfigCommandSender,
) {
    info!("HTTP: Server task {} starting on port {}...", task_id, HTTP_PORT);

    let app = picoserve::Router::new().route("/", get(serve_html)).route(
        "/ws",
        get(
            |upgrade: picoserve::response::WebSocketUpgrade| async move {
                info!("HTTP: WebSocket upgrade requested");

                // Subscriber-Slots sind begrenzt, bei Erschöpfung HTTP 503 statt Panic
                match status_channel.subscriber() {
                    Ok(status_subscriber) => {
                        let handler = WebSocketHandler {
                            command_sender,
                            status_subscriber,
                        };
                        WebSocketResponse::Upgrade(upgrade.on_upgrade(handler))
                    }
                    Err(_) => {
                        warn!("HTTP: No subscriber slots available, sending HTTP 503");
                        WebSocketResponse::ServiceUnavailable
                    }
                }
            },
        ),
    );

    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, *stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Serviert die HTML-Status-Seite
async fn serve_html() -> impl IntoResponse {
    picoserve::response::Response::new(picoserve::response::StatusCode::OK, INDEX_HTML)
        .with_header("Content-Type", "text/html; charset=utf-8")
}

/// WebSocket-Handler State
struct WebSocketHandler {
    command_sender: ConfigCommandSender,
    status_subscriber: RpmStatusSubscriber,
}

/// Schließ-Grund für `SocketTx::close` (Code, Text)
type CloseReason = Option<(u16, &'static str)>;

/// Gemeinsamer Sende-Kanal: Empfangs-Schleife (Pong, Fehler) und
/// Status-Weiterleitung schreiben abwechselnd
type SharedTx<W> = Mutex<NoopRawMutex, ws::SocketTx<W>>;

impl ws::WebSocketCallback for WebSocketHandler {
    async fn run<R: embedded_io_async::Read, W: embedded_io_async::Write<Error = R::Error>>(
        mut self,
        mut rx: ws::SocketRx<R>,
        mut tx: ws::SocketTx<W>,
    ) -> Result<(), W::Error> {
        info!("HTTP: WebSocket connection established");

        if let Some(status) = self.status_subscriber.try_next_message_pure() {
            send_state(&mut tx, &status).await?;
        }

        // Beide Schleifen laufen nebeneinander: ein Status-Broadcast
        // unterbricht nie einen halb gelesenen Client-Frame
        let tx = SharedTx::new(tx);
        let outcome = select(
            receive_loop(&mut rx, &tx, &self.command_sender),
            forward_status(&mut self.status_subscriber, &tx),
        )
        .await;

        let close_reason = match outcome {
            Either::First(result) => result?,
            Either::Second(Err(e)) => return Err(e),
            Either::Second(Ok(never)) => match never {},
        };

        info!("HTTP: WebSocket connection closed");
        tx.into_inner().close(close_reason).await
    }
}

/// Liest Client-Nachrichten bis zum Close-Frame oder Protokollfehler
async fn receive_loop<R: embedded_io_async::Read, W: embedded_io_async::Write<Error = R::Error>>(
    rx: &mut ws::SocketRx<R>,
    tx: &SharedTx<W>,
    command_sender: &ConfigCommandSender,
) -> Result<CloseReason, W::Error> {
    let mut buffer = [0u8; WEBSOCKET_BUFFER_SIZE];

    loop {
        match rx.next_message(&mut buffer, pending()).await?.ignore_never_b() {
            Ok(ws::Message::Text(data)) => {
                info!("HTTP: Received text message: {} bytes", data.len());
                handle_text(tx, command_sender, data).await?;
            }
            Ok(ws::Message::Binary(data)) => {
                info!("HTTP: Received binary message: {} bytes (ignored)", data.len());
            }
            Ok(ws::Message::Ping(data)) => {
                tx.lock().await.send_pong(data).await?;
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Close(_reason)) => {
                info!("HTTP: WebSocket close received");
                return Ok(None);
            }
            Err(error) => {
                warn!("HTTP: WebSocket error");
                return Ok(Some((error.code(), "WebSocket Error")));
            }
        }
    }
}

/// Schickt jeden Status-Broadcast als State-JSON an den Client
async fn forward_status<W: embedded_io_async::Write>(
    status_subscriber: &mut RpmStatusSubscriber,
    tx: &SharedTx<W>,
) -> Result<Infallible, W::Error> {
    loop {
        let status = status_subscriber.next_message_pure().await;
        send_state(&mut *tx.lock().await, &status).await?;
    }
}

/// Parst eine Client-Nachricht und leitet sie als Kommando an den RPM-Task
///
/// Der neue Zustand erreicht den Browser über den nächsten Status-Broadcast.
async fn handle_text<W: embedded_io_async::Write>(
    tx: &SharedTx<W>,
    command_sender: &ConfigCommandSender,
    data: &str,
) -> Result<(), W::Error> {
    let msg = match serde_json_core::from_str::<WsClientMessage>(data) {
        Ok((msg, _)) => msg,
        Err(_) => {
            warn!("HTTP: Invalid config message");
            return send_error(&mut *tx.lock().await, "invalid config message").await;
        }
    };

    match msg.into_command() {
        Some(command) => {
            info!("HTTP: Forwarding command: {}", command);
            command_sender.send(command).await;
            Ok(())
        }
        None => {
            warn!("HTTP: Message without payload");
            send_error(&mut *tx.lock().await, "missing field for message type").await
        }
    }
}

/// Sendet ein State-Update an den WebSocket-Client
async fn send_state<W: embedded_io_async::Write>(
    tx: &mut ws::SocketTx<W>,
    status: &RpmStatus,
) -> Result<(), W::Error> {
    let state = WsServerMessage::state(status, Instant::now().as_millis());
    send_json::<_, JSON_STATE_BUFFER_SIZE>(tx, &state).await
}

async fn send_error<W: embedded_io_async::Write>(
    tx: &mut ws::SocketTx<W>,
    message: &'static str,
) -> Result<(), W::Error> {
    send_json::<_, JSON_ERROR_BUFFER_SIZE>(tx, &WsServerMessage::Error { message }).await
}

/// Serialisiert `msg` in einen Stack-Buffer und sendet ihn als Text-Frame
/// Zu große Nachrichten werden verworfen (nur geloggt)
async fn send_json<W: embedded_io_async::Write, const N: usize>(
    tx: &mut ws::SocketTx<W>,
    msg: &impl Serialize,
) -> Result<(), W::Error> {
    let mut json_buffer = [0u8; N];
    let Ok(n) = serde_json_core::to_slice(msg, &mut json_buffer) else {
        warn!("HTTP: JSON buffer too small, message dropped");
        return Ok(());
    };

    // serde-json-core erzeugt immer gültiges UTF-8
    match core::str::from_utf8(&json_buffer[..n]) {
        Ok(json) => tx.send_text(json).await,
        Err(_) => Ok(()),
    }
}
