use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use validator::Validate;

use super::dto::{SupportMessageRequest, SupportMessageResponse, SupportSocketQuery};
use super::extract::{ApiJson, ApiQuery};
use super::{AppState, AuthUser, SocketUser};
use crate::domain::value_objects::Actor;
use crate::error::{AppError, AppResult};
use crate::support::{chatbot, ChatMessage, SupportHub};

/// Customers talk in their own room; admins pick the room they answer in.
fn resolve_room(actor: &Actor, requested: Option<String>) -> AppResult<String> {
    let own = SupportHub::room_for(&actor.user_id);
    match (actor.is_admin(), requested) {
        (true, Some(room)) => Ok(room),
        (true, None) => Err(AppError::Validation("admins must name the room to join".to_string())),
        (false, Some(room)) if room != own => Err(AppError::Forbidden("customers may only use their own support room".to_string())),
        (false, _) => Ok(own),
    }
}

/// Posts a customer or admin message. Customer messages get an automatic answer when one matches.
fn deliver(state: &AppState, actor: &Actor, room: &str, body: &str) -> (usize, Option<&'static str>) {
    let hub = state.storefront.hub();
    let now = state.storefront.now();
    let delivered = hub.post(ChatMessage::chat(room, &actor.to_string(), body, now));
    let bot_reply = if actor.is_admin() { None } else { chatbot::reply_to(body) };
    if let Some(reply) = bot_reply {
        hub.post(ChatMessage::bot(room, reply, now));
    }
    (delivered, bot_reply)
}

pub async fn socket(
    State(s): State<AppState>,
    SocketUser(actor): SocketUser,
    ApiQuery(q): ApiQuery<SupportSocketQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let room = resolve_room(&actor, q.room)?;
    Ok(ws.on_upgrade(move |socket| session(socket, s, actor, room)))
}

async fn session(socket: WebSocket, state: AppState, actor: Actor, room: String) {
    let mut inbox = state.storefront.hub().join(&room);
    let (mut sink, mut stream) = socket.split();
    tracing::info!(%room, %actor, "support session opened");

    let outbound_room = room.clone();
    let mut outbound = tokio::spawn(async move {
        loop {
            match inbox.recv().await {
                Ok(message) => {
                    let Ok(text) = serde_json::to_string(&message) else { continue };
                    if sink.send(Message::Text(text)).await.is_err() { break; }
                }
                Err(RecvError::Lagged(skipped)) => tracing::warn!(room = %outbound_room, skipped, "support session lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let inbound_state = state.clone();
    let inbound_actor = actor.clone();
    let inbound_room = room.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) if !text.trim().is_empty() => {
                    deliver(&inbound_state, &inbound_actor, &inbound_room, text.trim());
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut outbound => inbound.abort(),
        _ = &mut inbound => outbound.abort(),
    }
    tracing::info!(%room, %actor, "support session closed");
}

pub async fn post_message(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(r): ApiJson<SupportMessageRequest>) -> AppResult<Json<SupportMessageResponse>> {
    r.validate()?;
    let room = resolve_room(&actor, r.room)?;
    let (delivered, bot_reply) = deliver(&s, &actor, &room, r.body.trim());
    Ok(Json(SupportMessageResponse { room, delivered, bot_reply }))
}
