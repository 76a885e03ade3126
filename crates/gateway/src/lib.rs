//! Gateway: realtime presence, chat relay, and call signaling.
//!
//! Lifecycle:
//! 1. Load config, resolve auth tokens, open the call store
//! 2. Start the HTTP server (health, call-history routes)
//! 3. Attach the WebSocket upgrade handler
//! 4. Per connection: read loop decodes typed events and dispatches them to
//!    presence, the call session manager, or the chat relay
//!
//! Chat persistence, credential issuance, and the rest of the product's CRUD
//! surface live in external collaborators; this crate only tracks who is
//! online, relays events between peers, and owns the durable call record.

pub mod auth;
pub mod broadcast;
pub mod calls;
pub mod chat;
pub mod history;
pub mod notify;
pub mod presence;
pub mod rooms;
pub mod server;
pub mod services;
pub mod state;
pub mod ws;

#[cfg(test)]
pub(crate) mod testutil;
