//! Types shared by the local store, the remote client and the sync layer.

pub mod api;
pub mod events;
pub mod models;
