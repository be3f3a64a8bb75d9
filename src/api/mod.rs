//! Line-delimited JSON API exposing a [`GraphSession`](crate::application::GraphSession).

pub mod dto;
pub mod server;
