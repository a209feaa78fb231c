//! HTTP middleware.

pub mod request_id;

pub use request_id::{request_id_layers, request_id_of, MakeRequestUuidV7, REQUEST_ID_HEADER};
