//! Small response bodies shared by several handlers.

use authd_core::types::DbId;
use serde::Serialize;

/// `{ "message": ... }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `{ "id": ... }` returned after a create.
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: DbId,
}
