use axum::Json;
use axum::extract::{Multipart, State};
use tracing::{debug, instrument};

use crate::server::{AppState, errors::AppError};
use crate::verification::VerificationResult;

const DOCUMENT_PART: &str = "data";
const SIGNATURE_PART: &str = "sig";

/// Verifies the detached signature in part `sig` over the document in part `data`.
#[instrument(skip_all)]
pub async fn verify_signature(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerificationResult>, AppError> {
    let mut document = None;
    let mut signature = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = match name.as_str() {
            DOCUMENT_PART => &mut document,
            SIGNATURE_PART => &mut signature,
            _ => {
                debug!(name, "Ignoring unexpected multipart field");
                continue;
            }
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.body_text()))?;
        *slot = Some(bytes);
    }

    let document =
        document.ok_or_else(|| AppError::Upload(format!("missing part `{DOCUMENT_PART}`")))?;
    let signature = signature
        .filter(|sig| !sig.is_empty())
        .ok_or_else(|| AppError::Upload(format!("missing part `{SIGNATURE_PART}`")))?;
    debug!(
        document_len = document.len(),
        signature_len = signature.len(),
        "Upload received"
    );

    let result = state.verification.verify(&document, &signature).await?;
    Ok(Json(result))
}
