use crate::{AppState, error::ApiError};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use bytes::BytesMut;
use futures::TryStreamExt;
use postcraft::{
    app::{self, UploadAnalysis},
    grid::GridPiece,
    schema::{GridConvertRequest, GridSize},
};
use serde::Serialize;

const UPLOAD_FAILED: &str = "Failed to process image";
const GRID_FAILED: &str = "Failed to convert grid";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub upload: UploadAnalysis,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub success: bool,
    pub pieces: Vec<PieceResponse>,
    pub grid_size: GridSize,
    pub piece_width: u32,
    pub piece_height: u32,
    pub content_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PieceResponse {
    pub index: u32,
    pub row: u32,
    pub column: u32,
    pub filename: String,
    pub data_url: String,
}

impl From<&GridPiece> for PieceResponse {
    fn from(piece: &GridPiece) -> Self {
        PieceResponse {
            index: piece.index,
            row: piece.row,
            column: piece.column,
            filename: piece.filename(),
            data_url: piece.data_url(),
        }
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(ApiError::multipart(UPLOAD_FAILED))?;
    let mut image: Option<(String, BytesMut)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::multipart_field(UPLOAD_FAILED))?
    {
        if field.name() != Some("image") {
            continue;
        }
        // Only file parts count; a plain text field named `image` is not an upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let mut data = BytesMut::new();
        let mut stream = field.into_stream();
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(ApiError::multipart_field(UPLOAD_FAILED))?
        {
            data.extend_from_slice(&chunk);
            if data.len() > state.upload_limit {
                return Err(ApiError::Status(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!(
                        "{UPLOAD_FAILED}: image exceeds the {} byte upload limit",
                        state.upload_limit
                    ),
                ));
            }
        }

        image = Some((filename, data));
        break;
    }

    let Some((filename, data)) = image else {
        return Err(ApiError::BadRequest("No image file provided".to_string()));
    };

    let upload = app::analyze_upload(&state.ai, &data, filename)
        .await
        .map_err(ApiError::context(UPLOAD_FAILED))?;

    Ok(Json(UploadResponse {
        success: true,
        upload,
    }))
}

pub async fn convert_grid(
    State(state): State<AppState>,
    body: Result<Json<GridConvertRequest>, JsonRejection>,
) -> Result<Json<GridResponse>, ApiError> {
    let Json(req) = body.map_err(ApiError::json(GRID_FAILED))?;

    let generated = app::convert_grid(&state.store, req)
        .await
        .map_err(ApiError::context(GRID_FAILED))?;

    let split = generated.payload;
    Ok(Json(GridResponse {
        success: true,
        pieces: split.pieces.iter().map(PieceResponse::from).collect(),
        grid_size: split.size,
        piece_width: split.piece_width,
        piece_height: split.piece_height,
        content_id: generated.content_id,
    }))
}
