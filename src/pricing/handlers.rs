// HTTP handlers for band and postcode pricing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

use crate::pricing::{
    BandAssignment, PostcodeEntry, PriceBand, PricingError, ResolvedPrice, Transmission,
};
use crate::validation::band_code_is_valid;

/// Query parameters selecting the transmission for band resolution
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TransmissionQuery {
    /// Defaults to manual when omitted
    pub transmission: Option<Transmission>,
}

impl TransmissionQuery {
    fn transmission(&self) -> Transmission {
        self.transmission.unwrap_or_default()
    }
}

/// Response body for a resolved postcode band
#[derive(Debug, Serialize, ToSchema)]
pub struct PostcodeBandResponse {
    #[schema(example = "AB1")]
    pub postcode: String,
    #[schema(example = "A")]
    pub band: String,
    pub transmission: Transmission,
}

/// Response body for a band assignment update
#[derive(Debug, Serialize, ToSchema)]
pub struct BandUpdateResponse {
    pub updated: bool,
}

/// Handler for GET /api/bands
/// Lists all price bands, cheapest hourly rate first
#[utoipa::path(
    get,
    path = "/api/bands",
    responses(
        (status = 200, description = "All price bands", body = Vec<PriceBand>),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing"
)]
pub async fn list_bands_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<PriceBand>>, PricingError> {
    let bands = state.engine.catalog().list_bands().await?;
    Ok(Json(bands))
}

/// Handler for GET /api/bands/{band}
/// Retrieves a single price band by code
#[utoipa::path(
    get,
    path = "/api/bands/{band}",
    params(("band" = String, Path, description = "Band code")),
    responses(
        (status = 200, description = "Band details", body = PriceBand),
        (status = 404, description = "Band not found")
    ),
    tag = "pricing"
)]
pub async fn get_band_handler(
    State(state): State<crate::AppState>,
    Path(band): Path<String>,
) -> Result<Json<PriceBand>, PricingError> {
    let band = state.engine.catalog().get_band_info(&band).await?;
    Ok(Json(band))
}

/// Handler for GET /api/bands/{band}/prices
/// Prices every course against the given band
#[utoipa::path(
    get,
    path = "/api/bands/{band}/prices",
    params(("band" = String, Path, description = "Band code")),
    responses(
        (status = 200, description = "Price per course relation"),
        (status = 404, description = "Band not found")
    ),
    tag = "pricing"
)]
pub async fn band_price_list_handler(
    State(state): State<crate::AppState>,
    Path(band): Path<String>,
) -> Result<Json<HashMap<String, ResolvedPrice>>, PricingError> {
    let prices = state.engine.price_list(&band).await?;
    Ok(Json(prices))
}

/// Handler for GET /api/postcodes/{postcode}/band
/// Resolves a postcode to its price band
#[utoipa::path(
    get,
    path = "/api/postcodes/{postcode}/band",
    params(
        ("postcode" = String, Path, description = "Postcode (any form)"),
        TransmissionQuery
    ),
    responses(
        (status = 200, description = "Resolved band", body = PostcodeBandResponse),
        (status = 404, description = "Postcode not found")
    ),
    tag = "pricing"
)]
pub async fn postcode_band_handler(
    State(state): State<crate::AppState>,
    Path(postcode): Path<String>,
    Query(query): Query<TransmissionQuery>,
) -> Result<Json<PostcodeBandResponse>, PricingError> {
    let transmission = query.transmission();
    let entry = state.engine.catalog().find_postcode(&postcode).await?;

    Ok(Json(PostcodeBandResponse {
        band: entry.band_for(transmission).to_string(),
        postcode: entry.postcode,
        transmission,
    }))
}

/// Handler for GET /api/postcodes/{postcode}/prices
/// The full course price list for a postcode's band
#[utoipa::path(
    get,
    path = "/api/postcodes/{postcode}/prices",
    params(
        ("postcode" = String, Path, description = "Postcode (any form)"),
        TransmissionQuery
    ),
    responses(
        (status = 200, description = "Price per course relation"),
        (status = 404, description = "Postcode or band not found")
    ),
    tag = "pricing"
)]
pub async fn postcode_price_list_handler(
    State(state): State<crate::AppState>,
    Path(postcode): Path<String>,
    Query(query): Query<TransmissionQuery>,
) -> Result<Json<HashMap<String, ResolvedPrice>>, PricingError> {
    let prices = state
        .engine
        .price_list_for_postcode(&postcode, query.transmission())
        .await?;
    Ok(Json(prices))
}

/// Handler for PUT /api/postcodes/{postcode}/band
/// Reassigns the band(s) for one postcode
///
/// An empty or malformed assignment is reported as a no-op failure rather
/// than an exception; an unmatched postcode also reports `updated: false`.
#[utoipa::path(
    put,
    path = "/api/postcodes/{postcode}/band",
    params(("postcode" = String, Path, description = "Postcode (any form)")),
    request_body = BandAssignment,
    responses(
        (status = 200, description = "Update applied (or nothing matched)", body = BandUpdateResponse),
        (status = 400, description = "Empty or invalid assignment", body = BandUpdateResponse)
    ),
    tag = "pricing"
)]
pub async fn update_postcode_band_handler(
    State(state): State<crate::AppState>,
    Path(postcode): Path<String>,
    Json(assignment): Json<BandAssignment>,
) -> Result<(StatusCode, Json<BandUpdateResponse>), PricingError> {
    let codes_valid = assignment
        .manual
        .iter()
        .chain(assignment.automatic.iter())
        .all(|code| band_code_is_valid(code));

    if assignment.is_empty() || !codes_valid {
        tracing::warn!("Rejecting band assignment for postcode {}", postcode);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(BandUpdateResponse { updated: false }),
        ));
    }

    let updated = state
        .engine
        .catalog()
        .update_band(&postcode, &assignment)
        .await?;

    Ok((StatusCode::OK, Json(BandUpdateResponse { updated })))
}

/// Handler for GET /api/areas/{area}/postcodes
/// Lists the postcodes covered in an area
#[utoipa::path(
    get,
    path = "/api/areas/{area}/postcodes",
    params(("area" = String, Path, description = "Area prefix, e.g. AB")),
    responses(
        (status = 200, description = "Postcodes in the area", body = Vec<PostcodeEntry>)
    ),
    tag = "pricing"
)]
pub async fn area_postcodes_handler(
    State(state): State<crate::AppState>,
    Path(area): Path<String>,
) -> Result<Json<Vec<PostcodeEntry>>, PricingError> {
    let postcodes = state.engine.catalog().list_postcodes_in_area(&area).await?;
    Ok(Json(postcodes))
}

/// Handler for GET /api/areas/{area}/bands
/// Lists the distinct bands covering an area, cheapest first
#[utoipa::path(
    get,
    path = "/api/areas/{area}/bands",
    params(
        ("area" = String, Path, description = "Area prefix, e.g. AB"),
        TransmissionQuery
    ),
    responses(
        (status = 200, description = "Bands covering the area", body = Vec<PriceBand>)
    ),
    tag = "pricing"
)]
pub async fn area_bands_handler(
    State(state): State<crate::AppState>,
    Path(area): Path<String>,
    Query(query): Query<TransmissionQuery>,
) -> Result<Json<Vec<PriceBand>>, PricingError> {
    let bands = state
        .engine
        .catalog()
        .list_bands_in_area(&area, query.transmission())
        .await?;
    Ok(Json(bands))
}
