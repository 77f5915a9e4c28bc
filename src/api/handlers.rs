use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    Candidate, Decision, Direction, ExtendedDetail, ImageSize, MovieId, WatchProvider,
    WatchlistEntry,
};
use crate::services::{
    deck::{DeckSummary, PageRequest},
    detail_panel::{PanelState, PanelView},
    gesture::DragRelease,
    session::{ConfirmOutcome, Notice, SwipeOutcome},
};

use super::AppState;

const DEFAULT_WINDOW: usize = 3;
const MAX_WINDOW: usize = 20;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub movie_id: MovieId,
    #[serde(flatten)]
    pub release: DragRelease,
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub direction: Direction,
}

/// A card as rendered on the deck
#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id: MovieId,
    pub title: String,
    pub year: Option<i32>,
    pub vote_average: f64,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

impl From<&Candidate> for CardResponse {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            title: candidate.title.clone(),
            year: candidate.release_year(),
            vote_average: candidate.vote_average,
            overview: candidate.overview.clone(),
            poster_url: candidate.poster_url(ImageSize::W500),
            backdrop_url: candidate.backdrop_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeckResponse {
    pub cards: Vec<CardResponse>,
    pub summary: DeckSummary,
}

#[derive(Debug, Serialize)]
pub struct RefillResponse {
    pub requested_page: Option<u32>,
    pub summary: DeckSummary,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub runtime: String,
    pub directors: Vec<String>,
    pub trailer_url: Option<String>,
    #[serde(flatten)]
    pub detail: ExtendedDetail,
}

impl From<ExtendedDetail> for DetailResponse {
    fn from(detail: ExtendedDetail) -> Self {
        Self {
            runtime: detail.formatted_runtime(),
            directors: detail.directors().into_iter().map(String::from).collect(),
            trailer_url: detail.trailer().and_then(|v| v.url()),
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderGroupResponse {
    pub name: &'static str,
    pub providers: Vec<WatchProvider>,
}

#[derive(Debug, Serialize)]
pub struct PanelResponse {
    pub state: PanelState,
    pub pending: Option<CardResponse>,
    /// Absent while loading or when the lookup failed
    pub detail: Option<DetailResponse>,
    pub provider_groups: Vec<ProviderGroupResponse>,
    pub watch_link: Option<String>,
    /// Shown once providers have settled without any option
    pub providers_message: Option<String>,
}

impl From<PanelView> for PanelResponse {
    fn from(view: PanelView) -> Self {
        let provider_groups = view
            .providers
            .as_ref()
            .map(|p| {
                p.groups()
                    .into_iter()
                    .map(|(name, list)| ProviderGroupResponse {
                        name,
                        providers: list.to_vec(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let providers_message = match (&view.state, &view.providers) {
            (PanelState::Ready, None) => Some("Not yet streaming".to_string()),
            (PanelState::Ready, Some(p)) if p.is_empty() => Some("Not yet streaming".to_string()),
            _ => None,
        };

        Self {
            state: view.state,
            pending: view.pending.as_ref().map(CardResponse::from),
            detail: view.detail.map(DetailResponse::from),
            provider_groups,
            watch_link: view.providers.and_then(|p| p.link),
            providers_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub movie_id: MovieId,
    pub direction: Direction,
    pub position: usize,
}

impl From<Decision> for DecisionResponse {
    fn from(decision: Decision) -> Self {
        Self {
            movie_id: decision.candidate.id,
            direction: decision.direction,
            position: decision.position,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Top `n` undecided cards plus deck progress
pub async fn get_deck(
    State(state): State<AppState>,
    Query(params): Query<WindowQuery>,
) -> Json<DeckResponse> {
    let n = params.n.unwrap_or(DEFAULT_WINDOW).min(MAX_WINDOW);
    let cards = state.session.visible_window(n).await;

    Json(DeckResponse {
        cards: cards.iter().map(CardResponse::from).collect(),
        summary: state.session.summary().await,
    })
}

pub async fn swipe(
    State(state): State<AppState>,
    Json(payload): Json<SwipeRequest>,
) -> Json<SwipeOutcome> {
    Json(state.session.swipe(payload.movie_id, payload.release).await)
}

/// Decides on the top card without a drag
pub async fn decide(
    State(state): State<AppState>,
    Json(payload): Json<DecideRequest>,
) -> AppResult<Json<DecisionResponse>> {
    let decision = state
        .session
        .decide(payload.direction)
        .await
        .ok_or_else(|| AppError::NotFound("No card left to decide on".to_string()))?;

    Ok(Json(decision.into()))
}

pub async fn refill(State(state): State<AppState>) -> Json<RefillResponse> {
    let request: Option<PageRequest> = state.session.refill().await;

    Json(RefillResponse {
        requested_page: request.map(|r| r.page),
        summary: state.session.summary().await,
    })
}

pub async fn get_panel(State(state): State<AppState>) -> Json<PanelResponse> {
    Json(state.session.panel().await.into())
}

pub async fn confirm(State(state): State<AppState>) -> Json<ConfirmOutcome> {
    Json(state.session.confirm().await)
}

pub async fn cancel(State(state): State<AppState>) -> Json<Value> {
    let cancelled = state.session.cancel().await.map(|c| c.id);
    Json(json!({ "cancelled": cancelled }))
}

pub async fn get_watchlist(State(state): State<AppState>) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let entries = state.session.watchlist().await?;
    Ok(Json(entries))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    let id = MovieId(id);
    if state.session.remove_from_watchlist(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Movie {} is not in the watchlist", id)))
    }
}

/// Drains pending notices
pub async fn take_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.session.take_notices().await)
}
