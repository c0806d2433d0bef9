/// Home page feed: up to five featured news articles and events, newest first

use axum::extract::State;
use creatorhub_shared::models::featured::{load_featured, FeaturedItem};

use crate::app::AppState;
use crate::error::{ApiResult, Data};

pub async fn get_featured(State(state): State<AppState>) -> ApiResult<Data<Vec<FeaturedItem>>> {
    Ok(Data(load_featured(&state.db).await?))
}
