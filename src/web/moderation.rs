use super::validate_form;
use crate::error::ModerationError;
use crate::middleware::ClientCtx;
use crate::moderation::{BatchAction, ModerationEngine, QueueFilter};
use crate::permission::Capability;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(apply_batch)
        .service(view_queue)
        .service(view_offenders);
}

#[derive(Deserialize, Validate)]
pub struct BatchForm {
    pub action: BatchAction,
    #[validate(length(min = 1))]
    pub comment_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct OffendersQuery {
    pub limit: Option<u64>,
}

/// Hide, restore or dismiss a set of comments in one step.
#[post("/api/moderation/batch")]
async fn apply_batch(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    form: web::Json<BatchForm>,
) -> Result<HttpResponse, ModerationError> {
    let actor_id = client.require_login()?;
    validate_form(&*form)?;

    let outcome = engine
        .apply_batch(form.action, &form.comment_ids, actor_id)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/api/moderation/queue")]
async fn view_queue(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    query: web::Query<QueueQuery>,
) -> Result<HttpResponse, ModerationError> {
    let viewer_id = client.require_login()?;
    engine
        .require_capability(viewer_id, Capability::Moderate, "list the moderation queue")
        .await?;

    let filter = match query.status.as_deref() {
        Some(status) => status.parse::<QueueFilter>()?,
        None => QueueFilter::default(),
    };

    let items = engine
        .list_moderation_queue(filter, query.q.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(items))
}

#[get("/api/moderation/offenders")]
async fn view_offenders(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    query: web::Query<OffendersQuery>,
) -> Result<HttpResponse, ModerationError> {
    let viewer_id = client.require_login()?;
    engine
        .require_capability(viewer_id, Capability::Moderate, "list offenders")
        .await?;

    let limit = query
        .limit
        .unwrap_or(engine.config().default_offender_limit);
    let offenders = engine.top_offenders(limit).await?;

    Ok(HttpResponse::Ok().json(offenders))
}
