use super::validate_form;
use crate::error::ModerationError;
use crate::middleware::ClientCtx;
use crate::moderation::ModerationEngine;
use crate::permission::Capability;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(flag_comment).service(view_comment_events);
}

#[derive(Deserialize, Validate)]
pub struct FlagForm {
    #[validate(length(min = 1))]
    pub reason: String,
}

/// Report a comment. Any identified caller may flag.
#[post("/api/comments/{id}/flag")]
async fn flag_comment(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    path: web::Path<i32>,
    form: web::Json<FlagForm>,
) -> Result<HttpResponse, ModerationError> {
    let actor_id = client.require_login()?;
    validate_form(&*form)?;

    let comment = engine
        .flag(path.into_inner(), actor_id, &form.reason)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

#[get("/api/comments/{id}/events")]
async fn view_comment_events(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ModerationError> {
    let viewer_id = client.require_login()?;
    engine
        .require_capability(viewer_id, Capability::Moderate, "view moderation history")
        .await?;

    let events = engine.comment_history(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(events))
}
