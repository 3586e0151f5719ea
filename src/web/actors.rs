use super::validate_form;
use crate::error::ModerationError;
use crate::middleware::ClientCtx;
use crate::moderation::ModerationEngine;
use crate::permission::Capability;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_capabilities)
        .service(create_ban)
        .service(view_active_ban);
}

#[derive(Deserialize, Validate)]
pub struct BanForm {
    #[validate(length(min = 1))]
    pub reason: String,
    pub duration_days: Option<i64>,
}

#[get("/api/actors/{id}/capabilities")]
async fn view_capabilities(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ModerationError> {
    client.require_login()?;

    let capabilities = engine.get_capabilities(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(capabilities))
}

#[post("/api/actors/{id}/ban")]
async fn create_ban(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    path: web::Path<i32>,
    form: web::Json<BanForm>,
) -> Result<HttpResponse, ModerationError> {
    let moderator_id = client.require_login()?;
    validate_form(&*form)?;

    let ban = engine
        .ban(
            path.into_inner(),
            moderator_id,
            &form.reason,
            form.duration_days,
        )
        .await?;

    Ok(HttpResponse::Created().json(ban))
}

#[get("/api/actors/{id}/ban")]
async fn view_active_ban(
    client: ClientCtx,
    engine: web::Data<ModerationEngine>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ModerationError> {
    let viewer_id = client.require_login()?;
    engine
        .require_capability(viewer_id, Capability::Moderate, "view bans")
        .await?;

    let actor_id = path.into_inner();
    match engine.active_ban(actor_id).await? {
        Some(ban) => Ok(HttpResponse::Ok().json(ban)),
        None => Err(ModerationError::NotFound(format!(
            "active ban for actor {}",
            actor_id
        ))),
    }
}
