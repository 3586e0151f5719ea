pub mod actors;
pub mod comments;
pub mod moderation;

use crate::error::ModerationError;
use actix_web::web::{JsonConfig, PathConfig, QueryConfig};
use validator::Validate;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Extractor rejections answer in the same JSON shape as every other error.
    conf.app_data(JsonConfig::default().error_handler(|e, _| {
        log::debug!("Rejected request body: {}", e);
        ModerationError::InvalidInput(e.to_string()).into()
    }))
    .app_data(QueryConfig::default().error_handler(|e, _| {
        ModerationError::InvalidInput(e.to_string()).into()
    }))
    .app_data(PathConfig::default().error_handler(|e, _| {
        ModerationError::InvalidInput(e.to_string()).into()
    }));

    actors::configure(conf);
    comments::configure(conf);
    moderation::configure(conf);
}

/// Run a request body through validator, turning failures into InvalidInput.
pub(crate) fn validate_form<T: Validate>(form: &T) -> Result<(), ModerationError> {
    form.validate().map_err(|e| {
        log::debug!("Request validation failed: {}", e);
        ModerationError::InvalidInput(e.to_string())
    })
}
