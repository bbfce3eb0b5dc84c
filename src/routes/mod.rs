pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Registers every endpoint together with the extractor configs that turn
/// body, query and path failures into the service's error format.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(
                    web::resource(["", "/"])
                        .route(web::get().to(tasks::list_tasks))
                        .route(web::post().to(tasks::create_task)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(tasks::get_task))
                        .route(web::put().to(tasks::update_task))
                        .route(web::patch().to(tasks::update_task))
                        .route(web::delete().to(tasks::delete_task)),
                ),
        );
}
