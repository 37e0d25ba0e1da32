use actix_cors::Cors;
use actix_web::http::header;

/// The dashboard front end is served from a different origin during development.
pub fn cors_middleware() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
