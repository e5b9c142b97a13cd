use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use actix_cors::Cors;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::dev::Server;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use futures_util::TryStreamExt;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzeError, InferenceError};
use crate::message::MessageSource;
use crate::model::imaging;
use crate::model::traits::model_trait::Predictor;

const FILE_FIELD: &str = "file";
const GREETING: &str = "Happy Birthday:";

/// Everything a request needs. Built once at startup, never mutated.
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub messages: Arc<dyn MessageSource>,
    pub view_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        messages: Arc<dyn MessageSource>,
        view_dir: PathBuf,
    ) -> Self {
        Self {
            predictor,
            messages,
            view_dir,
            max_upload_bytes: usize::MAX,
        }
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnalyzeResponse {
    pub result: String,
}

pub fn format_result(label: &str, message: &str) -> String {
    format!("{label}\n{GREETING}{message}")
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn homepage(data: web::Data<AppState>) -> HttpResponse {
    let path = data.view_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            warn!("Landing page {} unavailable: {}", path.display(), e);
            HttpResponse::NotFound().finish()
        }
    }
}

/// Pull the bytes of the `file` field out of a multipart body.
async fn read_file_field(payload: &mut Multipart, limit: usize) -> Result<Vec<u8>, AnalyzeError> {
    let multipart = |e: actix_multipart::MultipartError| AnalyzeError::Multipart(e.to_string());

    while let Some(mut field) = payload.try_next().await.map_err(multipart)? {
        if field.content_disposition().get_name() != Some(FILE_FIELD) {
            continue;
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart)? {
            if bytes.len() + chunk.len() > limit {
                return Err(AnalyzeError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }
    Err(AnalyzeError::MissingFile)
}

async fn analyze(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AnalyzeError> {
    let bytes = read_file_field(&mut payload, data.max_upload_bytes).await?;
    // Decoding a large upload is CPU-bound, keep it off the worker thread.
    let image = web::block(move || imaging::decode(&bytes))
        .await
        .map_err(|e| AnalyzeError::Inference(InferenceError(e.to_string())))??;

    let start = Instant::now();
    let prediction = data.predictor.predict(image).await?;
    info!(
        "Predicted {} in {:?}",
        prediction.label,
        start.elapsed()
    );

    let message = data.messages.message();
    info!("{message}");

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        result: format_result(&prediction.label, &message),
    }))
}

/// Any origin; only the headers browsers send for plain form posts.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec!["X-Requested-With", "Content-Type"])
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(homepage))
        .route("/health_check", web::get().to(health_check))
        .route("/analyze", web::post().to(analyze));
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    static_dir: PathBuf,
) -> Result<Server, std::io::Error> {
    let app_state = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(routes)
            .service(Files::new("/static", static_dir.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
