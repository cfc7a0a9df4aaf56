//! # API REST
//!
//! REST API implementation for MedIntel.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON error bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and request validation. Both the standalone `medintel-api-rest`
//! binary and the workspace's `medintel-run` binary serve the router built by [`router`].

#![warn(rust_2018_idioms)]

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AllergyWarning, CheckInteractionReq, CheckInteractionRes, DiagnoseReq, DiagnoseRes, Diagnosis,
    ErrorRes, HealthRes, HealthService, InteractionWarning, ListRecordsRes, ReferenceRes,
    ValidationError,
};
use medintel_core::config::{
    model_path_from_env_value, reference_data_path_from_env_value, seed_from_env_value,
    tree_count_from_env_value,
};
use medintel_core::{
    CoreConfig, CoreResult, DecisionService, DiagnosisRecord, ForestParams, RecordStore,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: DecisionService,
    pub records: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(service: DecisionService, records: Arc<dyn RecordStore>) -> Self {
        Self { service, records }
    }
}

/// Resolves core configuration from `MEDINTEL_*` environment variables.
///
/// # Environment Variables
/// - `MEDINTEL_MODEL_PATH`: model artifact path (default: `models/diagnostic_model.json`)
/// - `MEDINTEL_REFERENCE_DATA`: reference data YAML override (default: embedded payload)
/// - `MEDINTEL_MODEL_SEED`: forest seed (default: 42)
/// - `MEDINTEL_MODEL_TREES`: number of trees (default: 100)
///
/// # Errors
/// Returns `CoreError::Configuration` for unparsable values or a missing override file.
pub fn core_config_from_env() -> CoreResult<CoreConfig> {
    let forest = ForestParams {
        n_estimators: tree_count_from_env_value(std::env::var("MEDINTEL_MODEL_TREES").ok())?,
        seed: seed_from_env_value(std::env::var("MEDINTEL_MODEL_SEED").ok())?,
        max_depth: None,
    };
    CoreConfig::new(
        model_path_from_env_value(std::env::var("MEDINTEL_MODEL_PATH").ok()),
        reference_data_path_from_env_value(std::env::var("MEDINTEL_REFERENCE_DATA").ok()),
        forest,
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(health, diagnose, check_interaction, list_records, reference),
    components(schemas(
        HealthRes,
        ErrorRes,
        DiagnoseReq,
        DiagnoseRes,
        CheckInteractionReq,
        CheckInteractionRes,
        InteractionWarning,
        AllergyWarning,
        Diagnosis,
        ListRecordsRes,
        ReferenceRes,
    ))
)]
pub struct ApiDoc;

type ApiFailure = (StatusCode, Json<ErrorRes>);

const MODEL_UNAVAILABLE: &str = "Diagnosis model unavailable";
const INTERNAL_ERROR: &str = "Internal error";
const NO_DATA: &str = "No data provided";

fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (status, Json(ErrorRes::new(message)))
}

fn bad_request(err: ValidationError) -> ApiFailure {
    failure(StatusCode::BAD_REQUEST, err.to_string())
}

/// JSON request body whose rejections use the `{"error": ...}` body.
///
/// An empty body is rejected with `No data provided`. The content type is not checked.
struct JsonBody<T>(T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| failure(rejection.status(), rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(failure(StatusCode::BAD_REQUEST, NO_DATA));
        }
        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(failure(rejection.status(), rejection.body_text()))
            }
        }
    }
}

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/diagnose", post(diagnose))
        .route("/check_interaction", post(check_interaction))
        .route("/records", get(list_records))
        .route("/reference", get(reference))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/diagnose",
    request_body = DiagnoseReq,
    responses(
        (status = 200, description = "Most likely condition", body = DiagnoseRes),
        (status = 400, description = "No data or no symptoms provided", body = ErrorRes),
        (status = 422, description = "Body does not match the request schema", body = ErrorRes),
        (status = 503, description = "Diagnosis model unavailable", body = ErrorRes)
    )
)]
/// Predict the most likely condition from a symptom checklist
///
/// Symptom names outside the canonical vocabulary are ignored. When both a patient and a doctor
/// identifier are supplied, a summary of the result is appended to the record store.
///
/// # Errors
/// Returns `400 Bad Request` if the body is empty or malformed or the `symptoms` mapping is missing, `503 Service Unavailable` if
/// the classifier cannot be loaded or trained, and `500 Internal Server Error` if the summary
/// record cannot be stored.
#[axum::debug_handler]
async fn diagnose(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DiagnoseReq>,
) -> Result<Json<DiagnoseRes>, ApiFailure> {
    let input = req.validate().map_err(bad_request)?;

    // First use may train the forest, so keep it off the async workers.
    let service = state.service.clone();
    let observation = input.observation;
    let result = tokio::task::spawn_blocking(move || service.diagnose(&observation))
        .await
        .map_err(|e| {
            tracing::error!("Diagnose task failed: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        })?
        .map_err(|e| {
            tracing::error!("Diagnosis model unavailable: {:?}", e);
            failure(StatusCode::SERVICE_UNAVAILABLE, MODEL_UNAVAILABLE)
        })?;

    if let Some(attribution) = input.attribution {
        let record =
            DiagnosisRecord::summarise(attribution.patient_id, attribution.doctor_id, &result);
        state.records.append(record).map_err(|e| {
            tracing::error!("Record diagnosis error: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        })?;
    }

    Ok(Json(DiagnoseRes::from(&result)))
}

#[utoipa::path(
    post,
    path = "/check_interaction",
    request_body = CheckInteractionReq,
    responses(
        (status = 200, description = "Interaction and allergy findings", body = CheckInteractionRes),
        (status = 400, description = "No data or no medications provided", body = ErrorRes),
        (status = 422, description = "Body does not match the request schema", body = ErrorRes)
    )
)]
/// Screen a medication list for known interactions and allergy conflicts
#[axum::debug_handler]
async fn check_interaction(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CheckInteractionReq>,
) -> Result<Json<CheckInteractionRes>, ApiFailure> {
    let input = req.validate().map_err(bad_request)?;
    let report = state.service.screen(&input.medications, &input.allergies);
    Ok(Json(CheckInteractionRes::from(report)))
}

#[utoipa::path(
    get,
    path = "/records",
    responses(
        (status = 200, description = "Recorded diagnoses, oldest first", body = ListRecordsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_records(State(state): State<AppState>) -> Result<Json<ListRecordsRes>, ApiFailure> {
    match state.records.list() {
        Ok(records) => Ok(Json(ListRecordsRes {
            diagnoses: records.into_iter().map(Diagnosis::from).collect(),
        })),
        Err(e) => {
            tracing::error!("List records error: {:?}", e);
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR))
        }
    }
}

#[utoipa::path(
    get,
    path = "/reference",
    responses(
        (status = 200, description = "Known symptoms, conditions and allergy categories", body = ReferenceRes)
    )
)]
async fn reference(State(state): State<AppState>) -> Json<ReferenceRes> {
    Json(ReferenceRes::from(state.service.reference()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use medintel_core::{
        CoreError, CoreResult, ForestParams, InMemoryModelStore, InMemoryRecordStore,
        ModelArtifact, ModelStore, ReferenceData,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn params() -> ForestParams {
        ForestParams {
            n_estimators: 10,
            seed: 42,
            max_depth: None,
        }
    }

    fn app_with_store(store: Arc<dyn ModelStore>) -> (Router, Arc<InMemoryRecordStore>) {
        let reference = Arc::new(ReferenceData::embedded().unwrap());
        let service = DecisionService::with_store(reference, params(), store);
        let records = Arc::new(InMemoryRecordStore::new());
        (router(AppState::new(service, records.clone())), records)
    }

    fn app() -> (Router, Arc<InMemoryRecordStore>) {
        app_with_store(Arc::new(InMemoryModelStore::new()))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn send_raw(app: Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// A store whose artifact can never be written, so training cannot complete.
    struct ReadOnlyStore;

    impl ModelStore for ReadOnlyStore {
        fn load(&self) -> CoreResult<Option<ModelArtifact>> {
            Ok(None)
        }

        fn save(&self, _artifact: &ModelArtifact) -> CoreResult<()> {
            Err(CoreError::ModelWrite(std::io::Error::other("read-only")))
        }

        fn describe(&self) -> String {
            "read-only".into()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "message": "MedIntel is alive"}));
    }

    #[tokio::test]
    async fn test_diagnose_without_symptoms_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(app, "POST", "/diagnose", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No symptoms provided"}));
    }

    #[tokio::test]
    async fn test_diagnose_returns_prediction() {
        let (app, records) = app();
        let (status, body) = send(
            app,
            "POST",
            "/diagnose",
            Some(json!({"symptoms": {"cough": true, "fever": 1, "headache": false, "glow": true}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symptoms_detected"], json!(["fever", "cough"]));
        assert!(body["disease"].is_string());
        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&confidence));
        assert!(records.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_diagnose_records_when_both_ids_present() {
        let (app, records) = app();
        let (status, body) = send(
            app.clone(),
            "POST",
            "/diagnose",
            Some(json!({"symptoms": {"fever": true}, "patient_id": 7, "doctor_id": "12"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let stored = records.list().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].patient_id, "7");
        assert_eq!(stored[0].doctor_id, "12");
        let text = &stored[0].diagnosis_text;
        let prefix = format!("Disease: {}, Confidence: ", body["disease"].as_str().unwrap());
        let confidence: f64 = text
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix('%'))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(confidence, body["confidence"].as_f64().unwrap());

        let (status, listed) = send(app, "GET", "/records", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["diagnoses"].as_array().unwrap().len(), 1);
        assert_eq!(listed["diagnoses"][0]["patient_id"], "7");
    }

    #[tokio::test]
    async fn test_diagnose_with_one_id_does_not_record() {
        let (app, records) = app();
        let (status, _) = send(
            app,
            "POST",
            "/diagnose",
            Some(json!({"symptoms": {"fever": true}, "patient_id": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(records.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_diagnose_reports_unavailable_model() {
        let (app, _) = app_with_store(Arc::new(ReadOnlyStore));
        let (status, body) = send(
            app,
            "POST",
            "/diagnose",
            Some(json!({"symptoms": {"fever": true}})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "Diagnosis model unavailable"}));
    }

    #[tokio::test]
    async fn test_check_interaction_without_medications_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(
            app,
            "POST",
            "/check_interaction",
            Some(json!({"allergies": ["penicillin"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No medications provided"}));
    }

    #[tokio::test]
    async fn test_check_interaction_reports_findings() {
        let (app, _) = app();
        let (status, body) = send(
            app,
            "POST",
            "/check_interaction",
            Some(json!({
                "medications": ["Warfarin", "aspirin", "amoxicillin"],
                "allergies": ["Penicillin"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["drug_interactions"],
            json!([{
                "medication1": "aspirin",
                "medication2": "warfarin",
                "warning": body["drug_interactions"][0]["warning"],
                "severity": "high"
            }])
        );
        assert_eq!(body["allergy_warnings"][0]["medication"], "amoxicillin");
        assert_eq!(body["allergy_warnings"][0]["allergy"], "penicillin");
        assert_eq!(
            body["medications_checked"],
            json!(["Warfarin", "aspirin", "amoxicillin"])
        );
    }

    #[tokio::test]
    async fn test_check_interaction_without_allergies() {
        let (app, _) = app();
        let (status, body) = send(
            app,
            "POST",
            "/check_interaction",
            Some(json!({"medications": ["metformin"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["drug_interactions"], json!([]));
        assert_eq!(body["allergy_warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_reference_lists_vocabulary() {
        let (app, _) = app();
        let (status, body) = send(app, "GET", "/reference", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symptoms"][0], "fever");
        assert_eq!(body["allergies"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_body_reports_no_data() {
        let (app, _) = app();
        let (status, body) = send_raw(app.clone(), "/diagnose", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No data provided"}));

        let (status, body) = send_raw(app, "/check_interaction", "  ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No data provided"}));
    }

    #[tokio::test]
    async fn test_malformed_body_reports_json_error() {
        let (app, _) = app();
        let (status, body) = send_raw(app, "/diagnose", "{\"symptoms\": ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_mistyped_field_reports_json_error() {
        let (app, _) = app();
        let (status, body) = send_raw(
            app,
            "/check_interaction",
            "{\"medications\": \"aspirin\"}",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("medications"));
    }
}
