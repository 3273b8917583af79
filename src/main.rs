use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use obs_core::{
    BloodPressure, CoreConfig, HistoryRecord, IdentityService, ObsError, ReadingAlerts,
    ReadingStore, VitalReading, VitalsAssessor,
};
use obs_types::{DateOfBirth, PatientId, PatientName};

/// Application state shared across REST API handlers
///
/// Identity allocation is a read-then-append sequence, so the serving layer
/// holds one write lock across resolve + append. The core itself provides no
/// locking.
#[derive(Clone)]
struct AppState {
    assessor: Arc<VitalsAssessor>,
    identity: Arc<IdentityService>,
    store: Arc<ReadingStore>,
    write_lock: Arc<Mutex<()>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, add_vitals, patient_vitals, patient_trends),
    components(schemas(
        HealthRes,
        BloodPressureInput,
        VitalsInput,
        AddVitalsRes,
        TrendsRes
    ))
)]
struct ApiDoc;

/// Main entry point for the OBS vitals tracking service
///
/// Starts the REST server with Swagger documentation at `/swagger-ui`.
///
/// # Environment Variables
/// - `OBS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OBS_DATA_DIR`: Directory for the mapping and vitals files (default: "obs_data")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("obs=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = obs_core::data_dir_from_env_value(std::env::var("OBS_DATA_DIR").ok());
    let rest_addr = std::env::var("OBS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting OBS REST on {}", rest_addr);
    tracing::info!("++ Data directory: {}", data_dir.display());

    let cfg = Arc::new(CoreConfig::new(data_dir));

    let app = Router::new()
        .route("/health", get(health))
        .route("/vitals", post(add_vitals))
        .route("/patients/:id/vitals", get(patient_vitals))
        .route("/patients/:id/trends", get(patient_trends))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            assessor: Arc::new(VitalsAssessor::news2()),
            identity: Arc::new(IdentityService::new(cfg.clone())),
            store: Arc::new(ReadingStore::new(cfg)),
            write_lock: Arc::new(Mutex::new(())),
        });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

/// A paired blood-pressure input in mmHg
#[derive(Deserialize, ToSchema)]
struct BloodPressureInput {
    systolic: u16,
    diastolic: u16,
}

/// A complete vitals submission, keyed the way clinicians name the vitals
#[derive(Deserialize, ToSchema)]
struct VitalsInput {
    #[serde(rename = "Blood pressure")]
    blood_pressure: BloodPressureInput,
    #[serde(rename = "Heart rate")]
    heart_rate: u16,
    #[serde(rename = "Respiratory rate")]
    respiratory_rate: u16,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Oxygen saturations")]
    oxygen_saturations: u8,
    #[serde(rename = "Level of consciousness (fully awake and responsive?)")]
    consciousness: String,
}

impl TryFrom<VitalsInput> for VitalReading {
    type Error = ObsError;

    fn try_from(input: VitalsInput) -> Result<Self, Self::Error> {
        VitalReading::new(
            BloodPressure {
                systolic: input.blood_pressure.systolic,
                diastolic: input.blood_pressure.diastolic,
            },
            input.heart_rate,
            input.respiratory_rate,
            input.temperature,
            input.oxygen_saturations,
            input.consciousness.parse()?,
        )
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct PatientQuery {
    /// Patient full name
    patient_name: String,
    /// Date of birth (dd/mm/yy)
    dob: String,
}

#[derive(Serialize, ToSchema)]
struct AddVitalsRes {
    patient_id: String,
    total_news2_score: u16,
    #[schema(value_type = Object)]
    alerts: ReadingAlerts,
}

/// Per-column numeric series for trend consumers; unknown cells stay null
#[derive(Serialize, ToSchema)]
struct TrendsRes {
    timestamps: Vec<String>,
    #[schema(value_type = Object)]
    series: BTreeMap<String, Vec<Option<f64>>>,
}

/// Maps a core error onto an HTTP status: validation errors are the client's
/// to fix, everything else is logged and reported generically.
fn error_response(e: ObsError) -> (StatusCode, String) {
    if e.is_validation() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("request failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        )
    }
}

fn parse_patient_id(id: &str) -> Result<PatientId, (StatusCode, String)> {
    id.parse()
        .map_err(|e: obs_types::PatientIdError| (StatusCode::BAD_REQUEST, e.to_string()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/vitals",
    params(PatientQuery),
    request_body = VitalsInput,
    responses(
        (status = 200, description = "Reading recorded with per-vital alerts and total score", body = AddVitalsRes),
        (status = 400, description = "Invalid name, date of birth, or vital value"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a vitals reading
///
/// Resolves the patient identity from the name and date of birth (allocating
/// a new id on first contact), classifies each vital against the clinical
/// threshold bands, aggregates the NEWS2-style total, and appends the
/// flattened reading to the store.
async fn add_vitals(
    State(state): State<AppState>,
    Query(params): Query<PatientQuery>,
    Json(input): Json<VitalsInput>,
) -> Result<Json<AddVitalsRes>, (StatusCode, String)> {
    let name = PatientName::new(&params.patient_name)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let dob =
        DateOfBirth::parse(&params.dob).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let reading = VitalReading::try_from(input).map_err(error_response)?;

    let assessment = state.assessor.assess(&reading).map_err(error_response)?;

    let _write = state.write_lock.lock().await;
    let patient_id = state.identity.resolve(&name, &dob).map_err(error_response)?;
    state
        .store
        .append(patient_id, assessment.total_score, &reading)
        .map_err(error_response)?;
    drop(_write);

    Ok(Json(AddVitalsRes {
        patient_id: patient_id.to_string(),
        total_news2_score: assessment.total_score,
        alerts: assessment.alerts,
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/vitals",
    params(
        ("id" = String, Path, description = "Patient identifier")
    ),
    responses(
        (status = 200, description = "All stored readings for the patient, in append order", body = Object),
        (status = 400, description = "Invalid patient id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Retrieve all saved readings for a patient
///
/// Returns an empty list for a patient with no stored readings.
async fn patient_vitals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryRecord>>, (StatusCode, String)> {
    let patient_id = parse_patient_id(&id)?;
    let records = state.store.query(patient_id).map_err(error_response)?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/trends",
    params(
        ("id" = String, Path, description = "Patient identifier")
    ),
    responses(
        (status = 200, description = "Timestamped numeric series for trend display", body = TrendsRes),
        (status = 400, description = "Invalid patient id or not enough data"),
        (status = 500, description = "Internal server error")
    )
)]
/// Return the patient's vitals history as numeric series
///
/// Requires at least two readings; rendering is the consumer's concern.
async fn patient_trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrendsRes>, (StatusCode, String)> {
    let patient_id = parse_patient_id(&id)?;
    let records = state.store.query(patient_id).map_err(error_response)?;

    if records.len() < 2 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Not enough data to plot trends (need at least 2 readings).".to_string(),
        ));
    }

    let mut series: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    let timestamps = records.iter().map(|r| r.timestamp.clone()).collect();
    series.insert(
        "news2_score".to_string(),
        records.iter().map(|r| r.news2_score.map(f64::from)).collect(),
    );
    series.insert(
        "bp_systolic".to_string(),
        records.iter().map(|r| r.bp_systolic.map(f64::from)).collect(),
    );
    series.insert(
        "bp_diastolic".to_string(),
        records.iter().map(|r| r.bp_diastolic.map(f64::from)).collect(),
    );
    series.insert(
        "heart_rate".to_string(),
        records.iter().map(|r| r.heart_rate.map(f64::from)).collect(),
    );
    series.insert(
        "respiratory_rate".to_string(),
        records
            .iter()
            .map(|r| r.respiratory_rate.map(f64::from))
            .collect(),
    );
    series.insert(
        "temperature".to_string(),
        records.iter().map(|r| r.temperature).collect(),
    );
    series.insert(
        "oxygen_sats".to_string(),
        records.iter().map(|r| r.oxygen_sats.map(f64::from)).collect(),
    );

    Ok(Json(TrendsRes { timestamps, series }))
}
