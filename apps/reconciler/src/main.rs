//! Elevate eligibility reconciler.
//!
//! Drives one lifecycle operation for a group or user eligibility and prints
//! the resulting state document to stdout.

#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use elevate_application::{EligibilityResource, PlannedChange, ReadOutcome};
use elevate_core::{AppError, AppResult};
use elevate_domain::{
    EligibilityModel, GroupPrincipal, PrincipalAdapter, UserPrincipal, model_from_document,
    model_to_document,
};
use elevate_infrastructure::{HttpEligibilityClient, InMemoryEligibilityClient};
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const USAGE: &str = "usage: elevate-reconciler <group|user> <operation>\n\
     operations:\n  \
     validate <config.json>\n  \
     plan <config.json> [state.json]\n  \
     apply <config.json> [state.json]\n  \
     read <state.json>\n  \
     destroy <state.json>\n  \
     import <id>";

const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Principal {
    Group,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Validate {
        config: PathBuf,
    },
    Plan {
        config: PathBuf,
        state: Option<PathBuf>,
    },
    Apply {
        config: PathBuf,
        state: Option<PathBuf>,
    },
    Read {
        state: PathBuf,
    },
    Destroy {
        state: PathBuf,
    },
    Import {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    principal: Principal,
    operation: Operation,
}

#[derive(Debug, Clone)]
struct ReconcilerConfig {
    api_url: Url,
    api_token: String,
    http_timeout_secs: u64,
    http_max_attempts: u8,
    modified_by: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let invocation = Invocation::parse(env::args().skip(1))?;
    match invocation.principal {
        Principal::Group => run::<GroupPrincipal>(invocation.operation).await,
        Principal::User => run::<UserPrincipal>(invocation.operation).await,
    }
}

async fn run<P: PrincipalAdapter>(operation: Operation) -> AppResult<()> {
    match operation {
        Operation::Validate { config } => {
            let config = load_model::<P>(config.as_path())?;
            config.validate()?;
            info!(resource = P::TYPE_NAME, "configuration is valid");
            Ok(())
        }
        Operation::Plan { config, state } => {
            let resource = offline::<P>();
            let config = load_model::<P>(config.as_path())?;
            let state = load_optional_model::<P>(state.as_deref())?;
            resource.validate_config(&config)?;

            let planned = resource.plan(state.as_ref(), &config);
            let (action, attributes) = match &planned {
                PlannedChange::Create(_) => ("create", Vec::new()),
                PlannedChange::Update(_) => ("update", Vec::new()),
                PlannedChange::Replace { attributes, .. } => ("replace", attributes.clone()),
                PlannedChange::NoOp(_) => ("no-op", Vec::new()),
            };

            print_json(&json!({
                "action": action,
                "replace_attributes": attributes,
                "plan": model_to_document::<P>(planned.plan())?,
            }))
        }
        Operation::Apply { config, state } => {
            let resource = connect::<P>()?;
            let config = load_model::<P>(config.as_path())?;
            let state = load_optional_model::<P>(state.as_deref())?;

            let applied = resource.apply(state.as_ref(), &config).await?;
            print_json(&model_to_document::<P>(&applied)?)
        }
        Operation::Read { state } => {
            let resource = connect::<P>()?;
            let state = load_model::<P>(state.as_path())?;

            match resource.read(&state).await? {
                ReadOutcome::Present(refreshed) => {
                    print_json(&model_to_document::<P>(&refreshed)?)
                }
                ReadOutcome::Removed => {
                    warn!(
                        resource = P::TYPE_NAME,
                        id = state.id.as_deref().unwrap_or_default(),
                        "eligibility no longer exists, state should be dropped"
                    );
                    print_json(&Value::Null)
                }
            }
        }
        Operation::Destroy { state } => {
            let resource = connect::<P>()?;
            let state = load_model::<P>(state.as_path())?;

            resource.delete(&state).await
        }
        Operation::Import { id } => {
            let resource = connect::<P>()?;

            match resource.import_state(id.as_str()).await? {
                ReadOutcome::Present(imported) => {
                    print_json(&model_to_document::<P>(&imported)?)
                }
                ReadOutcome::Removed => Err(AppError::NotFound(format!(
                    "{} '{id}' does not exist",
                    P::LABEL
                ))),
            }
        }
    }
}

fn connect<P: PrincipalAdapter>() -> AppResult<EligibilityResource<P>> {
    let config = ReconcilerConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    info!(
        resource = P::TYPE_NAME,
        api_url = %config.api_url,
        http_timeout_secs = config.http_timeout_secs,
        http_max_attempts = config.http_max_attempts,
        "elevate-reconciler connected"
    );

    let client = HttpEligibilityClient::new(
        http_client,
        config.api_url,
        config.api_token,
        config.http_max_attempts,
        RETRY_BACKOFF_MS,
    );

    Ok(EligibilityResource::new(Arc::new(client)).with_default_modified_by(config.modified_by))
}

/// Builds a resource for local planning; it never reaches the remote service.
fn offline<P: PrincipalAdapter>() -> EligibilityResource<P> {
    EligibilityResource::new(Arc::new(InMemoryEligibilityClient::new()))
        .with_default_modified_by(modified_by_env())
}

fn load_model<P: PrincipalAdapter>(path: &Path) -> AppResult<EligibilityModel> {
    let contents = fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })?;
    let document = serde_json::from_str::<Value>(contents.as_str()).map_err(|error| {
        AppError::Validation(format!("'{}' is not valid JSON: {error}", path.display()))
    })?;

    model_from_document::<P>(document)
}

fn load_optional_model<P: PrincipalAdapter>(
    path: Option<&Path>,
) -> AppResult<Option<EligibilityModel>> {
    path.map(load_model::<P>).transpose()
}

fn print_json(value: &Value) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}

impl Invocation {
    fn parse(args: impl Iterator<Item = String>) -> AppResult<Self> {
        let args = args.collect::<Vec<_>>();
        let [kind, operation, rest @ ..] = args.as_slice() else {
            return Err(usage_error("missing principal kind or operation"));
        };

        let principal = match kind.as_str() {
            "group" => Principal::Group,
            "user" => Principal::User,
            other => return Err(usage_error(format!("unknown principal kind '{other}'"))),
        };

        let operation = match (operation.as_str(), rest) {
            ("validate", [config]) => Operation::Validate {
                config: PathBuf::from(config),
            },
            ("plan", [config]) => Operation::Plan {
                config: PathBuf::from(config),
                state: None,
            },
            ("plan", [config, state]) => Operation::Plan {
                config: PathBuf::from(config),
                state: Some(PathBuf::from(state)),
            },
            ("apply", [config]) => Operation::Apply {
                config: PathBuf::from(config),
                state: None,
            },
            ("apply", [config, state]) => Operation::Apply {
                config: PathBuf::from(config),
                state: Some(PathBuf::from(state)),
            },
            ("read", [state]) => Operation::Read {
                state: PathBuf::from(state),
            },
            ("destroy", [state]) => Operation::Destroy {
                state: PathBuf::from(state),
            },
            ("import", [id]) => Operation::Import { id: id.clone() },
            (other, _) => {
                return Err(usage_error(format!(
                    "unknown operation or wrong arguments for '{other}'"
                )));
            }
        };

        Ok(Self {
            principal,
            operation,
        })
    }
}

impl ReconcilerConfig {
    fn load() -> AppResult<Self> {
        let raw_api_url = required_env("ELEVATE_API_URL")?;
        let api_url = Url::parse(raw_api_url.trim().trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid ELEVATE_API_URL value '{raw_api_url}': {error}"))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "ELEVATE_API_URL '{raw_api_url}' must be an http(s) base URL"
            )));
        }

        let api_token = required_env("ELEVATE_API_TOKEN")?.trim().to_owned();
        if api_token.is_empty() {
            return Err(AppError::Validation(
                "ELEVATE_API_TOKEN must not be blank".to_owned(),
            ));
        }

        let http_timeout_secs = parse_env_u64("ELEVATE_HTTP_TIMEOUT_SECS", 30)?;
        let http_max_attempts = parse_env_u8("ELEVATE_HTTP_MAX_ATTEMPTS", 3)?;
        let modified_by = modified_by_env();

        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "ELEVATE_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        if http_max_attempts == 0 {
            return Err(AppError::Validation(
                "ELEVATE_HTTP_MAX_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_url,
            api_token,
            http_timeout_secs,
            http_max_attempts,
            modified_by,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn usage_error(reason: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("{reason}\n{USAGE}"))
}

fn modified_by_env() -> Option<String> {
    env::var("ELEVATE_MODIFIED_BY")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u8(name: &str, default: u8) -> AppResult<u8> {
    match env::var(name) {
        Ok(value) => value.parse::<u8>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
