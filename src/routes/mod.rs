mod admins;
mod agents;
mod articles;
mod favorites;
mod home;
mod installments;
mod messages;
mod projects;
mod properties;
mod taxonomy;
mod units;
mod users;

use std::collections::BTreeMap;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::openapi::path::{
    HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathsBuilder,
};
use utoipa::openapi::{OpenApiBuilder, Required, ResponseBuilder};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::resource::{handlers, Resource};
use crate::state::AppState;

pub use admins::create_admin;

#[derive(OpenApi)]
#[openapi(
    paths(home::root),
    tags(
        (name = "General", description = "General API information"),
    ),
    info(
        title = "Realty API",
        version = "0.1.0",
        description = "Real-estate listings backend: projects, properties, units, agents and the content around them",
    )
)]
struct ApiDoc;

#[derive(Clone, Copy, Debug)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

impl Verb {
    fn method_router<H, T>(self, handler: H) -> MethodRouter<AppState>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        match self {
            Verb::Get => get(handler),
            Verb::Post => post(handler),
            Verb::Patch => patch(handler),
            Verb::Delete => delete(handler),
        }
    }
}

/// Route table. Every route added here is also written into the OpenAPI document.
pub struct Api {
    router: Router<AppState>,
    paths: BTreeMap<String, PathItem>,
}

impl Api {
    fn new() -> Self {
        Self {
            router: Router::new(),
            paths: BTreeMap::new(),
        }
    }

    pub fn route<H, T>(mut self, verb: Verb, path: &str, tag: &str, summary: String, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.router = self.router.route(path, verb.method_router(handler));
        self.document(verb, path, tag, summary);
        self
    }

    fn document(&mut self, verb: Verb, path: &str, tag: &str, summary: String) {
        let mut operation = OperationBuilder::new()
            .tag(tag)
            .summary(Some(summary))
            .response("200", ResponseBuilder::new().description("Success").build())
            .response("400", ResponseBuilder::new().description("Invalid input").build())
            .response("404", ResponseBuilder::new().description("Not found").build());
        if matches!(verb, Verb::Post | Verb::Patch) {
            operation = operation
                .response("201", ResponseBuilder::new().description("Created").build())
                .response("409", ResponseBuilder::new().description("Duplicate").build());
        }
        for name in path_params(path) {
            operation = operation.parameter(
                ParameterBuilder::new()
                    .name(name)
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .build(),
            );
        }
        let operation = operation.build();

        match self.paths.get_mut(path) {
            None => {
                let method = match verb {
                    Verb::Get => HttpMethod::Get,
                    Verb::Post => HttpMethod::Post,
                    Verb::Patch => HttpMethod::Patch,
                    Verb::Delete => HttpMethod::Delete,
                };
                self.paths.insert(path.to_string(), PathItem::new(method, operation));
            }
            Some(item) => match verb {
                Verb::Get => item.get = Some(operation),
                Verb::Post => item.post = Some(operation),
                Verb::Patch => item.patch = Some(operation),
                Verb::Delete => item.delete = Some(operation),
            },
        }
    }

    /// List, search, show, create and delete under `base`; `PATCH` too when `updatable`.
    pub fn crud<R: Resource>(self, base: &str, updatable: bool) -> Self {
        let item = format!("{base}/{{id}}");
        let api = self
            .route(Verb::Get, base, R::PLURAL, format!("List {}", R::PLURAL), handlers::list::<R>)
            .route(Verb::Post, base, R::PLURAL, format!("Create a {}", R::NAME), handlers::create::<R>)
            .route(
                Verb::Get,
                &format!("{base}/search"),
                R::PLURAL,
                format!("Search {}", R::PLURAL),
                handlers::search::<R>,
            )
            .route(Verb::Get, &item, R::PLURAL, format!("Get a {}", R::NAME), handlers::show::<R>)
            .route(Verb::Delete, &item, R::PLURAL, format!("Delete a {}", R::NAME), handlers::destroy::<R>);
        if updatable {
            api.route(Verb::Patch, &item, R::PLURAL, format!("Update a {}", R::NAME), handlers::update::<R>)
        } else {
            api
        }
    }

    /// `DELETE base` with `{ "ids": [...] }`.
    pub fn bulk_delete<R: Resource>(self, base: &str) -> Self {
        self.route(
            Verb::Delete,
            base,
            R::PLURAL,
            format!("Delete several {}", R::PLURAL),
            handlers::destroy_many::<R>,
        )
    }

    /// Listing and search below a parent record, e.g. `/api/properties/{id}/sale-units`.
    pub fn nested<R: Resource>(self, path: &str) -> Self {
        self.route(
            Verb::Get,
            path,
            R::PLURAL,
            format!("List {} of a parent record", R::PLURAL),
            handlers::list_nested::<R>,
        )
        .route(
            Verb::Get,
            &format!("{path}/search"),
            R::PLURAL,
            format!("Search {} of a parent record", R::PLURAL),
            handlers::search_nested::<R>,
        )
    }

    fn finish(self) -> (Router<AppState>, utoipa::openapi::OpenApi) {
        let paths = self
            .paths
            .into_iter()
            .fold(PathsBuilder::new(), |paths, (path, item)| paths.path(path, item));
        (self.router, OpenApiBuilder::new().paths(paths).build())
    }
}

fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(str::to_string)
        .collect()
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "404 Not Found" })))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_routes(state: AppState) -> Router {
    let api = Api::new();
    let api = taxonomy::routes(api);
    let api = agents::routes(api);
    let api = projects::routes(api);
    let api = installments::routes(api);
    let api = properties::routes(api);
    let api = units::routes(api);
    let api = articles::routes(api);
    let api = users::routes(api);
    let api = admins::routes(api);
    let api = messages::routes(api);
    let api = favorites::routes(api);
    let (api_router, generated) = api.finish();

    let mut openapi = ApiDoc::openapi();
    openapi.merge(generated);

    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", openapi)
        .into();

    let uploads = ServeDir::new(state.media.root());
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    let cors = cors_layer(&state.config.cors_origins);

    let app_routes = Router::new()
        .route("/", get(home::root))
        .merge(api_router)
        .nest_service("/uploads", uploads)
        .fallback(not_found)
        .layer(body_limit)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
