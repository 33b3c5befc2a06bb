use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        NoChangesResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{CreateUser, UpdateUser, UserFilter, UserMessageResponse, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, get_user, update_user, delete_user),
    components(
        schemas(UserResponse, UserMessageResponse, CreateUser, UpdateUser, UserFilter),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            ConflictResponse,
            NoChangesResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints under `/users`
///
/// The collection answers on both `/users` and `/users/`.
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);
    let collection = get(list_users::<R>).post(create_user::<R>);

    Router::new()
        .route("/users", collection.clone())
        .route("/users/", collection)
        .route(
            "/users/{user_id}",
            get(get_user::<R>)
                .put(update_user::<R>)
                .delete(delete_user::<R>),
        )
        .with_state(shared_service)
}

/// List users with pagination and optional filtering by active status
#[utoipa::path(
    get,
    path = "/users/",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let users = service.list_users(filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users/",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = UserMessageResponse),
        (status = 400, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse::new("User created successfully", user)),
    ))
}

/// Get a specific user by user_id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "Public user handle")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(user_id): Path<String>,
) -> UserResult<Json<UserResponse>> {
    let user = service.get_user(&user_id).await?;
    Ok(Json(user.into()))
}

/// Update a user's information
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "Public user handle")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = UserMessageResponse),
        (status = 400, response = NoChangesResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(user_id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserMessageResponse>> {
    let user = service.update_user(&user_id, input).await?;
    Ok(Json(UserMessageResponse::new(
        "User updated successfully",
        user,
    )))
}

/// Deactivate a user (soft delete)
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "Users",
    params(
        ("user_id" = String, Path, description = "Public user handle")
    ),
    responses(
        (status = 204, description = "User deactivated successfully"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(user_id): Path<String>,
) -> UserResult<impl IntoResponse> {
    service.deactivate_user(&user_id).await?;
    tracing::info!(user_id = %user_id, "User deactivated successfully");
    Ok(StatusCode::NO_CONTENT)
}
