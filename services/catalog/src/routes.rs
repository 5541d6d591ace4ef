//! Catalog service routes

use axum::{
    Extension, Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    credentials,
    error::{ApiError, ApiResult, RepositoryError},
    gate::{Principal, Requirement},
    middleware::{require_admin, require_login, resolve_principal},
    models::{BookForm, NewBook, SignInForm, book::demo_books},
    session::SESSION_COOKIE,
    state::AppState,
    validation,
    views::View,
};

const TITLE_IN_USE: &str = "Title already in use.";
const INCORRECT_CREDENTIALS: &str = "Incorrect Email and/or Password.";
const ACCOUNT_DISABLED: &str = "Your account has been disabled.";
const EMAIL_NOT_CONFIRMED: &str = "Your email address has not yet been confirmed.";

/// Create the router for the catalog service
pub fn create_router(state: AppState) -> Router {
    let member_routes = Router::new()
        .route("/all_books", get(all_books))
        .route("/edit/:id", get(edit_form).post(edit_book))
        .route("/add_book", get(add_book_form).post(add_book))
        .route("/delete/:id", post(delete_book))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    let admin_routes = Router::new()
        .route("/admin", get(admin_page))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    let mut maintenance_routes = Router::new()
        .route("/seedDB", get(seed_db))
        .route("/eraseDB", get(erase_db));
    if !state.config.open_maintenance_routes {
        maintenance_routes = maintenance_routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));
    }

    Router::new()
        .route("/", get(home_page))
        .route("/contact", get(contact_page))
        .route("/health", get(health_check))
        .route("/user/sign-in", get(sign_in_form).post(sign_in))
        .route("/user/sign-out", get(sign_out).post(sign_out))
        .merge(member_routes)
        .merge(admin_routes)
        .merge(maintenance_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_principal,
        ))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let database = common::database::health_check(&state.db_pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "service": "catalog",
        "database": database,
    })))
}

/// Home page, open to anyone
pub async fn home_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<View> {
    home_view(&state, &principal, None).await
}

/// Admin page, Admin role only
pub async fn admin_page(State(state): State<AppState>) -> View {
    View::render("admin", json!({ "app_name": state.config.app_name }))
}

/// Contact page, open to anyone
pub async fn contact_page(State(state): State<AppState>) -> View {
    View::render("contact", json!({ "app_name": state.config.app_name }))
}

/// Every book, newest first
pub async fn all_books(State(state): State<AppState>) -> ApiResult<View> {
    let books = state.book_repository.list().await?;
    Ok(View::render("all_books", json!({ "books": books })))
}

/// Edit page pre-populated from the stored record
pub async fn edit_form(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<View> {
    let book = state.book_repository.find_by_id(id).await?;
    Ok(edit_view(id, BookForm::from(&book), ""))
}

/// Apply an edit; conflicts are reported inline on the edit page
pub async fn edit_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<BookForm>,
) -> ApiResult<View> {
    let form = form.normalized();
    if let Err(message) = validation::validate_book(&form) {
        return Ok(edit_view(id, form, &message));
    }

    match state
        .book_repository
        .update(id, &NewBook::from(form.clone()))
        .await
    {
        Ok(book) => {
            let message = format!("{} has been updated!", book.title);
            Ok(edit_view(id, BookForm::from(&book), &message))
        }
        Err(RepositoryError::DuplicateTitle(title)) => {
            info!("Rejected edit of book {}: title {} in use", id, title);
            Ok(edit_view(id, form, TITLE_IN_USE))
        }
        Err(e) => Err(e.into()),
    }
}

/// Blank add-book page
pub async fn add_book_form() -> View {
    add_book_view(BookForm::default(), "")
}

/// Create a book; conflicts are reported inline on the add-book page
pub async fn add_book(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<BookForm>,
) -> ApiResult<View> {
    let form = form.normalized();
    if let Err(message) = validation::validate_book(&form) {
        return Ok(add_book_view(form, &message));
    }

    match state
        .book_repository
        .create(&NewBook::from(form.clone()))
        .await
    {
        Ok(book) => {
            let message = format!("{} has been added!", book.title);
            home_view(&state, &principal, Some(message)).await
        }
        Err(RepositoryError::DuplicateTitle(_)) => Ok(add_book_view(form, TITLE_IN_USE)),
        Err(e) => Err(e.into()),
    }
}

/// Delete one book
pub async fn delete_book(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<View> {
    state.book_repository.delete(id).await?;
    let books = state.book_repository.list().await?;

    Ok(View::render(
        "all_books",
        json!({
            "books": books,
            "message": format!("Book {} has been deleted!", id),
        }),
    ))
}

/// Insert the demo books
pub async fn seed_db(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<View> {
    state.book_repository.seed(&demo_books()).await?;
    home_view(&state, &principal, Some("DB Seeded!".to_string())).await
}

/// Drop the books table
pub async fn erase_db(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<View> {
    state.book_repository.delete_all().await?;
    home_view(&state, &principal, Some("DB Erased!".to_string())).await
}

/// Sign-in page
pub async fn sign_in_form() -> View {
    View::render("sign_in", json!({ "email": "", "error": "" }))
}

/// Check credentials and open a session
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> ApiResult<Response> {
    let email = form.email.trim();
    info!("Sign-in attempt for user: {}", email);

    if let Err(message) = validation::validate_email(email) {
        return Ok(sign_in_failed(email, &message));
    }

    let user = state
        .user_repository
        .find_by_email(email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?;

    let Some(user) = user.filter(|u| credentials::verify_password(&form.password, &u.password))
    else {
        warn!("Failed sign-in for user: {}", email);
        return Ok(sign_in_failed(email, INCORRECT_CREDENTIALS));
    };

    if !user.is_active {
        return Ok(sign_in_failed(email, ACCOUNT_DISABLED));
    }
    if user.email_confirmed_at.is_none() {
        return Ok(sign_in_failed(email, EMAIL_NOT_CONFIRMED));
    }

    let token = state.sessions.issue(&user).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        ApiError::InternalServerError
    })?;

    let principal = state.sessions.resolve(&token).await;
    let mut view = home_view(
        &state,
        &principal,
        Some("You have signed in successfully.".to_string()),
    )
    .await?;
    view.context["token"] = json!(token);

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), view).into_response())
}

/// Revoke the current session and clear the cookie
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, View)> {
    if let Some(user) = principal.user() {
        state.sessions.revoke(user.session_id).await.map_err(|e| {
            error!("Failed to revoke session: {}", e);
            ApiError::InternalServerError
        })?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let view = View::render(
        "sign_in",
        json!({
            "email": "",
            "error": "",
            "message": "You have signed out successfully.",
        }),
    );

    Ok((jar, view))
}

async fn home_view(
    state: &AppState,
    principal: &Principal,
    message: Option<String>,
) -> ApiResult<View> {
    let is_admin = state
        .gate
        .authorize(principal, &Requirement::admin())
        .await?
        .is_allowed();

    Ok(View::render(
        "index",
        json!({
            "app_name": state.config.app_name,
            "user_email": principal.user().map(|u| u.email.as_str()),
            "is_admin": is_admin,
            "message": message,
        }),
    ))
}

fn edit_view(id: i64, form: BookForm, validation_error: &str) -> View {
    View::render(
        "edit",
        json!({
            "book_id": id,
            "form": form,
            "validation_error": validation_error,
        }),
    )
}

fn add_book_view(form: BookForm, validation_error: &str) -> View {
    View::render(
        "add_book",
        json!({
            "form": form,
            "book_title": form.title,
            "validation_error": validation_error,
        }),
    )
}

fn sign_in_failed(email: &str, error: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        View::render("sign_in", json!({ "email": email, "error": error })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{ADMIN_EMAIL, DEMO_PASSWORD, MEMBER_EMAIL};
    use crate::test_support::{create_user, test_state};
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Reply {
        status: StatusCode,
        set_cookie: Option<String>,
        body: Value,
    }

    fn encode_form(fields: &[(&str, &str)]) -> String {
        fields
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn percent_encode(raw: &str) -> String {
        raw.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{:02X}", b),
            })
            .collect()
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        form: Option<&[(&str, &str)]>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let body = match form {
            Some(fields) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                );
                Body::from(encode_form(fields))
            }
            None => Body::empty(),
        };

        let resp = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply {
            status,
            set_cookie,
            body,
        }
    }

    async fn setup(vars: &[(&str, &str)]) -> (Router, AppState) {
        let state = test_state(vars).await;
        (create_router(state.clone()), state)
    }

    async fn sign_in_as(router: &Router, email: &str) -> String {
        let reply = call(
            router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", email), ("password", DEMO_PASSWORD)]),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.body["context"]["token"].as_str().unwrap().to_string()
    }

    async fn add(router: &Router, token: &str, title: &str) -> Reply {
        call(
            router,
            "POST",
            "/add_book",
            Some(token),
            Some(&[
                ("author", "Mary Shelley"),
                ("title", title),
                ("description", "..."),
            ]),
        )
        .await
    }

    fn titles(reply: &Reply) -> Vec<String> {
        reply.body["context"]["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn public_pages_are_open() {
        let (router, _) = setup(&[]).await;

        let home = call(&router, "GET", "/", None, None).await;
        assert_eq!(home.status, StatusCode::OK);
        assert_eq!(home.body["view"], "index");
        assert_eq!(home.body["context"]["is_admin"], false);
        assert!(home.body["context"]["user_email"].is_null());

        let contact = call(&router, "GET", "/contact", None, None).await;
        assert_eq!(contact.status, StatusCode::OK);
        assert_eq!(contact.body["view"], "contact");

        let health = call(&router, "GET", "/health", None, None).await;
        assert_eq!(health.status, StatusCode::OK);
        assert_eq!(health.body["database"], true);
    }

    #[tokio::test]
    async fn member_routes_require_sign_in() {
        let (router, _) = setup(&[]).await;

        for (method, uri) in [
            ("GET", "/all_books"),
            ("GET", "/add_book"),
            ("GET", "/edit/1"),
            ("POST", "/delete/1"),
        ] {
            let reply = call(&router, method, uri, None, None).await;
            assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }

        // Rejected before the handler runs, so nothing is written
        let reply = add(&router, "not-a-token", "Frankenstein").await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        let token = sign_in_as(&router, MEMBER_EMAIL).await;
        let reply = call(&router, "GET", "/all_books", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(titles(&reply).is_empty());
    }

    #[tokio::test]
    async fn admin_page_requires_admin_role() {
        let (router, _) = setup(&[]).await;

        let anonymous = call(&router, "GET", "/admin", None, None).await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let member = sign_in_as(&router, MEMBER_EMAIL).await;
        let reply = call(&router, "GET", "/admin", Some(&member), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let admin = sign_in_as(&router, ADMIN_EMAIL).await;
        let reply = call(&router, "GET", "/admin", Some(&admin), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["view"], "admin");

        let home = call(&router, "GET", "/", Some(&admin), None).await;
        assert_eq!(home.body["context"]["is_admin"], true);
        assert_eq!(home.body["context"]["user_email"], ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn role_changes_apply_to_the_next_request() {
        let (router, state) = setup(&[]).await;
        let member = sign_in_as(&router, MEMBER_EMAIL).await;
        let user = state
            .user_repository
            .find_by_email(MEMBER_EMAIL)
            .await
            .unwrap()
            .unwrap();

        state.role_repository.assign(user.id, "Admin").await.unwrap();
        let reply = call(&router, "GET", "/admin", Some(&member), None).await;
        assert_eq!(reply.status, StatusCode::OK);

        state
            .role_repository
            .unassign(user.id, "Admin")
            .await
            .unwrap();
        let reply = call(&router, "GET", "/admin", Some(&member), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn add_book_rejects_duplicate_title() {
        let (router, _) = setup(&[]).await;
        let token = sign_in_as(&router, MEMBER_EMAIL).await;

        let form = call(&router, "GET", "/add_book", Some(&token), None).await;
        assert_eq!(form.body["view"], "add_book");
        assert_eq!(form.body["context"]["form"]["title"], "");

        let first = add(&router, &token, "Frankenstein").await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["view"], "index");
        assert_eq!(
            first.body["context"]["message"],
            "Frankenstein has been added!"
        );

        let second = add(&router, &token, "Frankenstein").await;
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(second.body["view"], "add_book");
        assert_eq!(second.body["context"]["validation_error"], TITLE_IN_USE);

        let list = call(&router, "GET", "/all_books", Some(&token), None).await;
        assert_eq!(titles(&list), vec!["Frankenstein".to_string()]);
    }

    #[tokio::test]
    async fn add_book_validates_fields() {
        let (router, _) = setup(&[]).await;
        let token = sign_in_as(&router, MEMBER_EMAIL).await;

        let reply = add(&router, &token, "   ").await;
        assert_eq!(reply.body["view"], "add_book");
        assert_eq!(reply.body["context"]["validation_error"], "Title is required");

        let list = call(&router, "GET", "/all_books", Some(&token), None).await;
        assert!(titles(&list).is_empty());
    }

    #[tokio::test]
    async fn edit_flow() {
        let (router, state) = setup(&[]).await;
        let token = sign_in_as(&router, MEMBER_EMAIL).await;
        let first = state
            .book_repository
            .create(&NewBook::new("Mary Shelley", "Frankenstein", "Gothic"))
            .await
            .unwrap();
        let second = state
            .book_repository
            .create(&NewBook::new("Robert Putnam", "Bowling Alone", "Sociology"))
            .await
            .unwrap();

        // GET pre-populates from the record and changes nothing
        let uri = format!("/edit/{}", first.id);
        let form = call(&router, "GET", &uri, Some(&token), None).await;
        assert_eq!(form.status, StatusCode::OK);
        assert_eq!(form.body["view"], "edit");
        assert_eq!(form.body["context"]["form"]["author"], "Mary Shelley");
        assert_eq!(form.body["context"]["form"]["title"], "Frankenstein");
        assert_eq!(form.body["context"]["form"]["description"], "Gothic");
        assert_eq!(
            state.book_repository.find_by_id(first.id).await.unwrap(),
            first
        );

        // Keeping the same title is allowed
        let reply = call(
            &router,
            "POST",
            &uri,
            Some(&token),
            Some(&[
                ("author", "M. Shelley"),
                ("title", "Frankenstein"),
                ("description", "The Modern Prometheus"),
            ]),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.body["context"]["validation_error"],
            "Frankenstein has been updated!"
        );

        // Taking another book's title is not
        let reply = call(
            &router,
            "POST",
            &format!("/edit/{}", second.id),
            Some(&token),
            Some(&[
                ("author", "Robert Putnam"),
                ("title", "Frankenstein"),
                ("description", "Sociology"),
            ]),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["context"]["validation_error"], TITLE_IN_USE);
        assert_eq!(
            state.book_repository.find_by_id(second.id).await.unwrap(),
            second
        );

        let missing = call(&router, "GET", "/edit/999", Some(&token), None).await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let missing = call(
            &router,
            "POST",
            "/edit/999",
            Some(&token),
            Some(&[("author", ""), ("title", "Anything"), ("description", "")]),
        )
        .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_book_removes_one_record() {
        let (router, state) = setup(&[]).await;
        let token = sign_in_as(&router, MEMBER_EMAIL).await;
        let book = state
            .book_repository
            .create(&NewBook::new("Mary Shelley", "Frankenstein", ""))
            .await
            .unwrap();

        let uri = format!("/delete/{}", book.id);
        let reply = call(&router, "POST", &uri, Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(titles(&reply).is_empty());

        let again = call(&router, "POST", &uri, Some(&token), None).await;
        assert_eq!(again.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn maintenance_routes_require_admin_by_default() {
        let (router, _) = setup(&[]).await;

        let anonymous = call(&router, "GET", "/seedDB", None, None).await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let member = sign_in_as(&router, MEMBER_EMAIL).await;
        let reply = call(&router, "GET", "/eraseDB", Some(&member), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let admin = sign_in_as(&router, ADMIN_EMAIL).await;
        for _ in 0..2 {
            let reply = call(&router, "GET", "/seedDB", Some(&admin), None).await;
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body["context"]["message"], "DB Seeded!");
        }

        let list = call(&router, "GET", "/all_books", Some(&member), None).await;
        assert_eq!(
            titles(&list),
            vec![
                "Bowling Alone".to_string(),
                "The Protestant Work Ethic and the Spirit: Stallion of the Cimarron".to_string(),
                "The Turn of the Screw".to_string(),
                "Frankenstein".to_string(),
            ]
        );

        let reply = call(&router, "GET", "/eraseDB", Some(&admin), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["context"]["message"], "DB Erased!");

        let list = call(&router, "GET", "/all_books", Some(&member), None).await;
        assert_eq!(list.status, StatusCode::OK);
        assert!(titles(&list).is_empty());

        let reply = add(&router, &member, "Frankenstein").await;
        assert_eq!(reply.body["view"], "index");
        let list = call(&router, "GET", "/all_books", Some(&member), None).await;
        assert_eq!(titles(&list), vec!["Frankenstein".to_string()]);
    }

    #[tokio::test]
    async fn maintenance_routes_can_be_opened() {
        let (router, _) = setup(&[("CATALOG_OPEN_MAINTENANCE_ROUTES", "true")]).await;

        let reply = call(&router, "GET", "/seedDB", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["context"]["message"], "DB Seeded!");

        let reply = call(&router, "GET", "/eraseDB", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);

        // The admin page stays guarded
        let reply = call(&router, "GET", "/admin", None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let (router, state) = setup(&[]).await;

        let wrong_password = call(
            &router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", MEMBER_EMAIL), ("password", "password1")]),
        )
        .await;
        assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.body["view"], "sign_in");
        assert_eq!(
            wrong_password.body["context"]["error"],
            INCORRECT_CREDENTIALS
        );
        assert!(wrong_password.set_cookie.is_none());

        let unknown = call(
            &router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", "nobody@example.com"), ("password", DEMO_PASSWORD)]),
        )
        .await;
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.body["context"]["error"], INCORRECT_CREDENTIALS);

        create_user(&state.db_pool, "pending@example.com", false).await;
        let unconfirmed = call(
            &router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", "pending@example.com"), ("password", DEMO_PASSWORD)]),
        )
        .await;
        assert_eq!(unconfirmed.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unconfirmed.body["context"]["error"], EMAIL_NOT_CONFIRMED);

        let member = state
            .user_repository
            .find_by_email(MEMBER_EMAIL)
            .await
            .unwrap()
            .unwrap();
        state
            .user_repository
            .set_active(member.id, false)
            .await
            .unwrap();
        let disabled = call(
            &router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", MEMBER_EMAIL), ("password", DEMO_PASSWORD)]),
        )
        .await;
        assert_eq!(disabled.status, StatusCode::UNAUTHORIZED);
        assert_eq!(disabled.body["context"]["error"], ACCOUNT_DISABLED);
    }

    #[tokio::test]
    async fn sign_in_email_is_case_insensitive() {
        let (router, _) = setup(&[]).await;
        let token = sign_in_as(&router, "Admin@Example.COM").await;

        let reply = call(&router, "GET", "/admin", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn session_cookie_authenticates_until_sign_out() {
        let (router, _) = setup(&[]).await;

        let reply = call(
            &router,
            "POST",
            "/user/sign-in",
            None,
            Some(&[("email", MEMBER_EMAIL), ("password", DEMO_PASSWORD)]),
        )
        .await;
        let set_cookie = reply.set_cookie.expect("sign-in should set a cookie");
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let with_cookie = |method: &'static str, uri: &'static str| {
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap()
        };

        let resp = router
            .clone()
            .oneshot(with_cookie("GET", "/all_books"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router
            .clone()
            .oneshot(with_cookie("POST", "/user/sign-out"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router
            .clone()
            .oneshot(with_cookie("GET", "/all_books"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_out_revokes_bearer_token() {
        let (router, _) = setup(&[]).await;
        let token = sign_in_as(&router, MEMBER_EMAIL).await;

        let reply = call(&router, "GET", "/user/sign-out", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["view"], "sign_in");

        let reply = call(&router, "GET", "/all_books", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        // Signing out anonymously is harmless
        let reply = call(&router, "POST", "/user/sign-out", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
}
