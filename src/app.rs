// app.rs - application state and route table
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::{origin_middleware, rate_limit_middleware, RateLimiter};
use crate::services::{Collaborators, Services};

/// Everything a handler can reach. Cloned per request, so every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenCodec,
    pub services: Services,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, collaborators: Collaborators) -> Self {
        let services = Services::new(store, &config, collaborators);
        Self {
            tokens: TokenCodec::new(&config.session.jwt_secret),
            limiter: Arc::new(RateLimiter::new(config.rate_limit.per_second, config.rate_limit.burst)),
            config: Arc::new(config),
            services,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(session_routes())
        .merge(user_routes(state.config.server.max_upload_bytes))
        .merge(word_set_routes())
        // Outermost first: throttle, then the origin check
        .layer(from_fn_with_state(state.clone(), origin_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .route("/health", get(public::catalog::health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{account, catalog, verification};

    Router::new()
        // Accounts and sessions
        .route("/checkLogIn", get(account::check_log_in))
        .route("/accountPasswordRegister", post(account::account_password_register))
        .route("/OAuthRegister", post(account::oauth_register))
        .route("/accountPasswordLogIn", post(account::account_password_log_in))
        .route("/OAuthLogIn", post(account::oauth_log_in))
        .route("/logOut", post(account::log_out))
        .route("/getUserLink/:userID", get(account::get_user_link))
        // Verification codes and activation
        .route("/requestValidateCode", post(verification::request_validate_code))
        .route("/resetPassword", post(verification::reset_password))
        .route("/sendActivationEmail", post(verification::send_activation_email))
        .route("/activateEmail", post(verification::activate_email))
        // Read side
        .route("/getWordSet/:wordSetID", get(catalog::get_word_set))
        .route("/getWords/:wordSetID", get(catalog::get_words))
        .route("/getWordSetCard", get(catalog::get_word_set_card))
        .route("/getPreviewWords", get(catalog::get_preview_words))
        .route("/getWordSetsInLib/:userID", get(catalog::get_word_sets_in_lib))
        .route("/getNewWordSet", get(catalog::get_new_word_set))
        .route("/getPopularWordSet", get(catalog::get_popular_word_set))
        .route("/getFeedback", get(catalog::get_feedback))
}

/// Session-only gate: the path user must be the session user.
fn session_routes() -> Router<AppState> {
    use protected::user;

    Router::new()
        .route("/getMails/:userID", get(user::get_mails))
        .route("/getUnreadMailsCnt/:userID", get(user::get_unread_mails_cnt))
        .route("/getRecentVisit/:userID", get(user::get_recent_visit))
}

/// User-ownership gate: the body's acting user must be the session user.
fn user_routes(max_upload_bytes: usize) -> Router<AppState> {
    use protected::{user, word_set};

    Router::new()
        .route("/createWordSet", post(word_set::create_word_set))
        .route("/changeUserName", post(user::change_user_name))
        .route("/changeUserEmail", post(user::change_user_email))
        .route(
            "/changeUserImage",
            post(user::change_user_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/toggleLikeWordSet", post(word_set::toggle_like_word_set))
        .route("/forkWordSet", post(word_set::fork_word_set))
        .route("/readMail", post(user::read_mail))
        .route("/addRecentVisit", post(user::add_recent_visit))
        .route("/createFeedback", post(user::create_feedback))
        .route("/toggleAllowCopy", post(word_set::toggle_allow_copy))
        .route("/toggleIsPublic", post(word_set::toggle_is_public))
        .route("/logError", post(user::log_error))
}

/// Resource-ownership gate: the caller must author the word set in the body.
fn word_set_routes() -> Router<AppState> {
    use protected::word_set;

    Router::new()
        .route("/updateWordSet", post(word_set::update_word_set))
        .route("/deleteWordSet", post(word_set::delete_word_set))
        .route("/addWord", post(word_set::add_word))
        .route("/deleteWord", post(word_set::delete_word))
        .route("/toggleWordStar", post(word_set::toggle_word_star))
        .route("/toggleAllWordStar", post(word_set::toggle_all_word_star))
        .route("/inlineUpdateWord", post(word_set::inline_update_word))
        .route("/bigWordCardUpdateWord", post(word_set::big_word_card_update_word))
}
