//! Typed wrappers over the Good Work REST routes.
//!
//! Each call goes through [`RequestClient`], so every route shares the same
//! refresh, classification and connectivity behaviour.

use std::sync::Arc;

use goodwork_api_models::{
    ActivityStatus, ApiMessage, CreateBusinessRequest, CreateBusinessResponse, HomeResponse,
    LinkBusinessRequest, LinkBusinessResponse, LogActivityRequest, LoginRequest,
    NewScheduleRequest, RegisterRequest, Schedule, ShiftDraft, ShiftEdit, ShiftList, ShiftRef,
    TokenResponse, UpcomingShiftResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::claims::{LandingPage, TokenClaims, decode_claims};
use crate::error::{ClaimsError, ClientError, LoginError};
use crate::request::{ApiOutcome, RequestClient, RequestOptions};

/// Account creation.
pub const REGISTER_PATH: &str = "/api/auth/register";
/// Credential exchange.
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Home payload of the signed-in user.
pub const HOME_PATH: &str = "/api/home";
/// Unauthenticated liveness route.
pub const PING_PATH: &str = "/api/ping";
/// Business creation by a manager.
pub const CREATE_BUSINESS_PATH: &str = "/api/manager/new/business";
/// Joining a business with its code.
pub const LINK_BUSINESS_PATH: &str = "/api/link_business";
/// Schedules of the manager's business.
pub const SCHEDULES_PATH: &str = "/api/manager/schedules";
/// Schedule creation.
pub const NEW_SCHEDULE_PATH: &str = "/api/manager/schedules/new";
/// Adding a shift to a schedule.
pub const ADD_SHIFT_PATH: &str = "/api/manager/schedules/add_shift";
/// Changing a scheduled shift.
pub const EDIT_SHIFT_PATH: &str = "/api/manager/schedules/edit_shift";
/// Removing a scheduled shift.
pub const DELETE_SHIFT_PATH: &str = "/api/manager/schedules/delete_shift";
/// Shifts assigned to the signed-in employee.
pub const EMPLOYEE_SHIFTS_PATH: &str = "/api/employee/shifts";
/// Offering a shift to colleagues.
pub const POST_SHIFT_PATH: &str = "/api/employee/post_shift";
/// Shifts currently offered.
pub const POSTED_SHIFTS_PATH: &str = "/api/posted_shifts";
/// Taking an offered shift.
pub const TAKE_SHIFT_PATH: &str = "/api/employee/take_shift";
/// Clock status and next shift.
pub const ACTIVITY_PATH: &str = "/api/activity";
/// Clock-in and clock-out.
pub const LOG_ACTIVITY_PATH: &str = "/api/log_activity";
/// Next shift of the signed-in employee.
pub const UPCOMING_SHIFT_PATH: &str = "/api/upcoming_shift";

/// Result of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    /// Claims decoded from the issued access token.
    pub claims: TokenClaims,
    /// Page the user should be sent to.
    pub landing: LandingPage,
    /// Username echoed by the backend, if any.
    pub username: Option<String>,
}

/// Endpoint surface of the Good Work backend.
#[derive(Debug, Clone)]
pub struct GoodWorkApi {
    client: Arc<RequestClient>,
}

impl GoodWorkApi {
    /// Wrap a shared request client.
    #[must_use]
    pub const fn new(client: Arc<RequestClient>) -> Self {
        Self { client }
    }

    /// Underlying request client.
    #[must_use]
    pub const fn client(&self) -> &Arc<RequestClient> {
        &self.client
    }

    /// Create an account and start a session for it.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when the request fails unexpectedly or the
    /// issued token is unusable.
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<ApiOutcome<LoginSuccess>, LoginError> {
        let body = encode(REGISTER_PATH, request)?;
        let outcome = self
            .client
            .request(REGISTER_PATH, &RequestOptions::post(body))
            .await?
            .decode::<TokenResponse>(REGISTER_PATH)?;
        self.start_session(outcome)
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::UnknownRole`] when the token's role has no
    /// landing page; the tokens stay stored in that case.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ApiOutcome<LoginSuccess>, LoginError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let body = encode(LOGIN_PATH, &request)?;
        let outcome = self
            .client
            .request(LOGIN_PATH, &RequestOptions::post(body))
            .await?
            .decode::<TokenResponse>(LOGIN_PATH)?;
        self.start_session(outcome)
    }

    /// Forget the stored session.
    pub fn logout(&self) {
        self.client.tokens().clear();
        info!("session cleared");
    }

    /// Claims of the stored access token; `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError`] when the stored token is malformed.
    pub fn current_claims(&self) -> Result<Option<TokenClaims>, ClaimsError> {
        self.client
            .tokens()
            .get_token()
            .map(|token| decode_claims(&token))
            .transpose()
    }

    /// Home payload of the signed-in user.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn home(&self) -> Result<ApiOutcome<HomeResponse>, ClientError> {
        self.get(HOME_PATH).await
    }

    /// Probe the backend and update the connectivity tracker.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPath`] only if the base URL is unusable.
    pub async fn check_backend(&self) -> Result<bool, ClientError> {
        self.client.probe(PING_PATH).await
    }

    /// Create the manager's business.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn create_business(
        &self,
        request: &CreateBusinessRequest,
    ) -> Result<ApiOutcome<CreateBusinessResponse>, ClientError> {
        self.post(CREATE_BUSINESS_PATH, request).await
    }

    /// Join a business by code, storing a reissued access token.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn link_business(
        &self,
        code: &str,
    ) -> Result<ApiOutcome<LinkBusinessResponse>, ClientError> {
        let request = LinkBusinessRequest {
            code: code.trim().to_string(),
        };
        let outcome: ApiOutcome<LinkBusinessResponse> =
            self.post(LINK_BUSINESS_PATH, &request).await?;
        if let ApiOutcome::Success(LinkBusinessResponse {
            access_token: Some(token),
            ..
        }) = &outcome
            && !token.trim().is_empty()
        {
            self.client.tokens().save_token(token);
            info!("access token reissued after linking business");
        }
        Ok(outcome)
    }

    /// Schedules of the manager's business.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn schedules(&self) -> Result<ApiOutcome<Vec<Schedule>>, ClientError> {
        let outcome = self
            .client
            .authenticated_request(SCHEDULES_PATH, &RequestOptions::get())
            .await?;
        // The route answers either a bare list or `{ "schedules": [...] }`.
        outcome
            .map(|value| match value {
                Value::Object(mut map) => map.remove("schedules").unwrap_or(Value::Null),
                other => other,
            })
            .map(|value| if value.is_null() { Value::Array(Vec::new()) } else { value })
            .decode(SCHEDULES_PATH)
    }

    /// Create a schedule for a month.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn new_schedule(
        &self,
        request: &NewScheduleRequest,
    ) -> Result<ApiOutcome<ApiMessage>, ClientError> {
        self.post(NEW_SCHEDULE_PATH, request).await
    }

    /// Add a shift to a schedule.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn add_shift(&self, draft: &ShiftDraft) -> Result<ApiOutcome<Value>, ClientError> {
        self.post(ADD_SHIFT_PATH, draft).await
    }

    /// Change a scheduled shift.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn edit_shift(&self, edit: &ShiftEdit) -> Result<ApiOutcome<Value>, ClientError> {
        self.post(EDIT_SHIFT_PATH, edit).await
    }

    /// Remove a scheduled shift.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn delete_shift(
        &self,
        schedule_id: &str,
        shift_id: &str,
    ) -> Result<ApiOutcome<ApiMessage>, ClientError> {
        let edit = ShiftEdit {
            schedule_id: schedule_id.to_string(),
            shift_id: shift_id.to_string(),
            start: None,
            end: None,
            employee_id: None,
        };
        self.post(DELETE_SHIFT_PATH, &edit).await
    }

    /// Shifts assigned to the signed-in employee.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn employee_shifts(&self) -> Result<ApiOutcome<ShiftList>, ClientError> {
        self.get(EMPLOYEE_SHIFTS_PATH).await
    }

    /// Offer one of the employee's shifts to colleagues.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn post_shift(&self, shift_id: &str) -> Result<ApiOutcome<ApiMessage>, ClientError> {
        self.post(POST_SHIFT_PATH, &shift_ref(shift_id)).await
    }

    /// Shifts currently offered at the business.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn posted_shifts(&self) -> Result<ApiOutcome<ShiftList>, ClientError> {
        self.get(POSTED_SHIFTS_PATH).await
    }

    /// Take an offered shift.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn take_shift(&self, shift_id: &str) -> Result<ApiOutcome<ApiMessage>, ClientError> {
        self.post(TAKE_SHIFT_PATH, &shift_ref(shift_id)).await
    }

    /// Clock status and next shift.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn activity(&self) -> Result<ApiOutcome<ActivityStatus>, ClientError> {
        self.get(ACTIVITY_PATH).await
    }

    /// Clock in (`clock_in = true`) or out of a shift.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn log_activity(
        &self,
        shift_id: &str,
        clock_in: bool,
    ) -> Result<ApiOutcome<ApiMessage>, ClientError> {
        let request = LogActivityRequest {
            shift_id: shift_id.to_string(),
            clock_in,
        };
        self.post(LOG_ACTIVITY_PATH, &request).await
    }

    /// Next shift of the signed-in employee.
    ///
    /// # Errors
    ///
    /// See [`RequestClient::authenticated_request`].
    pub async fn upcoming_shift(&self) -> Result<ApiOutcome<UpcomingShiftResponse>, ClientError> {
        self.get(UPCOMING_SHIFT_PATH).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiOutcome<T>, ClientError> {
        self.client
            .authenticated_request(path, &RequestOptions::get())
            .await?
            .decode(path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiOutcome<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(path, body)?;
        self.client
            .authenticated_request(path, &RequestOptions::post(body))
            .await?
            .decode(path)
    }

    fn start_session(
        &self,
        outcome: ApiOutcome<TokenResponse>,
    ) -> Result<ApiOutcome<LoginSuccess>, LoginError> {
        let response = match outcome {
            ApiOutcome::Success(response) => response,
            ApiOutcome::Offline { error } => return Ok(ApiOutcome::Offline { error }),
            ApiOutcome::Redirected => return Ok(ApiOutcome::Redirected),
            ApiOutcome::Rejected(problem) => return Ok(ApiOutcome::Rejected(problem)),
        };

        // A new sign-in replaces the whole token pair.
        let tokens = self.client.tokens();
        tokens.clear();
        tokens.save_token(&response.access_token);
        if let Some(refresh) = response.refresh_token.as_deref() {
            tokens.save_refresh_token(refresh);
        }

        let claims = decode_claims(&response.access_token)?;
        let Some(landing) = LandingPage::for_claims(&claims) else {
            let role = claims.role().as_str().to_string();
            warn!(role = %role, "signed in with an unsupported role");
            return Err(LoginError::UnknownRole { role });
        };
        info!(role = claims.role().as_str(), landing = landing.path(), "session started");

        Ok(ApiOutcome::Success(LoginSuccess {
            claims,
            landing,
            username: response.username,
        }))
    }
}

fn shift_ref(shift_id: &str) -> ShiftRef {
    ShiftRef {
        shift_id: shift_id.to_string(),
    }
}

fn encode<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|source| ClientError::Encode {
        path: path.to_string(),
        source,
    })
}
