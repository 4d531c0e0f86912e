//! REST backend over reqwest.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use homefix_core::backend::{
    Credentials, HistoryEntry, IncomeSummary, NewBooking, PasswordChange, ProfileUpdate, Registration, UserProfile,
};
use homefix_core::search::{SearchReply, SearchRequest};
use homefix_core::wire::{
    BookingEnvelope, BookingList, CreatedBooking, ErrorBody, HistoryDto, IncomeDto, LoginEnvelope, RegisterEnvelope,
    SearchReplyDto, UserEnvelope,
};
use homefix_core::{AuthBackend, BookingBackend, ClientError, ClientResult, MessageBackend};
use homefix_shared::{Booking, BookingStatus, Session};
use homefix_store::app_config::ApiConfig;

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends and decodes a JSON body. Non-2xx answers become
    /// `ClientError::Request` with the backend's `message` when it sent one.
    async fn call<T: DeserializeOwned>(&self, what: &str, request: RequestBuilder) -> ClientResult<T> {
        let resp = self.send(what, request).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Schema(format!("{}: {}", what, e)))
    }

    async fn send(&self, what: &str, request: RequestBuilder) -> ClientResult<Response> {
        let resp = request.send().await.map_err(|e| {
            warn!(request = what, error = %e, "request did not reach the backend");
            ClientError::Network(e.to_string())
        })?;

        let status = resp.status();
        debug!(request = what, status = status.as_u16(), "backend answered");
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty());
        Err(ClientError::Request { status: status.as_u16(), message })
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        let envelope: LoginEnvelope = self
            .call("login", self.http.post(self.url("/api/user/login")).json(credentials))
            .await?;
        envelope.validate()
    }

    async fn register_customer(&self, registration: &Registration) -> ClientResult<String> {
        let envelope: RegisterEnvelope = self
            .call("register", self.http.post(self.url("/api/user/register/customer")).json(registration))
            .await?;
        envelope.validate()
    }

    async fn fetch_me(&self, token: &str) -> ClientResult<UserProfile> {
        let envelope: UserEnvelope = self
            .call("fetch me", self.http.get(self.url("/api/user/me")).bearer_auth(token))
            .await?;
        envelope.validate()
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ClientResult<UserProfile> {
        let envelope: UserEnvelope = self
            .call(
                "update profile",
                self.http.put(self.url("/api/user/profile")).bearer_auth(token).json(update),
            )
            .await?;
        envelope.validate()
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> ClientResult<()> {
        self.send(
            "change password",
            self.http.put(self.url("/api/user/change-password")).bearer_auth(token).json(change),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn create_booking(&self, token: &str, booking: &NewBooking) -> ClientResult<String> {
        let created: CreatedBooking = self
            .call("create booking", self.http.post(self.url("/api/bookings")).bearer_auth(token).json(booking))
            .await?;
        created.validate()
    }

    async fn get_booking(&self, token: &str, booking_id: &str) -> ClientResult<Booking> {
        let envelope: BookingEnvelope = self
            .call(
                "get booking",
                self.http.get(self.url(&format!("/api/bookings/{}", booking_id))).bearer_auth(token),
            )
            .await?;
        envelope.validate()
    }

    async fn update_status(&self, token: &str, booking_id: &str, status: BookingStatus) -> ClientResult<()> {
        self.send(
            "update status",
            self.http
                .put(self.url(&format!("/api/bookings/{}/status", booking_id)))
                .bearer_auth(token)
                .json(&json!({ "status": status })),
        )
        .await?;
        Ok(())
    }

    async fn search_technician(&self, token: &str, request: &SearchRequest) -> ClientResult<SearchReply> {
        // The outcome is read from the body whatever the status code:
        // "nobody nearby" may come back as a 4xx with `success: false`.
        let resp = self
            .http
            .post(self.url("/api/bookings/search"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| ClientError::Network(e.to_string()))?;

        match serde_json::from_str::<SearchReplyDto>(&text) {
            Ok(reply) => reply.validate(),
            Err(_) if !status.is_success() => Err(ClientError::Request { status: status.as_u16(), message: None }),
            Err(e) => Err(ClientError::Schema(format!("search: {}", e))),
        }
    }

    async fn customer_bookings(&self, token: &str, customer_id: &str) -> ClientResult<Vec<Booking>> {
        let list: BookingList = self
            .call(
                "customer bookings",
                self.http
                    .get(self.url(&format!("/api/bookings/customer/{}", customer_id)))
                    .bearer_auth(token),
            )
            .await?;
        list.validate()
    }

    async fn technician_bookings(&self, token: &str, technician_id: &str) -> ClientResult<Vec<Booking>> {
        let list: BookingList = self
            .call(
                "technician bookings",
                self.http
                    .get(self.url(&format!("/api/bookings/technician/{}", technician_id)))
                    .bearer_auth(token),
            )
            .await?;
        list.validate()
    }

    async fn income(&self, token: &str) -> ClientResult<IncomeSummary> {
        let income: IncomeDto = self
            .call("income", self.http.get(self.url("/api/bookings/income")).bearer_auth(token))
            .await?;
        income.validate()
    }
}

#[async_trait]
impl MessageBackend for HttpBackend {
    async fn history(&self, token: &str, counterpart_id: &str) -> ClientResult<Vec<HistoryEntry>> {
        let raw: Vec<HistoryDto> = self
            .call(
                "chat history",
                self.http.get(self.url(&format!("/api/messages/{}", counterpart_id))).bearer_auth(token),
            )
            .await?;
        raw.into_iter().map(HistoryDto::validate).collect()
    }
}
