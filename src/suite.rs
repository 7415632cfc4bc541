//! End-to-end booking flow
//!
//! Steps run in order and each produces one [`TestResult`]. A step whose
//! inputs were not produced by an earlier step is skipped.

use serde_json::json;
use std::sync::Arc;

use crate::booking_client::{BookingClient, HEALTHY_STATUS};
use crate::payload::PayloadManager;
use crate::reporting::{EnvironmentInfo, ReportBuilder, TestExecutionResults, TestResult, TestRun};
use crate::response_validator::{AssertionResult, ResponseValidator};
use crate::token_cache::{TokenCache, Ttl, ACCESS_TOKEN_KEY};
use crate::transport::ApiResponse;

pub const SUITE_NAME: &str = "Booking Smoke";

const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

const STEP_HEALTH: &str = "health check";
const STEP_TOKEN: &str = "create token";
const STEP_CREATE: &str = "create booking";
const STEP_GET: &str = "get booking";
const STEP_UPDATE: &str = "full update booking";
const STEP_PATCH: &str = "partial update booking";
const STEP_DELETE: &str = "delete booking";
const STEP_VERIFY: &str = "verify deletion";

pub struct SmokeSuite {
    client: BookingClient,
    cache: Arc<TokenCache>,
    payloads: PayloadManager,
    token_ttl: Ttl,
}

impl SmokeSuite {
    pub fn new(client: BookingClient, cache: Arc<TokenCache>) -> Self {
        Self {
            client,
            cache,
            payloads: PayloadManager::new(),
            token_ttl: Ttl::Never,
        }
    }

    pub fn with_token_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.token_ttl = ttl.into();
        self
    }

    pub async fn run(&self) -> TestExecutionResults {
        let mut report = ReportBuilder::new(SUITE_NAME, EnvironmentInfo::current(self.client.base_url()));

        let result = self.health_check(report.start_test(STEP_HEALTH).tag("smoke")).await;
        report.record(result);

        let (result, token) = self.acquire_token(report.start_test(STEP_TOKEN).tag("auth")).await;
        report.record(result);

        let (result, booking_id) = self.create_booking(report.start_test(STEP_CREATE).tag("crud")).await;
        report.record(result);

        let booking_id = match booking_id {
            Some(id) => id,
            None => {
                skip_all(&mut report, &[STEP_GET, STEP_UPDATE, STEP_PATCH, STEP_DELETE, STEP_VERIFY], "no booking was created");
                return report.finish();
            }
        };

        let result = self.get_booking(report.start_test(STEP_GET).tag("crud"), booking_id).await;
        report.record(result);

        let token = match token {
            Some(token) => token,
            None => {
                skip_all(&mut report, &[STEP_UPDATE, STEP_PATCH, STEP_DELETE, STEP_VERIFY], "no auth token available");
                return report.finish();
            }
        };

        let result = self.full_update(report.start_test(STEP_UPDATE).tag("crud"), booking_id, &token).await;
        report.record(result);

        let result = self.partial_update(report.start_test(STEP_PATCH).tag("crud"), booking_id, &token).await;
        report.record(result);

        let (result, deleted) = self.delete_booking(report.start_test(STEP_DELETE).tag("crud"), booking_id, &token).await;
        report.record(result);

        if deleted {
            let result = self.verify_deleted(report.start_test(STEP_VERIFY).tag("crud"), booking_id).await;
            report.record(result);
        } else {
            skip_all(&mut report, &[STEP_VERIFY], "booking was not deleted");
        }

        report.finish()
    }

    async fn health_check(&self, mut run: TestRun) -> TestResult {
        match self.client.health_check().await {
            Ok(response) => {
                observe(&mut run, &response);
                run.assertion(ResponseValidator::status_code(&response, HEALTHY_STATUS));
                run.finish()
            }
            Err(e) => run.error(e.to_string()),
        }
    }

    /// Reuse the cached token when it is still valid
    async fn acquire_token(&self, mut run: TestRun) -> (TestResult, Option<String>) {
        if let Some(token) = self.cache.fetch(ACCESS_TOKEN_KEY) {
            log::debug!("Using cached token for key: {}", ACCESS_TOKEN_KEY);
            run.assertion(AssertionResult::passed("Token served from cache"));
            return (run.finish(), Some(token));
        }

        let response = match self.client.create_token(&self.payloads.auth_payload()).await {
            Ok(response) => response,
            Err(e) => return (run.error(e.to_string()), None),
        };
        observe(&mut run, &response);
        run.assertion(ResponseValidator::status_code(&response, 200));

        match self.payloads.parse_token(&response.text()) {
            Ok(token) if !token.is_empty() => {
                self.cache.store(ACCESS_TOKEN_KEY, token.clone(), self.token_ttl);
                run.assertion(AssertionResult::passed("Token created"));
                (run.finish(), Some(token))
            }
            _ => {
                run.assertion(AssertionResult::failed(format!(
                    "Response did not contain a token: {}",
                    response.text()
                )));
                (run.finish(), None)
            }
        }
    }

    async fn create_booking(&self, mut run: TestRun) -> (TestResult, Option<u64>) {
        let booking = self.payloads.create_booking_payload();
        let response = match self.client.create_booking(&booking).await {
            Ok(response) => response,
            Err(e) => return (run.error(e.to_string()), None),
        };
        observe(&mut run, &response);

        run.assertion(ResponseValidator::status_code(&response, 200));
        for result in ResponseValidator::required_fields(&response, &["bookingid"]) {
            run.assertion(result);
        }
        run.assertion(ResponseValidator::field(&response, "booking.firstname", &json!(booking.firstname)));

        let booking_id = self
            .payloads
            .parse_booking_response(&response.text())
            .ok()
            .map(|created| created.bookingid);
        if let Some(id) = booking_id {
            log::info!("Created booking {}", id);
        }

        (run.finish(), booking_id)
    }

    async fn get_booking(&self, mut run: TestRun, id: u64) -> TestResult {
        let expected = self.payloads.create_booking_payload();
        match self.client.get_booking(id).await {
            Ok(response) => {
                observe(&mut run, &response);
                run.assertion(ResponseValidator::status_code(&response, 200));
                run.assertion(ResponseValidator::field(&response, "firstname", &json!(expected.firstname)));
                run.assertion(ResponseValidator::field(&response, "lastname", &json!(expected.lastname)));
                run.assertion(ResponseValidator::field_matches(&response, "bookingdates.checkin", DATE_PATTERN));
                run.finish()
            }
            Err(e) => run.error(e.to_string()),
        }
    }

    async fn full_update(&self, mut run: TestRun, id: u64, token: &str) -> TestResult {
        let booking = self.payloads.full_update_payload();
        match self.client.update_booking(id, &booking, token).await {
            Ok(response) => {
                observe(&mut run, &response);
                run.assertion(ResponseValidator::status_code(&response, 200));
                run.assertion(ResponseValidator::field(&response, "firstname", &json!(booking.firstname)));
                run.assertion(ResponseValidator::field(&response, "totalprice", &json!(booking.totalprice)));
                run.finish()
            }
            Err(e) => run.error(e.to_string()),
        }
    }

    async fn partial_update(&self, mut run: TestRun, id: u64, token: &str) -> TestResult {
        let patch = self.payloads.partial_update_payload();
        match self.client.partial_update_booking(id, &patch, token).await {
            Ok(response) => {
                observe(&mut run, &response);
                run.assertion(ResponseValidator::status_code(&response, 200));
                run.assertion(ResponseValidator::field(&response, "firstname", &patch["firstname"]));
                run.assertion(ResponseValidator::field(&response, "additionalneeds", &patch["additionalneeds"]));
                run.finish()
            }
            Err(e) => run.error(e.to_string()),
        }
    }

    async fn delete_booking(&self, mut run: TestRun, id: u64, token: &str) -> (TestResult, bool) {
        match self.client.delete_booking(id, token).await {
            Ok(response) => {
                observe(&mut run, &response);
                let status = ResponseValidator::status_code(&response, 201);
                let deleted = status.success;
                run.assertion(status);
                (run.finish(), deleted)
            }
            Err(e) => (run.error(e.to_string()), false),
        }
    }

    async fn verify_deleted(&self, mut run: TestRun, id: u64) -> TestResult {
        match self.client.get_booking(id).await {
            Ok(response) => {
                observe(&mut run, &response);
                run.assertion(ResponseValidator::status_code(&response, 404));
                run.finish()
            }
            Err(e) => run.error(e.to_string()),
        }
    }
}

fn observe(run: &mut TestRun, response: &ApiResponse) {
    run.response(response.status_code, response.correlation_id.clone());
}

fn skip_all(report: &mut ReportBuilder, steps: &[&str], reason: &str) {
    for step in steps {
        let skipped = report.start_test(*step).skip(reason);
        report.record(skipped);
    }
}
