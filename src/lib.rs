//! bookrunner - end-to-end test framework for the restful-booker API
//!
//! The pieces compose bottom-up: a [`TokenCache`] with lazy expiry, an
//! [`HttpTransport`] seam implemented by [`RestClient`] and wrapped by the
//! [`RequestResponseInterceptor`], typed booking calls in [`BookingClient`],
//! validators for responses, and a [`SmokeSuite`] that reports through
//! [`reporting`].

pub mod error;
pub mod token_cache;
pub mod configuration;
pub mod transport;
pub mod rest_client;
pub mod interceptor;
pub mod endpoints;
pub mod header_manager;
pub mod payload;
pub mod auth_manager;
pub mod booking_client;
pub mod response_validator;
pub mod response_time;
pub mod contract_validator;
pub mod data_source;
pub mod mock_server;
pub mod reporting;
pub mod suite;
pub mod cli;
pub mod cli_handler;

// Re-export commonly used types
pub use error::{
    AssertionError, AuthError, BookRunnerError, ConfigurationError, DataSourceError, ReportingError, Result,
    TransportError, ValidationError,
};
pub use token_cache::{
    Clock, Expiry, Lifetime, ManualClock, SystemClock, TokenCache, TokenRecord, Ttl, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use configuration::{AuthEndpointConfig, CommonHeaders, Configuration, ConfigurationManager, GrantType};
pub use transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, CORRELATION_ID_HEADER};
pub use rest_client::RestClient;
pub use interceptor::{RequestInfo, RequestResponseInterceptor};
pub use header_manager::HeaderManager;
pub use payload::{AuthCredentials, Booking, BookingDates, BookingFilter, BookingId, BookingResponse, PayloadManager};
pub use auth_manager::AuthenticationManager;
pub use booking_client::BookingClient;
pub use response_validator::{AssertionResult, ResponseExpectation, ResponseValidator};
pub use response_time::{ResponseTimeCategory, ResponseTimeValidator};
pub use contract_validator::ContractValidator;
pub use data_source::{DataRow, ExcelDataProvider};
pub use mock_server::RequestStubber;
pub use reporting::{
    EnvironmentInfo, ExecutionSummary, ReportBuilder, ReportFormat, Reporter, TestExecutionResults, TestResult,
    TestStatus,
};
pub use suite::SmokeSuite;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
