//! Request and response bodies of the booking API

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDates {
    pub checkin: String,
    pub checkout: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: i64,
    pub depositpaid: bool,
    pub bookingdates: BookingDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

/// Body returned by `POST /booking`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub bookingid: u64,
    pub booking: Booking,
}

/// One entry of `GET /booking`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingId {
    pub bookingid: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AuthCredentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Query filters for `GET /booking`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<String>,
}

impl BookingFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("firstname", self.firstname.as_deref()),
            ("lastname", self.lastname.as_deref()),
            ("checkin", self.checkin.as_deref()),
            ("checkout", self.checkout.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Factory for canned payloads and typed parsing of responses
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadManager;

impl PayloadManager {
    pub fn new() -> Self {
        Self
    }

    pub fn create_booking_payload(&self) -> Booking {
        Booking {
            firstname: "Prasad".to_string(),
            lastname: "Valiv".to_string(),
            totalprice: 143,
            depositpaid: true,
            bookingdates: BookingDates {
                checkin: "2024-02-01".to_string(),
                checkout: "2024-02-01".to_string(),
            },
            additionalneeds: Some("Dinner".to_string()),
        }
    }

    pub fn full_update_payload(&self) -> Booking {
        Booking {
            firstname: "Lucky".to_string(),
            lastname: "Charming".to_string(),
            totalprice: 156,
            depositpaid: true,
            bookingdates: BookingDates {
                checkin: "2024-02-01".to_string(),
                checkout: "2024-02-05".to_string(),
            },
            additionalneeds: Some("Breakfast".to_string()),
        }
    }

    pub fn partial_update_payload(&self) -> Value {
        json!({
            "firstname": "James",
            "additionalneeds": "Late checkout"
        })
    }

    pub fn auth_payload(&self) -> AuthCredentials {
        AuthCredentials::default()
    }

    pub fn parse_booking_response(&self, body: &str) -> Result<BookingResponse, ValidationError> {
        parse(body)
    }

    pub fn parse_booking(&self, body: &str) -> Result<Booking, ValidationError> {
        parse(body)
    }

    pub fn parse_booking_ids(&self, body: &str) -> Result<Vec<BookingId>, ValidationError> {
        parse(body)
    }

    pub fn parse_token(&self, body: &str) -> Result<String, ValidationError> {
        parse::<TokenResponse>(body).map(|response| response.token)
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ValidationError> {
    serde_json::from_str(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))
}
