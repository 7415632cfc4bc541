//! Booking API locations

/// Public restful-booker instance
pub const BASE_URL: &str = "https://restful-booker.herokuapp.com";

pub const BOOKING_PATH: &str = "/booking";
pub const AUTH_PATH: &str = "/auth";
pub const PING_PATH: &str = "/ping";

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_COOKIE: &str = "Cookie";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Join `base` and `path` without doubling or dropping the slash
pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn booking_url(base: &str, id: u64) -> String {
    join(base, &format!("{}/{}", BOOKING_PATH, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_normalises_slashes() {
        assert_eq!(join("http://h/", "/ping"), "http://h/ping");
        assert_eq!(join("http://h", "ping"), "http://h/ping");
        assert_eq!(booking_url("http://h/", 42), "http://h/booking/42");
    }
}
