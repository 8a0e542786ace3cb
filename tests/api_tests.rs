//! Integration tests for shortly API endpoints.
//!
//! These tests verify the HTTP API behavior and data structures
//! used by the API without requiring database connections.

use serde_json::json;

/// Test module for request/response types
mod type_tests {
    use super::*;

    #[test]
    fn test_create_link_request_serialization() {
        let request = json!({
            "original_url": "https://example.com/page",
            "custom_alias": "my-link",
            "title": "Example",
            "description": "An example page",
            "expires_at": "2026-12-31T00:00:00Z"
        });

        assert_eq!(request["original_url"], "https://example.com/page");
        assert_eq!(request["custom_alias"], "my-link");
        assert_eq!(request["title"], "Example");
    }

    #[test]
    fn test_create_link_request_minimal() {
        let request = json!({
            "original_url": "https://example.com"
        });

        assert_eq!(request["original_url"], "https://example.com");
        assert!(request["custom_alias"].is_null());
        assert!(request["expires_at"].is_null());
    }

    #[test]
    fn test_error_response_format() {
        let error = json!({
            "error": "NOT_FOUND",
            "detail": "URL not found: abc123"
        });

        assert_eq!(error["error"], "NOT_FOUND");
        assert!(error["detail"].as_str().unwrap().contains("abc123"));
    }

    #[test]
    fn test_link_response_format() {
        let link = json!({
            "id": 1,
            "short_code": "abc123",
            "short_url": "http://localhost:3000/abc123",
            "original_url": "https://example.com",
            "title": null,
            "description": null,
            "is_active": true,
            "click_count": 42,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "expires_at": null
        });

        assert_eq!(link["short_code"], "abc123");
        assert_eq!(link["short_url"], "http://localhost:3000/abc123");
        assert_eq!(link["click_count"], 42);
        assert_eq!(link["is_active"], true);
    }

    #[test]
    fn test_analytics_report_format() {
        let report = json!({
            "total_clicks": 3,
            "unique_clicks": 3,
            "conversion_rate": 100.0,
            "clicks_by_day": [
                {"date": "2026-01-02", "count": 2},
                {"date": "2026-01-01", "count": 1}
            ],
            "clicks_by_country": [
                {"country": "Spain", "count": 2},
                {"country": "Unknown", "count": 1}
            ],
            "recent_clicks": [
                {
                    "clicked_at": "2026-01-02T10:00:00Z",
                    "ip_address": "203.0.113.7",
                    "country": "Spain",
                    "user_agent": "Mozilla/5.0",
                    "referer": null
                }
            ]
        });

        assert_eq!(report["total_clicks"], 3);
        assert_eq!(report["unique_clicks"], 3);
        assert_eq!(report["conversion_rate"], 100.0);

        // Day buckets are date-descending, country buckets count-descending
        let days = report["clicks_by_day"].as_array().unwrap();
        assert!(days[0]["date"].as_str() > days[1]["date"].as_str());
        let countries = report["clicks_by_country"].as_array().unwrap();
        assert!(countries[0]["count"].as_i64() >= countries[1]["count"].as_i64());

        // Buckets sum to the total in both dimensions
        let day_sum: i64 = days.iter().map(|d| d["count"].as_i64().unwrap()).sum();
        let country_sum: i64 = countries.iter().map(|c| c["count"].as_i64().unwrap()).sum();
        assert_eq!(day_sum, report["total_clicks"].as_i64().unwrap());
        assert_eq!(country_sum, report["total_clicks"].as_i64().unwrap());
    }

    #[test]
    fn test_delete_confirmation_format() {
        let confirmation = json!({
            "message": "URL deleted successfully"
        });

        assert_eq!(confirmation["message"], "URL deleted successfully");
    }

    #[test]
    fn test_update_link_request_partial() {
        let request = json!({
            "title": "New title"
        });

        assert_eq!(request["title"], "New title");
        assert!(request["description"].is_null());
        assert!(request["is_active"].is_null());
        assert!(request["expires_at"].is_null());
    }
}

/// Test module for URL and alias validation logic
mod validation_tests {
    fn is_valid_alias(alias: &str) -> bool {
        // Aliases are 3-50 characters from [A-Za-z0-9_-]
        alias.len() >= 3
            && alias.len() <= 50
            && alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    #[test]
    fn test_valid_aliases() {
        assert!(is_valid_alias("abc"));
        assert!(is_valid_alias("my-link"));
        assert!(is_valid_alias("my_link_2026"));
        assert!(is_valid_alias("ABC123"));
    }

    #[test]
    fn test_invalid_aliases_too_short() {
        assert!(!is_valid_alias("ab"));
        assert!(!is_valid_alias("a"));
        assert!(!is_valid_alias(""));
    }

    #[test]
    fn test_invalid_aliases_special_chars() {
        assert!(!is_valid_alias("my link"));
        assert!(!is_valid_alias("my.link"));
        assert!(!is_valid_alias("my/link"));
        assert!(!is_valid_alias("link@home"));
    }

    fn is_valid_url(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:3000"));
        assert!(is_valid_url("https://sub.domain.com/path?query=1"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url(""));
    }
}

/// Test module for error types
mod error_tests {
    use axum::http::StatusCode;

    #[test]
    fn test_error_codes() {
        let error_codes = vec![
            "NOT_FOUND",
            "GONE",
            "EXPIRED",
            "INVALID_URL",
            "ALIAS_CONFLICT",
            "GENERATION_EXHAUSTED",
            "DATABASE_ERROR",
            "CACHE_ERROR",
            "INTERNAL_ERROR",
        ];

        // Verify all expected error codes are valid strings
        for code in error_codes {
            assert!(!code.is_empty());
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_http_status_codes() {
        // NOT_FOUND -> 404
        assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
        // INVALID_URL -> 400
        assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
        // ALIAS_CONFLICT -> 409
        assert_eq!(StatusCode::CONFLICT.as_u16(), 409);
        // GONE / EXPIRED -> 410
        assert_eq!(StatusCode::GONE.as_u16(), 410);
        // Server failures -> 500
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
    }
}

/// Test module for conversion rate arithmetic
mod conversion_tests {
    fn conversion_rate(unique: i64, total: i64) -> f64 {
        if total > 0 {
            unique as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }

    #[test]
    fn test_all_unique() {
        assert_eq!(conversion_rate(3, 3), 100.0);
    }

    #[test]
    fn test_half_unique() {
        assert_eq!(conversion_rate(2, 4), 50.0);
    }

    #[test]
    fn test_no_clicks() {
        assert_eq!(conversion_rate(0, 0), 0.0);
    }

    #[test]
    fn test_unique_never_exceeds_total() {
        let unique = 7i64;
        let total = 10i64;
        assert!(unique <= total);
        assert!(conversion_rate(unique, total) <= 100.0);
    }
}
