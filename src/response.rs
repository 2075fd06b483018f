//! Uniform JSON response envelope shared by handlers and error responses.

use serde::Serialize;

/// Machine-readable status codes carried next to the HTTP status.
pub mod status_code {
    pub const SUCCESS: &str = "000000";
    pub const BINDING_FAILED: &str = "000001";
    pub const VALIDATION_FAILED: &str = "000002";
    pub const UNAUTHORIZED: &str = "000011";
    pub const USER_OR_PASSWORD_INVALID: &str = "000012";
    pub const INTERNAL_SERVER_ERROR: &str = "000013";
    pub const NOT_FOUND: &str = "000014";
    pub const DUPLICATE: &str = "000015";
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: &'static str,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status_code: &'static str,
    pub message: String,
    pub data: Option<()>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub total_data: i64,
    pub total_page: i64,
    pub total_data_on_page: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status_code: status_code::SUCCESS,
            message: "Success".to_string(),
            data,
            meta: None,
        }
    }

    pub fn paginated(data: T, page: i64, limit: i64, count: i64, total: i64) -> Self {
        let limit = limit.max(1);
        Self {
            status_code: status_code::SUCCESS,
            message: "Success".to_string(),
            data,
            meta: Some(PaginationMeta {
                page,
                total_data: total,
                total_page: (total + limit - 1) / limit,
                total_data_on_page: count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::success(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusCode"], "000000");
        assert_eq!(json["message"], "Success");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn test_pagination_meta() {
        let resp = ApiResponse::paginated(vec![1, 2, 3], 2, 3, 3, 7);
        let meta = resp.meta.as_ref().unwrap();
        assert_eq!(meta.page, 2);
        assert_eq!(meta.total_data, 7);
        assert_eq!(meta.total_page, 3);
        assert_eq!(meta.total_data_on_page, 3);
    }

    #[test]
    fn test_pagination_zero_limit() {
        // A zero limit must not divide by zero.
        let resp = ApiResponse::paginated(Vec::<i32>::new(), 1, 0, 0, 0);
        assert_eq!(resp.meta.unwrap().total_page, 0);
    }
}
