// HTTP response builders for Lambda
//
// Converts internal response format to API Gateway response types

use aws_lambda_events::{
    apigw::{
        ApiGatewayProxyRequest, ApiGatewayProxyResponse, ApiGatewayV2httpRequest,
        ApiGatewayV2httpResponse,
    },
    encodings::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderMap, HeaderValue,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Internal HTTP response data
#[derive(Debug)]
pub(crate) struct HttpResponseData {
    pub status_code: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// Every response carries the same CORS headers as the preflight answer
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
        );
        headers
    }
}

/// Lambda event types (API Gateway REST v1 or HTTP API v2)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum HttpRequestEvent {
    ApiGatewayV1(Box<ApiGatewayProxyRequest>),
    ApiGatewayV2(Box<ApiGatewayV2httpRequest>),
}

/// Lambda response types
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum HttpLambdaResponse {
    ApiGatewayV1(ApiGatewayProxyResponse),
    ApiGatewayV2(ApiGatewayV2httpResponse),
}

/// Build API Gateway v1 response from internal response data
pub(crate) fn build_api_gateway_v1_response(data: HttpResponseData) -> HttpLambdaResponse {
    let mut response = ApiGatewayProxyResponse::default();
    response.status_code = data.status_code as i64;
    response.headers = data.headers();
    response.body = Some(Body::Text(data.body));
    HttpLambdaResponse::ApiGatewayV1(response)
}

/// Build API Gateway v2 (HTTP API) response from internal response data
pub(crate) fn build_api_gateway_v2_response(data: HttpResponseData) -> HttpLambdaResponse {
    let mut response = ApiGatewayV2httpResponse::default();
    response.status_code = data.status_code as i64;
    response.headers = data.headers();
    response.body = Some(Body::Text(data.body));
    HttpLambdaResponse::ApiGatewayV2(response)
}
