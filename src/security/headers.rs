//! Security headers for HTTP responses
//!
//! API responses are JSON only, so they get a locked-down policy and are never cached.
//! Uploaded files are served with a policy that still lets browsers render them inline.

/// Strict Content Security Policy for API endpoints
const STRICT_CSP: &str = "default-src 'none'; frame-ancestors 'none';";

/// Content Security Policy for served uploads (no scripts, no framing)
const UPLOAD_CSP: &str = "default-src 'none'; img-src 'self'; media-src 'self'; style-src 'unsafe-inline'; sandbox; frame-ancestors 'none';";

const PERMISSIONS_POLICY: &str =
    "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

/// Wrap a reply with strict security headers for API endpoints
pub fn with_api_security_headers<T: warp::Reply>(reply: T) -> impl warp::Reply {
    let reply = warp::reply::with_header(reply, "X-Frame-Options", "DENY");
    let reply = warp::reply::with_header(reply, "X-Content-Type-Options", "nosniff");
    let reply = warp::reply::with_header(reply, "Referrer-Policy", "no-referrer");
    let reply = warp::reply::with_header(reply, "Content-Security-Policy", STRICT_CSP);
    let reply = warp::reply::with_header(reply, "Cache-Control", "no-cache, no-store, must-revalidate");
    warp::reply::with_header(reply, "Permissions-Policy", PERMISSIONS_POLICY)
}

/// Wrap a served upload with headers that stop it from running as active content
pub fn with_upload_security_headers<T: warp::Reply>(reply: T) -> impl warp::Reply {
    let reply = warp::reply::with_header(reply, "X-Frame-Options", "DENY");
    let reply = warp::reply::with_header(reply, "X-Content-Type-Options", "nosniff");
    let reply = warp::reply::with_header(reply, "Referrer-Policy", "strict-origin-when-cross-origin");
    let reply = warp::reply::with_header(reply, "Content-Security-Policy", UPLOAD_CSP);
    warp::reply::with_header(reply, "Permissions-Policy", PERMISSIONS_POLICY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::Reply;

    #[test]
    fn test_csp_policies_block_scripts() {
        assert!(!STRICT_CSP.contains("script-src"));
        assert!(!UPLOAD_CSP.contains("script-src"));
        assert!(STRICT_CSP.contains("default-src 'none'"));
        assert!(UPLOAD_CSP.contains("sandbox"));
    }

    #[test]
    fn test_api_headers_applied() {
        let response = with_api_security_headers(warp::reply()).into_response();
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
    }
}
