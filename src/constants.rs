// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_DATABASE_PATH: &str = "coursehub.db";

// Token configuration constants
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 60;
pub const AUTH_COOKIE_NAME: &str = "auth_token";
pub const TOKEN_TYPE: &str = "bearer";

// Upload configuration constants
pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

// Listing configuration constants
pub const DEFAULT_PER_PAGE: u32 = 6;
pub const MAX_PER_PAGE: u32 = 100;

// Account constraints
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Course discussion threads hang off a synthetic course file
pub const DISCUSSION_FILE_TYPE: &str = "discussion";
pub const DISCUSSION_FILE_TITLE: &str = "Course Discussion";
pub const DISCUSSION_FILE_URL: &str = "/course-discussion";
pub const DISCUSSION_FILE_ORDER: i64 = 999;

// Request body limits
pub const MAX_JSON_BODY_BYTES: u64 = 64 * 1024;
