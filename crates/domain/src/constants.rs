//! Client constants
//!
//! Fixed names shared with the remote service and with other execution
//! contexts reading the same persistent store.

// Persistent store keys
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";

// Session cookies expired on logout
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

// Authentication endpoints
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

// Defaults
pub const DEFAULT_API_BASE_URL: &str = "https://jigsaw-s7qa.onrender.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_STORAGE_FILE: &str = "jigsaw-session.json";

// User-facing fallback messages
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const SIGNUP_FAILED_MESSAGE: &str = "Signup failed";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
pub const NETWORK_FAILED_MESSAGE: &str = "Unable to reach the server. Check your connection.";
