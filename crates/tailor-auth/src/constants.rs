//! Storage keys and endpoint paths shared by the app and the gateway

/// Storage key holding the current access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key holding the current refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key holding the cached signed-in user (opaque JSON)
pub const USER_KEY: &str = "user";

/// Path of the token refresh endpoint, relative to the API base URL
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
