//! Domain types and models

pub mod auth;
pub mod user;

pub use auth::{
    AuthResponse, AuthSession, LoginRequest, RefreshResponse, RemoteErrorBody, SignupPayload,
    SignupRequest,
};
pub use user::{AccountType, User};
