//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod email_verification;
pub mod login;
pub mod logout;
mod notify;
pub mod password;
pub mod register;
pub mod session_token;
pub mod two_factor;
pub mod user_admin;

// Re-exports
pub use check_session::{Authenticated, CheckSessionUseCase};
pub use config::AccountConfig;
pub use email_verification::{ResendVerificationUseCase, VerifyEmailUseCase};
pub use login::{LoginInput, LoginUseCase, SecondFactorInput, SecondFactorLoginUseCase};
pub use logout::LogoutUseCase;
pub use password::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, ResetPasswordInput,
    ResetPasswordUseCase,
};
pub use register::{RegisterInput, RegisterUseCase, SessionOutput};
pub use two_factor::{TwoFactorSetup, TwoFactorUseCase};
pub use user_admin::{
    CreateUserInput, CreateUserUseCase, DeleteUserUseCase, GetUserUseCase, ListUsersUseCase,
    PageMeta, PageQuery, UpdateUserInput, UpdateUserUseCase, UserListing,
};
