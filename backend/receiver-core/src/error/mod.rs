pub mod listen;
pub mod logger;
pub mod registration;
pub mod service;
pub mod settings;
pub mod start;
pub mod store;

pub use listen::ListenError;
pub use logger::LoggerError;
pub use registration::RegistrationError;
pub use service::ServiceError;
pub use settings::SettingsError;
pub use start::StartError;
pub use store::StoreError;
