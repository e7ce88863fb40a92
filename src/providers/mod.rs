pub mod backend;
pub mod captions;
pub mod factory;
pub mod upstream;
pub mod whisper;

pub use backend::BackendProvider;
pub use captions::CaptionsProvider;
pub use factory::ProviderFactory;
pub use whisper::WhisperProvider;
