use kkc_core::converter::ConvertError;
use kkc_core::dict::DictError;
use kkc_core::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("dictionary: {0}")]
    Dict(#[from] DictError),

    #[error("conversion: {0}")]
    Convert(#[from] ConvertError),

    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("internal error: {msg}")]
    Internal { msg: String },
}
