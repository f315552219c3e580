use thiserror::Error;

/// Failures reported by the contract bridge or the chain itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("user rejected transaction")]
    UserRejected,

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no signer available for write call")]
    NoSigner,

    #[error("confirmation timed out for {0}")]
    Timeout(String),
}

impl ContractError {
    /// The signer declined the transaction, whether reported as a typed
    /// rejection or only in the message text.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::UserRejected => true,
            other => other.to_string().contains("user rejected"),
        }
    }

    /// Another decrypt attempt already recorded the verification on-chain.
    pub fn is_already_verified(&self) -> bool {
        self.to_string().contains("Data already verified")
    }
}

impl From<reqwest::Error> for ContractError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("FHE client not initialized")]
    NotInitialized,

    #[error("relayer error: {0}")]
    Relayer(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("no clear value returned for handle {0}")]
    MissingClearValue(String),

    #[error("proof submission failed: {0}")]
    Submit(#[from] ContractError),
}

impl FheError {
    pub fn is_already_verified(&self) -> bool {
        match self {
            Self::Submit(e) => e.is_already_verified(),
            other => other.to_string().contains("Data already verified"),
        }
    }
}

impl From<reqwest::Error> for FheError {
    fn from(e: reqwest::Error) -> Self {
        Self::Relayer(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("no connected account")]
    NotConnected,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Fhe(#[from] FheError),

    #[error("config error: {0}")]
    Config(String),
}

impl AppError {
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::Contract(e) | Self::Fhe(FheError::Submit(e)) => e.is_user_rejection(),
            _ => false,
        }
    }

    pub fn is_already_verified(&self) -> bool {
        match self {
            Self::Contract(e) => e.is_already_verified(),
            Self::Fhe(e) => e.is_already_verified(),
            _ => false,
        }
    }

    /// Text shown to the user when contact creation fails.
    pub fn creation_message(&self) -> String {
        match self {
            Self::NotConnected => "Please connect wallet first".to_string(),
            Self::Validation(msg) => msg.clone(),
            e if e.is_user_rejection() => "Transaction rejected".to_string(),
            e => format!("Creation failed: {}", e),
        }
    }

    /// Text shown to the user when decryption fails.
    pub fn decryption_message(&self) -> String {
        match self {
            Self::NotConnected => "Please connect wallet first".to_string(),
            _ => "Decryption failed".to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
