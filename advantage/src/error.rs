use thiserror::Error;

/// Errors surfaced by the engine. The strategy and betting engines never
/// return these; they degrade to a legal action or a zero bet. The
/// simulation driver is the only component allowed to abort on one.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid hand: {0}")]
    InvalidHand(String),

    #[error("invalid rules: {0}")]
    InvalidRules(String),

    #[error("shoe is empty; the cut card logic failed to reshuffle in time")]
    EmptyShoe,

    #[error("unknown action token {token:?} for key {key:?}")]
    UnknownActionToken { key: String, token: String },

    #[error("malformed strategy bundle: {0}")]
    MalformedBundle(String),

    #[error("trace sink error: {0}")]
    Trace(#[from] std::io::Error),
}
