//! Error handling for Xenspectra
//!
//! Validation failures from the generator, composer and analyzer surface
//! here. Lifecycle misuse in the voice engine is never an error; it is
//! logged and ignored.

use thiserror::Error;

/// Result type alias for Xenspectra operations
pub type Result<T> = std::result::Result<T, XenError>;

/// Main error type for Xenspectra operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XenError {
    // Series Generation Errors
    #[error("Number of partials cannot be negative: {count}")]
    NegativePartialCount { count: f64 },

    #[error("Number of partials should be an integer: {count}")]
    NonIntegerPartialCount { count: f64 },

    #[error("Amplitude slope cannot be negative: {slope}")]
    NegativeAmplitudeSlope { slope: f64 },

    #[error("Pseudo-octave ratio should be greater than one: {ratio}")]
    PseudoOctaveTooSmall { ratio: f64 },

    #[error("Stretch factor should be greater than one: {factor}")]
    StretchFactorTooSmall { factor: f64 },

    #[error("Fundamental rate should be greater than zero: {rate}")]
    NonPositiveFundamental { rate: f64 },

    #[error("Number of divisions should be greater than zero")]
    ZeroDivisions,

    #[error("Number of iterations reached {iterations}! Probable infinite loop")]
    ProbableInfiniteLoop { iterations: u64 },

    // Composition Errors
    #[error("Stretch exponent should be greater than zero: {exponent}")]
    NonPositiveExponent { exponent: f64 },

    #[error("Shift ratio should be greater than zero: {ratio}")]
    NonPositiveShift { ratio: f64 },

    #[error("Tweak for partial {index}: rate should be greater than zero, got {rate}")]
    TweakRateNotPositive { index: usize, rate: f64 },

    #[error("Tweak for partial {index}: amplitude cannot be negative, got {amplitude}")]
    TweakAmplitudeNegative { index: usize, amplitude: f64 },

    #[error("Tweak for partial {index}: phase cannot be negative, got {phase}")]
    TweakPhaseNegative { index: usize, phase: f64 },

    #[error("Length of tweaks ({tweaks}) should match the number of partials ({partials})")]
    TweakLengthMismatch { tweaks: usize, partials: usize },

    #[error("Invalid fraction tweak: {numerator}/{denominator}")]
    InvalidFraction { numerator: u64, denominator: u64 },

    #[error("Invalid partial: {reason}")]
    InvalidPartial { reason: String },

    // Analysis Errors
    #[error("Invalid sweep: {reason}")]
    InvalidSweep { reason: String },

    #[error("Analysis worker is not running")]
    WorkerDisconnected,

    // Rendering Errors
    #[error("Invalid render parameters: {reason}")]
    InvalidRender { reason: String },

    // Settings Errors
    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for XenError {
    fn from(err: serde_json::Error) -> Self {
        XenError::Serialization(err.to_string())
    }
}

impl XenError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            XenError::NegativePartialCount { .. } => "NEGATIVE_PARTIAL_COUNT",
            XenError::NonIntegerPartialCount { .. } => "NON_INTEGER_PARTIAL_COUNT",
            XenError::NegativeAmplitudeSlope { .. } => "NEGATIVE_AMPLITUDE_SLOPE",
            XenError::PseudoOctaveTooSmall { .. } => "PSEUDO_OCTAVE_TOO_SMALL",
            XenError::StretchFactorTooSmall { .. } => "STRETCH_FACTOR_TOO_SMALL",
            XenError::NonPositiveFundamental { .. } => "NON_POSITIVE_FUNDAMENTAL",
            XenError::ZeroDivisions => "ZERO_DIVISIONS",
            XenError::ProbableInfiniteLoop { .. } => "PROBABLE_INFINITE_LOOP",
            XenError::NonPositiveExponent { .. } => "NON_POSITIVE_EXPONENT",
            XenError::NonPositiveShift { .. } => "NON_POSITIVE_SHIFT",
            XenError::TweakRateNotPositive { .. } => "TWEAK_RATE_NOT_POSITIVE",
            XenError::TweakAmplitudeNegative { .. } => "TWEAK_AMPLITUDE_NEGATIVE",
            XenError::TweakPhaseNegative { .. } => "TWEAK_PHASE_NEGATIVE",
            XenError::TweakLengthMismatch { .. } => "TWEAK_LENGTH_MISMATCH",
            XenError::InvalidFraction { .. } => "INVALID_FRACTION",
            XenError::InvalidPartial { .. } => "INVALID_PARTIAL",
            XenError::InvalidSweep { .. } => "INVALID_SWEEP",
            XenError::WorkerDisconnected => "WORKER_DISCONNECTED",
            XenError::InvalidRender { .. } => "INVALID_RENDER",
            XenError::InvalidSettings { .. } => "INVALID_SETTINGS",
            XenError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is a parameter validation failure
    ///
    /// Validation errors mean the caller can fix the input and retry.
    /// Runaway generation is not one of them: the parameter combination
    /// can never converge.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            XenError::ProbableInfiniteLoop { .. }
                | XenError::WorkerDisconnected
                | XenError::Serialization(_)
        )
    }
}
