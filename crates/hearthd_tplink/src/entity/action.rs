//! Error translation and refresh for state-changing actions.

use std::future::Future;

use super::identity::DOMAIN;
use crate::coordinator::Coordinator;
use crate::device::DeviceError;
use crate::device::DeviceErrorKind;

/// How a device library failure is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTranslation {
    pub kind: DeviceErrorKind,
    pub translation_key: &'static str,
    /// English message, `{func}` and `{exc}` are substituted
    pub message: &'static str,
    /// Whether credentials must be re-entered
    pub start_reauth: bool,
}

const ERROR_TRANSLATIONS: &[ErrorTranslation] = &[
    ErrorTranslation {
        kind: DeviceErrorKind::Authentication,
        translation_key: "device_authentication",
        message: "Device authentication error {func}: {exc}",
        start_reauth: true,
    },
    ErrorTranslation {
        kind: DeviceErrorKind::Timeout,
        translation_key: "device_timeout",
        message: "Timeout communicating with the device {func}: {exc}",
        start_reauth: false,
    },
    ErrorTranslation {
        kind: DeviceErrorKind::Device,
        translation_key: "device_error",
        message: "Unable to communicate with the device {func}: {exc}",
        start_reauth: false,
    },
];

/// Translation for a device error kind.
pub fn translation_for(kind: DeviceErrorKind) -> &'static ErrorTranslation {
    ERROR_TRANSLATIONS
        .iter()
        .find(|t| t.kind == kind)
        // Every kind has an entry; the generic one covers anything added later
        .unwrap_or(&ERROR_TRANSLATIONS[ERROR_TRANSLATIONS.len() - 1])
}

/// User-facing error raised by a failed action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TranslatedError {
    pub translation_domain: &'static str,
    pub translation_key: &'static str,
    /// Name of the action that failed
    pub func: &'static str,
    /// Device library message
    pub exc: String,
    pub message: String,
    #[source]
    pub source: DeviceError,
}

impl TranslatedError {
    fn new(translation: &ErrorTranslation, func: &'static str, source: DeviceError) -> Self {
        let exc = source.to_string();
        let message = translation
            .message
            .replace("{func}", func)
            .replace("{exc}", &exc);
        Self {
            translation_domain: DOMAIN,
            translation_key: translation.translation_key,
            func,
            exc,
            message,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Device(#[from] TranslatedError),

    /// Rejected before reaching the device
    #[error("Invalid input for {func}: {reason}")]
    InvalidInput { func: &'static str, reason: String },
}

/// Run a device write, translate its failure, and refresh on success.
///
/// The refresh is requested only after the write completed without error.
/// Authentication failures start re-authentication before the error is
/// returned. Nothing is retried.
pub async fn refresh_after<F>(
    coordinator: &dyn Coordinator,
    func: &'static str,
    action: F,
) -> Result<(), ActionError>
where
    F: Future<Output = Result<(), DeviceError>>,
{
    if let Err(e) = action.await {
        let translation = translation_for(e.kind());
        if translation.start_reauth {
            coordinator.start_reauth();
        }
        return Err(TranslatedError::new(translation, func, e).into());
    }

    coordinator.request_refresh().await;
    Ok(())
}
