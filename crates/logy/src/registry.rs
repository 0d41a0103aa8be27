//! Default HTTP statuses for error kinds.

use crate::error::ConfigError;
use std::collections::HashMap;

/// Status logged for errors that neither declare nor register one.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Maps error kinds to the status logged when the error carries none.
///
/// Filled while building a [`LogyConfig`](crate::LogyConfig) and read-only
/// once the config is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusExceptionRegistry {
    statuses: HashMap<String, u16>,
}

impl StatusExceptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `status` for errors of `kind`. A later registration wins.
    pub fn register(&mut self, kind: impl Into<String>, status: u16) -> &mut Self {
        let kind = kind.into();
        crate::logging::log_status_registered(&kind, status);
        self.statuses.insert(kind, status);
        self
    }

    /// Registers `status` for errors built with [`ApiError::from_error`](crate::ApiError::from_error)
    /// from an `E`.
    pub fn register_type<E: 'static>(&mut self, status: u16) -> &mut Self {
        self.register(std::any::type_name::<E>(), status)
    }

    /// Registered status for `kind`, if any.
    pub fn get(&self, kind: &str) -> Option<u16> {
        self.statuses.get(kind).copied()
    }

    /// Status for `kind`, falling back to [`DEFAULT_ERROR_STATUS`].
    pub fn status_for(&self, kind: &str) -> u16 {
        self.get(kind).unwrap_or(DEFAULT_ERROR_STATUS)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Checks that every registered status is a valid HTTP status.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .statuses
            .iter()
            .find(|(_, status)| !(100..=599).contains(*status))
        {
            Some((kind, status)) => Err(ConfigError::InvalidStatus {
                kind: kind.clone(),
                status: *status,
            }),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, u16)> for StatusExceptionRegistry {
    fn from_iter<I: IntoIterator<Item = (K, u16)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (kind, status) in iter {
            registry.register(kind, status);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordInvalid;

    #[test]
    fn test_unregistered_kind_defaults_to_500() {
        let registry = StatusExceptionRegistry::new();
        assert_eq!(registry.status_for("Anything"), 500);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = StatusExceptionRegistry::new();
        registry
            .register("ActiveRecord::RecordNotFound", 404)
            .register_type::<RecordInvalid>(422);

        assert_eq!(registry.status_for("ActiveRecord::RecordNotFound"), 404);
        assert_eq!(
            registry.status_for(std::any::type_name::<RecordInvalid>()),
            422
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let registry: StatusExceptionRegistry = [("Teapot", 42u16)].into_iter().collect();
        assert_eq!(
            registry.validate(),
            Err(ConfigError::InvalidStatus {
                kind: "Teapot".to_string(),
                status: 42
            })
        );
    }
}
