pub mod cancellation;
pub mod cart_store;
pub mod lock_status;
pub mod order_service;
pub mod permission_channel;
pub mod readiness;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use crate::domain::errors::DomainError;

/// Outcome of a derivation over several remote reads.
///
/// `error` is set only when the derivation failed as a whole, in which case
/// `data` holds the type's default rather than anything partially computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived<T> {
    pub data: T,
    pub error: Option<DomainError>,
}

impl<T> Derived<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T: Default> Derived<T> {
    pub fn failed(error: DomainError) -> Self {
        Self {
            data: T::default(),
            error: Some(error),
        }
    }
}
