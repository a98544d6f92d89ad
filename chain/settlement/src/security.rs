//! Access control for administrative operations
//!
//! A single privileged owner gates every mutation of the strategy table,
//! currency whitelist, royalty registry pointer and oracle configuration.

use alloy_primitives::Address;

use crate::errors::CallerError;

/// Single-owner access control.
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
}

impl AccessControl {
    /// Create access control with an initial owner.
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// Check if a caller is the owner.
    pub fn is_owner(&self, caller: Address) -> bool {
        caller == self.owner
    }

    /// Reject any caller other than the owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), CallerError> {
        if !self.is_owner(caller) {
            return Err(CallerError::Unauthorized);
        }
        Ok(())
    }

    /// Hand ownership to a new address. Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Address, CallerError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(CallerError::Unauthorized);
        }
        let previous = self.owner;
        self.owner = new_owner;
        Ok(previous)
    }

    /// Get the current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    #[test]
    fn test_access_control_owner() {
        let ac = AccessControl::new(alice());
        assert!(ac.is_owner(alice()));
        assert!(!ac.is_owner(bob()));
        assert_eq!(ac.ensure_owner(bob()), Err(CallerError::Unauthorized));
    }

    #[test]
    fn test_transfer_ownership() {
        let mut ac = AccessControl::new(alice());
        assert_eq!(ac.transfer_ownership(alice(), bob()), Ok(alice()));
        assert!(ac.is_owner(bob()));
        assert!(!ac.is_owner(alice()));
        assert_eq!(ac.owner(), bob());
    }

    #[test]
    fn test_non_owner_cannot_transfer() {
        let mut ac = AccessControl::new(alice());
        assert_eq!(
            ac.transfer_ownership(bob(), bob()),
            Err(CallerError::Unauthorized)
        );
        assert_eq!(ac.owner(), alice());
    }

    #[test]
    fn test_cannot_transfer_to_zero_address() {
        let mut ac = AccessControl::new(alice());
        assert!(ac.transfer_ownership(alice(), Address::ZERO).is_err());
        assert_eq!(ac.owner(), alice());
    }
}
