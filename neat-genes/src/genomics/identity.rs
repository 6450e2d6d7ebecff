use super::GeneError;
use crate::Innovation;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// A temporary stand-in for an innovation number.
///
/// Tokens are random version 4 UUIDs (122 random bits), so
/// two independently generated tokens collide with negligible
/// probability for the lifetime of any run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvisionalToken(Uuid);

impl ProvisionalToken {
    /// Generates a fresh token.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::ProvisionalToken;
    ///
    /// assert_ne!(ProvisionalToken::generate(), ProvisionalToken::generate());
    /// ```
    pub fn generate() -> ProvisionalToken {
        ProvisionalToken(Uuid::new_v4())
    }
}

impl fmt::Display for ProvisionalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0.simple())
    }
}

/// The identity of a node gene: either its permanent
/// innovation number or, until one is assigned, a
/// provisional token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    Permanent(Innovation),
    Provisional(ProvisionalToken),
}

impl Identity {
    /// Returns a new provisional identity.
    pub fn provisional() -> Identity {
        Identity::Provisional(ProvisionalToken::generate())
    }

    /// Returns a permanent identity for `Some(id)`,
    /// and a fresh provisional one for `None`.
    pub fn from_innovation(id: Option<Innovation>) -> Identity {
        match id {
            Some(id) => Identity::Permanent(id),
            None => Identity::provisional(),
        }
    }

    /// Returns the innovation number, if permanent.
    pub fn permanent(&self) -> Option<Innovation> {
        match self {
            Identity::Permanent(id) => Some(*id),
            Identity::Provisional(_) => None,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Identity::Provisional(_))
    }

    /// Makes the identity permanent, discarding the
    /// provisional token.
    ///
    /// # Errors
    /// Returns [`GeneError::IdentityAlreadySet`] if the identity
    /// is already permanent. The current value is kept.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::Identity;
    ///
    /// let mut identity = Identity::provisional();
    /// identity.resolve(7).unwrap();
    ///
    /// assert_eq!(identity, Identity::Permanent(7));
    /// assert!(identity.resolve(8).is_err());
    /// assert_eq!(identity.permanent(), Some(7));
    /// ```
    pub fn resolve(&mut self, id: Innovation) -> Result<(), GeneError> {
        match *self {
            Identity::Permanent(current) => Err(GeneError::IdentityAlreadySet {
                current,
                attempted: id,
            }),
            Identity::Provisional(_) => {
                *self = Identity::Permanent(id);
                Ok(())
            }
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Permanent(id) => write!(f, "{}", id),
            Identity::Provisional(token) => write!(f, "{}", token),
        }
    }
}

/// Sets an optional innovation number exactly once.
pub(super) fn resolve_once(slot: &mut Option<Innovation>, id: Innovation) -> Result<(), GeneError> {
    match *slot {
        Some(current) => Err(GeneError::IdentityAlreadySet {
            current,
            attempted: id,
        }),
        None => {
            *slot = Some(id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_innovation() {
        assert_eq!(Identity::from_innovation(Some(3)), Identity::Permanent(3));
        assert!(Identity::from_innovation(None).is_provisional());
    }

    #[test]
    fn provisional_tokens_are_unique() {
        let tokens: std::collections::HashSet<_> =
            (0..1000).map(|_| ProvisionalToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn resolve_once_rejects_second_assignment() {
        let mut slot = None;
        resolve_once(&mut slot, 4).unwrap();
        assert_eq!(
            resolve_once(&mut slot, 5),
            Err(GeneError::IdentityAlreadySet {
                current: 4,
                attempted: 5
            })
        );
        assert_eq!(slot, Some(4));
    }

    #[test]
    fn display() {
        assert_eq!(Identity::Permanent(12).to_string(), "12");
        assert!(Identity::provisional().to_string().starts_with('~'));
    }
}
