use crate::error::CoreResult;
use crate::types::{CredentialId, NymId};

// ---------------------------------------------------------------------------
// CredentialStore — blob storage keyed by credential ID
//
// The store holds opaque serialized credentials. It is injected into every
// load/persist operation as an explicit collaborator; the engine never
// reaches for ambient storage.
// ---------------------------------------------------------------------------

pub trait CredentialStore: Send + Sync {
    fn load(&self, id: &CredentialId) -> CoreResult<Option<Vec<u8>>>;
    fn store(&self, id: &CredentialId, blob: &[u8]) -> CoreResult<()>;
}

// ---------------------------------------------------------------------------
// NymIdSource — the externally-owned identity descriptor
//
// A credential set holds a shared handle to its owner's source of identity.
// The set derives its nym ID from the source at construction and never
// mutates it.
// ---------------------------------------------------------------------------

pub trait NymIdSource: Send + Sync {
    fn nym_id(&self) -> NymId;
    fn description(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify the trait objects are object-safe
    fn _assert_store_object_safe(_: &dyn CredentialStore) {}
    fn _assert_source_object_safe(_: &dyn NymIdSource) {}

    struct FixedSource;

    impl NymIdSource for FixedSource {
        fn nym_id(&self) -> NymId {
            NymId::new("nym-fixed")
        }
        fn description(&self) -> String {
            "fixed test source".to_string()
        }
    }

    #[test]
    fn test_source_yields_stable_id() {
        let source = FixedSource;
        assert_eq!(source.nym_id(), source.nym_id());
    }
}
