//! Key selection.
//!
//! Until there is a rule deciding WHICH key of a given usage is the right
//! one, selection is first-found in stored (credential-ID) order, skipping
//! any credential on the caller's exclusion list. This is a documented
//! simplification, not a ranking.

use crate::credential::Credential;
use crate::error::{CredError, CredResult};
use crate::keypair::Keypair;
use nymcred_core::{CredentialId, KeyUsage};

/// Select the keypair of the requested usage: the first key-bearing child
/// not on the exclusion list, falling back to the master's keypair.
///
/// The master fallback exists purely for compatibility with sets that
/// predate child key credentials; masters are not supposed to serve
/// ordinary operations.
pub fn select_keypair<'a, I>(
    children: I,
    master: &'a Credential,
    usage: KeyUsage,
    excluded: Option<&[CredentialId]>,
) -> CredResult<&'a Keypair>
where
    I: Iterator<Item = &'a Credential>,
{
    for child in children {
        let bundle = match child.keys() {
            Some(b) => b,
            None => continue, // not a key credential
        };

        if let Some(excluded) = excluded {
            if excluded.contains(child.id()) {
                continue;
            }
        }

        return Ok(bundle.get(usage));
    }

    master
        .keys()
        .map(|b| b.get(usage))
        .ok_or(CredError::NoUsableKey(usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::ContactData;
    use crate::keypair::KeyParams;
    use nymcred_core::{NymId, Passphrase};

    fn pass(s: &str) -> Passphrase {
        Passphrase::new(s)
    }

    fn master() -> Credential {
        Credential::new_master(NymId::new("nym-1"), &KeyParams::default(), &pass("p")).unwrap()
    }

    fn child_key(m: &Credential) -> Credential {
        Credential::new_child_key(m, &KeyParams::default(), &pass("p"), &pass("p")).unwrap()
    }

    #[test]
    fn test_selects_first_child_key() {
        let m = master();
        let child = child_key(&m);
        let children = vec![child.clone()];

        let kp = select_keypair(children.iter(), &m, KeyUsage::Signing, None).unwrap();
        assert_eq!(
            kp.public_key(),
            child.keys().unwrap().signing.public_key()
        );
    }

    #[test]
    fn test_skips_non_key_credentials() {
        let m = master();
        let contact = Credential::new_contact(&m, ContactData::default(), &pass("p")).unwrap();
        let child = child_key(&m);
        let children = vec![contact, child.clone()];

        let kp = select_keypair(children.iter(), &m, KeyUsage::Encryption, None).unwrap();
        assert_eq!(
            kp.public_key(),
            child.keys().unwrap().encryption.public_key()
        );
    }

    #[test]
    fn test_exclusion_list_filters_revoked() {
        let m = master();
        let c1 = child_key(&m);
        let c2 = child_key(&m);
        let mut children = vec![c1.clone(), c2.clone()];
        children.sort_by(|a, b| a.id().cmp(b.id()));

        let first = children[0].clone();
        let second = children[1].clone();

        let excluded = vec![first.id().clone()];
        let kp =
            select_keypair(children.iter(), &m, KeyUsage::Signing, Some(&excluded)).unwrap();
        assert_eq!(
            kp.public_key(),
            second.keys().unwrap().signing.public_key()
        );
    }

    #[test]
    fn test_falls_back_to_master_keypair() {
        let m = master();
        let children: Vec<Credential> = Vec::new();

        let kp = select_keypair(children.iter(), &m, KeyUsage::Authentication, None).unwrap();
        assert_eq!(
            kp.public_key(),
            m.keys().unwrap().authentication.public_key()
        );
    }

    #[test]
    fn test_all_children_excluded_falls_back_to_master() {
        let m = master();
        let child = child_key(&m);
        let excluded = vec![child.id().clone()];
        let children = vec![child];

        let kp =
            select_keypair(children.iter(), &m, KeyUsage::Signing, Some(&excluded)).unwrap();
        assert_eq!(kp.public_key(), m.keys().unwrap().signing.public_key());
    }
}
