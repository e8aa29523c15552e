//! Permission model of fresh and derived `Encrypt` instances

use pdfmodel::objects::{Dictionary, Object};
use pdfmodel::{Algorithm, Encrypt, EncryptOptions, KeyLength, Permission, Permissions, PdfError};
use proptest::prelude::*;

fn permission_subset() -> impl Strategy<Value = Vec<Permission>> {
    proptest::sample::subsequence(Permission::ALL.to_vec(), 0..=Permission::ALL.len())
}

proptest! {
    #[test]
    fn prop_fresh_instance_allows_exactly_its_set(granted in permission_subset()) {
        let encrypt = Encrypt::new(EncryptOptions::new("owner").allow_all(granted.clone())).unwrap();
        for permission in Permission::ALL {
            prop_assert_eq!(encrypt.is_allowed(permission), granted.contains(&permission));
        }
        prop_assert!(!encrypt.is_derived());
    }

    #[test]
    fn prop_p_value_keeps_every_grant(granted in permission_subset()) {
        let set: Permissions = granted.iter().copied().collect();
        let recovered = Permissions::from_p_value(set.to_p_value());
        for permission in &granted {
            prop_assert!(recovered.allows(*permission));
        }
    }
}

#[test]
fn test_derived_instance_reads_p() {
    let mut dict = Dictionary::new();
    dict.set("Filter", Object::name("Standard"));
    dict.set("V", 4);
    dict.set("R", 4);
    dict.set("Length", 128);
    let set: Permissions = [Permission::Print, Permission::DocAssembly].into_iter().collect();
    dict.set("P", set.to_p_value());

    let encrypt = Encrypt::from_dictionary(&dict).unwrap();
    assert!(encrypt.is_derived());
    assert!(encrypt.is_allowed(Permission::Print));
    assert!(encrypt.is_allowed(Permission::DocAssembly));
    assert!(!encrypt.is_allowed(Permission::Edit));
    assert_eq!(encrypt.key_length(), 128);
    assert!(matches!(
        encrypt.require_options(),
        Err(PdfError::MissingEncryptOptions)
    ));
}

#[test]
fn test_key_length_matrix() {
    let cases = [
        (Algorithm::Rc4V1, KeyLength::Bits40, true),
        (Algorithm::Rc4V1, KeyLength::Bits128, false),
        (Algorithm::Rc4V2, KeyLength::Bits40, true),
        (Algorithm::Rc4V2, KeyLength::Bits128, true),
        (Algorithm::AesV2, KeyLength::Bits128, true),
        (Algorithm::AesV2, KeyLength::Bits256, false),
        (Algorithm::AesV3, KeyLength::Bits256, true),
        (Algorithm::AesV3, KeyLength::Bits128, false),
    ];
    for (algorithm, key_length, valid) in cases {
        let options = EncryptOptions::new("owner")
            .algorithm(algorithm)
            .key_length(key_length);
        assert_eq!(Encrypt::new(options).is_ok(), valid, "{algorithm} {key_length:?}");
    }
}

#[test]
fn test_empty_owner_password_is_rejected() {
    assert!(matches!(
        Encrypt::new(EncryptOptions::new("")),
        Err(PdfError::InvalidEncryptOptions(_))
    ));
}
