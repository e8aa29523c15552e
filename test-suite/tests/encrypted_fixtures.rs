//! Encrypted documents written by the engine and read back

use pdfmodel::{
    Algorithm, Encrypt, EncryptOptions, ErrorCategory, KeyLength, LoadState, PdfError, Permission,
};
use pdfmodel_test_suite::utils::{create_test_output_dir, load_bytes, load_path, write_fixture};
use pdfmodel_test_suite::TestPdfBuilder;
use pretty_assertions::assert_eq;

const OWNER: &str = "owner-secret";
const USER: &str = "reader";

fn protected(algorithm: Algorithm, key_length: KeyLength, user: Option<&str>) -> Vec<u8> {
    let pdf = TestPdfBuilder::new()
        .with_text_pages(3)
        .with_title("Quarterly report")
        .with_compression(true)
        .build();
    let mut doc = load_bytes(&pdf, None).unwrap();
    let mut options = EncryptOptions::new(OWNER)
        .algorithm(algorithm)
        .key_length(key_length)
        .allow(Permission::Print)
        .allow(Permission::DocAssembly);
    if let Some(user) = user {
        options = options.user_password(user);
    }
    doc.set_encrypt(Encrypt::new(options).unwrap()).unwrap();
    doc.write_to_buffer().unwrap()
}

const MATRIX: [(Algorithm, KeyLength); 5] = [
    (Algorithm::Rc4V1, KeyLength::Bits40),
    (Algorithm::Rc4V2, KeyLength::Bits40),
    (Algorithm::Rc4V2, KeyLength::Bits128),
    (Algorithm::AesV2, KeyLength::Bits128),
    (Algorithm::AesV3, KeyLength::Bits256),
];

#[test]
fn test_missing_password_is_invalid_password() {
    for (algorithm, key_length) in MATRIX {
        let bytes = protected(algorithm, key_length, Some(USER));
        let err = load_bytes(&bytes, None).unwrap_err();
        assert!(
            matches!(err, PdfError::InvalidPassword),
            "{algorithm}/{key_length:?}: {err:?}"
        );
        assert_eq!(err.category(), ErrorCategory::Authentication);

        assert!(matches!(
            load_bytes(&bytes, Some("wrong")),
            Err(PdfError::InvalidPassword)
        ));
    }
}

#[test]
fn test_user_and_owner_passwords_open() {
    for (algorithm, key_length) in MATRIX {
        let bytes = protected(algorithm, key_length, Some(USER));
        for password in [USER, OWNER] {
            let doc = load_bytes(&bytes, Some(password)).unwrap();
            assert_eq!(doc.get_page_count().unwrap(), 3, "{algorithm} with {password}");
            let contents = doc.get_page(2).unwrap().get_contents(false).unwrap();
            assert!(String::from_utf8_lossy(&contents).contains("(Page 3) Tj"));
        }
    }
}

#[test]
fn test_empty_user_password_opens_without_credentials() {
    for (algorithm, key_length) in MATRIX {
        let bytes = protected(algorithm, key_length, None);
        let doc = load_bytes(&bytes, None).unwrap();
        assert_eq!(doc.get_page_count().unwrap(), 3);
    }
}

#[test]
fn test_derived_encrypt_reports_configuration() {
    for (algorithm, key_length) in MATRIX {
        let bytes = protected(algorithm, key_length, Some(USER));
        let doc = load_bytes(&bytes, Some(USER)).unwrap();
        let encrypt = doc.encrypt().unwrap().expect("encrypted document");

        assert!(encrypt.is_derived());
        assert_eq!(encrypt.algorithm(), Some(algorithm));
        assert_eq!(encrypt.key_length(), key_length.bits());
        assert!(encrypt.is_allowed(Permission::Print));
        assert!(encrypt.is_allowed(Permission::DocAssembly));
        assert!(!encrypt.is_allowed(Permission::Edit));
        assert!(!encrypt.is_allowed(Permission::Copy));
        assert!(doc.is_allowed(Permission::Print).unwrap());
        assert!(matches!(
            encrypt.require_options(),
            Err(PdfError::MissingEncryptOptions)
        ));
    }
}

#[test]
fn test_metadata_strings_are_decrypted() {
    let bytes = protected(Algorithm::AesV2, KeyLength::Bits128, Some(USER));
    // Neither the title nor the page text appear in clear
    assert!(!bytes.windows(9).any(|w| w == b"Quarterly"));

    let doc = load_bytes(&bytes, Some(USER)).unwrap();
    let info = doc
        .get_trailer()
        .unwrap()
        .as_dictionary()
        .unwrap()
        .get_key("Info")
        .unwrap()
        .as_dictionary()
        .unwrap();
    assert_eq!(info.get_key("Title").unwrap().as_string().unwrap(), "Quarterly report");
}

#[tokio::test]
async fn test_encrypted_file_round_trip_keeps_handler() {
    let dir = create_test_output_dir().unwrap();
    let bytes = protected(Algorithm::Rc4V2, KeyLength::Bits128, Some(USER));
    let source = write_fixture(dir.path(), "locked.pdf", &bytes).unwrap();
    let output = dir.path().join("edited.pdf");

    let err = load_path(&source, None).await.unwrap_err();
    assert!(matches!(err, PdfError::InvalidPassword));

    let mut doc = load_path(&source, Some(USER)).await.unwrap();
    doc.delete_page(1).unwrap();
    doc.write_to(&output).await.unwrap();

    assert!(matches!(
        load_path(&output, None).await,
        Err(PdfError::InvalidPassword)
    ));
    let edited = load_path(&output, Some(OWNER)).await.unwrap();
    assert_eq!(edited.state(), LoadState::Ready);
    assert_eq!(edited.get_page_count().unwrap(), 2);
}

#[test]
fn test_invalid_option_combinations() {
    let pdf = TestPdfBuilder::minimal().build();
    let doc = load_bytes(&pdf, None).unwrap();
    assert!(doc.encrypt().unwrap().is_none());
    assert!(doc.is_allowed(Permission::Edit).unwrap());

    for (algorithm, key_length) in [
        (Algorithm::Rc4V1, KeyLength::Bits128),
        (Algorithm::AesV2, KeyLength::Bits256),
        (Algorithm::AesV3, KeyLength::Bits40),
    ] {
        let options = EncryptOptions::new(OWNER)
            .algorithm(algorithm)
            .key_length(key_length);
        assert!(matches!(
            Encrypt::new(options),
            Err(PdfError::InvalidEncryptOptions(_))
        ));
    }
}
