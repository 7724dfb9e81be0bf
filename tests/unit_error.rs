use std::path::PathBuf;

use td::error::{exit_codes, Error, ErrorKind, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let validation = Error::MissingField("text".to_string());
    assert_eq!(validation.exit_code(), exit_codes::USER_ERROR);

    let permission = Error::NotSignedIn;
    assert_eq!(permission.exit_code(), exit_codes::PERMISSION_BLOCKED);

    let not_found = Error::TaskNotFound("t1".to_string());
    assert_eq!(not_found.exit_code(), exit_codes::USER_ERROR);

    let network = Error::LockFailed(PathBuf::from("tasks.json.lock"));
    assert_eq!(network.exit_code(), exit_codes::OPERATION_FAILED);

    let unknown = Error::OperationFailed("boom".to_string());
    assert_eq!(unknown.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn every_error_lands_in_one_taxonomy_kind() {
    assert_eq!(Error::PasswordMismatch.kind(), ErrorKind::Validation);
    assert_eq!(
        Error::EmailInUse("ana@example.com".to_string()).kind(),
        ErrorKind::Permission
    );
    assert_eq!(
        Error::NotOwner {
            id: "t1".to_string()
        }
        .kind(),
        ErrorKind::Permission
    );
    assert_eq!(Error::ProfileNotFound.kind(), ErrorKind::NotFound);
    assert_eq!(
        Error::AccountNotFound("ana@example.com".to_string()).kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        Error::Io(std::io::Error::other("offline")).kind(),
        ErrorKind::Network
    );
}

#[test]
fn json_error_includes_code_and_kind() {
    let err = Error::TaskNotFound("t1".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.kind, "not_found");
    assert!(json.error.contains("Task not found"));
}
