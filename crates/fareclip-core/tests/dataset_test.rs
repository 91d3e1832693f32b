use fareclip_core::{AirlineCatalog, CityRegistry, ConfigError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_registry_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "cities": [
                {{ "name": "Hà Nội", "code": "HAN", "aliases": ["hanoi"], "country": "Vietnam" }},
                {{ "name": "Đà Nẵng", "code": "DAD", "country": "Vietnam" }},
                {{ "name": "Đà Nẵng", "code": "DAD", "country": "Vietnam" }}
            ]
        }}"#
    )
    .unwrap();

    let registry = CityRegistry::from_file(file.path()).unwrap();
    assert_eq!(registry.cities().len(), 2, "duplicate (name, code) dropped");
    assert!(registry.contains_key("hanoi"));
}

#[test]
fn test_registry_missing_file_is_fatal() {
    let err = CityRegistry::from_file("does/not/exist/cities.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_registry_malformed_file_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = CityRegistry::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed(_)));
}

#[test]
fn test_registry_empty_dataset_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "cities": [] }}"#).unwrap();
    let err = CityRegistry::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyCities));
}

#[test]
fn test_catalog_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "airlines": [
                {{ "name": "Vietjet Air", "code": "VJ", "logo": "vj.png", "luggage": "7kg", "meal": false }},
                {{ "name": "Vietnam Airlines", "code": "VN", "meal": true }}
            ]
        }}"#
    )
    .unwrap();

    let catalog = AirlineCatalog::from_file(file.path()).unwrap();
    assert_eq!(catalog.airlines().len(), 2);
    assert_eq!(catalog.get("Vietjet Air").unwrap().logo_path, "vj.png");
    assert!(catalog.get("Vietnam Airlines").unwrap().meal_included);
}

#[test]
fn test_catalog_empty_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "airlines": [] }}"#).unwrap();
    let err = AirlineCatalog::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyAirlines));
}
