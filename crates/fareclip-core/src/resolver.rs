use crate::registry::City;

/// Decides which airport a matched city name refers to when the registry
/// holds several candidates and no embedded code disambiguates them.
///
/// The interactive application backs this with a selection dialog; headless
/// and test deployments inject a deterministic implementation. Returning
/// `None` means "leave unresolved": the pipeline keeps the raw string and
/// records a warning, it never treats this as fatal.
pub trait AirportResolver: Send + Sync {
    fn resolve<'a>(&self, candidates: &'a [City]) -> Option<&'a City>;
}

/// Default non-interactive strategy: the first candidate wins.
#[derive(Debug, Default)]
pub struct FirstCandidate;

impl AirportResolver for FirstCandidate {
    fn resolve<'a>(&self, candidates: &'a [City]) -> Option<&'a City> {
        candidates.first()
    }
}

/// Never decides; every ambiguous endpoint stays raw with a warning.
#[derive(Debug, Default)]
pub struct Unresolved;

impl AirportResolver for Unresolved {
    fn resolve<'a>(&self, _candidates: &'a [City]) -> Option<&'a City> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(code: &str) -> City {
        City {
            name: "London".to_string(),
            normalized_key: "london".to_string(),
            code: code.to_string(),
            aliases: vec![],
            country: "UK".to_string(),
        }
    }

    #[test]
    fn test_first_candidate() {
        let candidates = [city("LHR"), city("LGW")];
        let picked = FirstCandidate.resolve(&candidates).unwrap();
        assert_eq!(picked.code, "LHR");
        assert!(FirstCandidate.resolve(&[]).is_none());
    }

    #[test]
    fn test_unresolved() {
        let candidates = [city("LHR"), city("LGW")];
        assert!(Unresolved.resolve(&candidates).is_none());
    }
}
