use url::Url;
use uuid::Uuid;

use crate::error::Result;
use crate::id::ResourceId;

const UNIQUENESS_PARAM: &str = "random";

/// Builds unique locators from a base URL.
///
/// Each call to [`LocatorTemplate::next_id`] appends `random=<uuid>` so that
/// the remote service hands back a different image for every identifier.
#[derive(Debug, Clone)]
pub struct LocatorTemplate {
    base: Url,
}

impl LocatorTemplate {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn next_id(&self) -> ResourceId {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(UNIQUENESS_PARAM, &Uuid::new_v4().to_string());
        ResourceId::from(String::from(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_uniqueness_parameter() {
        let template = LocatorTemplate::new("https://picsum.photos/200/200").unwrap();
        let id = template.next_id();
        let url = Url::parse(id.as_str()).unwrap();
        assert_eq!(url.path(), "/200/200");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, UNIQUENESS_PARAM);
        assert!(Uuid::parse_str(&value).is_ok());
    }

    #[test]
    fn consecutive_ids_differ() {
        let template = LocatorTemplate::new("https://picsum.photos/200/200").unwrap();
        assert_ne!(template.next_id(), template.next_id());
    }

    #[test]
    fn rejects_relative_base() {
        let err = LocatorTemplate::new("not a url").unwrap_err();
        assert!(matches!(err, crate::PhotoBoardError::InvalidUrl(_)));
    }
}
