use serde::Deserialize;

/// A collection response from the backend.
///
/// Some endpoints return a bare JSON array, paged ones wrap the array in a
/// `content` field next to paging metadata. Both shapes decode into this type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page(Page<T>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Items(items) => items,
            Listing::Page(page) => &page.content,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Items(items) => items,
            Listing::Page(page) => page.content,
        }
    }

    pub fn total_pages(&self) -> Option<u32> {
        match self {
            Listing::Items(_) => None,
            Listing::Page(page) => page.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Tag {
        id: u32,
        name: String,
    }

    #[test]
    fn test_bare_array() {
        let listing: Listing<Tag> =
            serde_json::from_str(r#"[{"id": 1, "name": "romance"}]"#).unwrap();
        assert_eq!(listing.total_pages(), None);
        assert_eq!(
            listing.into_items(),
            vec![Tag {
                id: 1,
                name: "romance".to_string()
            }]
        );
    }

    #[test]
    fn test_paged_object() {
        let listing: Listing<Tag> = serde_json::from_str(
            r#"{
                "content": [{"id": 2, "name": "fantasy"}, {"id": 3, "name": "action"}],
                "totalPages": 4,
                "totalElements": 38,
                "number": 0,
                "size": 10,
                "sort": {"sorted": true}
            }"#,
        )
        .unwrap();
        assert_eq!(listing.total_pages(), Some(4));
        assert_eq!(listing.items().len(), 2);
        assert_eq!(listing.items()[1].name, "action");
    }

    #[test]
    fn test_paged_object_without_metadata() {
        let listing: Listing<Tag> = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(listing.items().is_empty());
        assert_eq!(listing.total_pages(), None);
    }

    #[test]
    fn test_other_shapes_are_rejected() {
        assert!(serde_json::from_str::<Listing<Tag>>(r#"{"data": []}"#).is_err());
        assert!(serde_json::from_str::<Listing<Tag>>("null").is_err());
    }
}
