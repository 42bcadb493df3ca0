//! Per-entry property store.
//!
//! Properties are `(namespace, local-name) -> value` pairs kept apart from
//! the core attributes. Two classes exist:
//!
//! - **Dead** properties are stored verbatim in a [`PropertyMap`] and can be
//!   set or removed freely by a patch.
//! - **Live** properties (`DAV:getcontentlength`, `DAV:getlastmodified`,
//!   `DAV:resourcetype`) are computed from the entry on every read and refuse
//!   patches.
//!
//! `DAV:displayname` sits in between: it is stored, but mirrors the entry's
//! display name and is only ever written through
//! [`Entry::set_display_name`](crate::Entry::set_display_name).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use crate::types::FileType;

/// The WebDAV namespace.
pub const DAV_NS: &str = "DAV:";

/// Local names of the live properties, in the order they are reported.
const LIVE_PROPERTIES: [&str; 3] = ["getcontentlength", "getlastmodified", "resourcetype"];

/// A namespaced property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropName {
    pub namespace: String,
    pub local: String,
}

impl PropName {
    /// Create a property name.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// A name in the `DAV:` namespace.
    pub fn dav(local: impl Into<String>) -> Self {
        Self::new(DAV_NS, local)
    }

    /// `DAV:displayname`.
    pub fn display_name() -> Self {
        Self::dav("displayname")
    }

    /// True for `DAV:displayname`.
    pub fn is_display_name(&self) -> bool {
        self.namespace == DAV_NS && self.local == "displayname"
    }

    /// True for properties computed from the entry and never stored.
    pub fn is_live(&self) -> bool {
        self.namespace == DAV_NS && LIVE_PROPERTIES.contains(&self.local.as_str())
    }
}

impl fmt::Display for PropName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

/// An opaque property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl PropValue {
    /// Raw bytes of the value.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PropValue::Text(s) => s.as_bytes(),
            PropValue::Bytes(b) => b,
        }
    }

    /// The value as text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            PropValue::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(b: Vec<u8>) -> Self {
        PropValue::Bytes(b)
    }
}

/// A name/value pair as returned by `read_properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: PropName,
    pub value: PropValue,
}

impl Property {
    pub fn new(name: PropName, value: impl Into<PropValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Stored (dead) properties of one entry, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    props: IndexMap<PropName, PropValue>,
}

impl PropertyMap {
    /// A map seeded with `DAV:displayname`.
    pub fn with_display_name(display_name: &str) -> Self {
        let mut props = IndexMap::new();
        props.insert(PropName::display_name(), PropValue::from(display_name));
        Self { props }
    }

    pub fn get(&self, name: &PropName) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Insert or replace. Existing names keep their position.
    pub fn set(&mut self, name: PropName, value: PropValue) {
        self.props.insert(name, value);
    }

    /// Remove a property, keeping the order of the rest.
    pub fn remove(&mut self, name: &PropName) -> Option<PropValue> {
        self.props.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropName, &PropValue)> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// One property patch instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropPatch {
    Set(PropName, PropValue),
    Remove(PropName),
}

impl PropPatch {
    pub fn set(name: PropName, value: impl Into<PropValue>) -> Self {
        PropPatch::Set(name, value.into())
    }

    pub fn remove(name: PropName) -> Self {
        PropPatch::Remove(name)
    }

    /// The property this patch targets.
    pub fn name(&self) -> &PropName {
        match self {
            PropPatch::Set(name, _) | PropPatch::Remove(name) => name,
        }
    }
}

/// Outcome of applying one patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PropStatus {
    /// Applied.
    Ok,
    /// Protected property; nothing changed.
    Forbidden,
    /// Value rejected for this property; nothing changed.
    Conflict,
}

impl PropStatus {
    /// HTTP status code for a multistatus response.
    pub fn http_code(&self) -> u16 {
        match self {
            PropStatus::Ok => 200,
            PropStatus::Forbidden => 403,
            PropStatus::Conflict => 409,
        }
    }
}

/// Per-property patch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropStat {
    pub name: PropName,
    pub status: PropStatus,
}

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    let dt: DateTime<Utc> = time.into();
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Compute the live properties of an entry.
pub(crate) fn live_properties(kind: FileType, size: u64, mtime: SystemTime) -> Vec<Property> {
    let resource_type = match kind {
        FileType::Directory => "<D:collection/>",
        FileType::File => "",
    };
    vec![
        Property::new(PropName::dav("getcontentlength"), size.to_string()),
        Property::new(PropName::dav("getlastmodified"), http_date(mtime)),
        Property::new(PropName::dav("resourcetype"), resource_type),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_prop_name_classes() {
        assert!(PropName::display_name().is_display_name());
        assert!(!PropName::display_name().is_live());
        assert!(PropName::dav("getcontentlength").is_live());
        assert!(!PropName::new("urn:x", "getcontentlength").is_live());
        assert_eq!(PropName::dav("resourcetype").to_string(), "{DAV:}resourcetype");
    }

    #[test]
    fn test_map_preserves_order() {
        let mut map = PropertyMap::with_display_name("Notes");
        map.set(PropName::new("urn:x", "a"), "1".into());
        map.set(PropName::new("urn:x", "b"), "2".into());
        map.set(PropName::new("urn:x", "a"), "3".into());

        let names: Vec<_> = map.iter().map(|(n, _)| n.local.clone()).collect();
        assert_eq!(names, vec!["displayname", "a", "b"]);
        assert_eq!(map.get(&PropName::new("urn:x", "a")), Some(&PropValue::from("3")));

        map.remove(&PropName::new("urn:x", "a"));
        let names: Vec<_> = map.iter().map(|(n, _)| n.local.clone()).collect();
        assert_eq!(names, vec!["displayname", "b"]);
    }

    #[test]
    fn test_prop_value_text() {
        assert_eq!(PropValue::from("x").as_text(), Some("x"));
        assert_eq!(PropValue::Bytes(vec![0xff]).as_text(), None);
        assert_eq!(PropValue::Bytes(b"ok".to_vec()).as_text(), Some("ok"));
    }

    #[test]
    fn test_http_date() {
        let t = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_live_properties() {
        let props = live_properties(FileType::Directory, 0, UNIX_EPOCH);
        assert_eq!(props.len(), 3);
        assert_eq!(props[0].value.as_text(), Some("0"));
        assert_eq!(props[2].value.as_text(), Some("<D:collection/>"));
    }

    #[test]
    fn test_prop_status() {
        assert_eq!(PropStatus::Ok.http_code(), 200);
        assert_eq!(PropStatus::Forbidden.http_code(), 403);
        assert_eq!(PropStatus::Conflict.to_string(), "conflict");
    }
}
