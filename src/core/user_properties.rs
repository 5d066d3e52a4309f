//! Caller identity properties carried in a [`RequestContext`]
//!
//! Every sink that enriches its output asks this module for the identity
//! values it is allowed to surface. Absence is never an error: a missing
//! context, a context without properties, and a disjoint allow-list all
//! produce `None`.

use super::context::RequestContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Closed set of identity keys a context may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserProperty {
    #[serde(rename = "userId", alias = "id", alias = "Id")]
    Id,
    #[serde(rename = "email", alias = "Email")]
    Email,
    #[serde(rename = "userName", alias = "name", alias = "Name")]
    Name,
}

impl UserProperty {
    pub const ALL: [UserProperty; 3] = [UserProperty::Id, UserProperty::Email, UserProperty::Name];

    /// Key used when the property is exported as a label or tag
    pub fn key(&self) -> &'static str {
        match self {
            UserProperty::Id => "userId",
            UserProperty::Email => "email",
            UserProperty::Name => "userName",
        }
    }
}

impl fmt::Display for UserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mapping from identity key to value, stored in the context's well-known slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProperties {
    values: HashMap<UserProperty, String>,
}

impl UserProperties {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, property: UserProperty, value: impl Into<String>) -> Self {
        self.values.insert(property, value.into());
        self
    }

    pub fn set(&mut self, property: UserProperty, value: impl Into<String>) {
        self.values.insert(property, value.into());
    }

    pub fn get(&self, property: UserProperty) -> Option<&str> {
        self.values.get(&property).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values that are both present and allowed, in allow-list order
    pub fn allowed<'a>(
        &'a self,
        allowed: &'a [UserProperty],
    ) -> impl Iterator<Item = (UserProperty, &'a str)> + 'a {
        allowed
            .iter()
            .filter_map(move |property| self.get(*property).map(|value| (*property, value)))
    }
}

impl FromIterator<(UserProperty, String)> for UserProperties {
    fn from_iter<I: IntoIterator<Item = (UserProperty, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Read the user property mapping from a context, if any
pub fn extract(context: Option<&RequestContext>) -> Option<&UserProperties> {
    context.and_then(|ctx| ctx.get::<UserProperties>())
}

/// Comma-separated allowed values present in the context, or `None`
///
/// ```
/// use rust_sink_logger::core::user_properties::{self, UserProperties, UserProperty};
/// use rust_sink_logger::RequestContext;
///
/// let ctx = RequestContext::new().with_user_properties(
///     UserProperties::new()
///         .with(UserProperty::Id, "u1")
///         .with(UserProperty::Email, "a@b.com"),
/// );
///
/// assert_eq!(
///     user_properties::format(Some(&ctx), &[UserProperty::Email]),
///     Some("a@b.com".to_string())
/// );
/// assert_eq!(user_properties::format(None, &[UserProperty::Email]), None);
/// ```
pub fn format(context: Option<&RequestContext>, allowed: &[UserProperty]) -> Option<String> {
    if allowed.is_empty() {
        return None;
    }

    let properties = extract(context)?;
    let values: Vec<&str> = properties.allowed(allowed).map(|(_, value)| value).collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

pub fn contains(allowed: &[UserProperty], property: UserProperty) -> bool {
    allowed.contains(&property)
}
