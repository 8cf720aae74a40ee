use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A named entity (user, file, calendar event...) referenced from a rich subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichObject {
    /// Lookup key, matches the text between braces in the rich subject
    #[serde(default)]
    pub key: String,
    /// Display name substituted into the subject
    pub name: String,
    /// Object kind as reported by the server (e.g. "user", "file")
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl RichObject {
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Rich object table keyed by placeholder name
pub type RichParameters = HashMap<String, RichObject>;

/// A single notification entry as supplied by the notification API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server-side notification identifier
    #[serde(alias = "notificationId")]
    pub id: i64,
    /// When the notification was created
    pub datetime: DateTime<Utc>,
    /// Plain subject line
    #[serde(default)]
    pub subject: String,
    /// Subject containing `{key}` placeholders (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_rich: Option<String>,
    /// Rich objects referenced from `subject_rich`
    #[serde(default, deserialize_with = "deserialize_rich_parameters")]
    pub subject_rich_parameters: RichParameters,
    /// Message body
    #[serde(default)]
    pub message: String,
    /// External link opened when the subject is clicked (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Icon URI, expected to point at an SVG document (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Notification {
    /// Start building a notification with the given id and subject
    pub fn builder(id: i64, subject: impl Into<String>) -> NotificationBuilder {
        NotificationBuilder::new(id, subject)
    }

    /// Link, if present and non-empty
    pub fn link(&self) -> Option<&str> {
        non_empty(self.link.as_deref())
    }

    /// Rich subject, if present and non-empty
    pub fn subject_rich(&self) -> Option<&str> {
        non_empty(self.subject_rich.as_deref())
    }

    /// Icon URI, if present and non-empty
    pub fn icon(&self) -> Option<&str> {
        non_empty(self.icon.as_deref())
    }
}

/// The API encodes an empty parameter table as `[]`
fn deserialize_rich_parameters<'de, D>(deserializer: D) -> Result<RichParameters, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Table {
        Map(RichParameters),
        List(Vec<serde::de::IgnoredAny>),
    }

    match Table::deserialize(deserializer)? {
        Table::Map(parameters) => Ok(parameters),
        Table::List(items) if items.is_empty() => Ok(RichParameters::new()),
        Table::List(items) => Err(serde::de::Error::invalid_length(
            items.len(),
            &"an object or an empty array",
        )),
    }
}

/// Accepted shapes of a notification list document
#[derive(Deserialize)]
#[serde(untagged)]
enum NotificationList {
    Plain(Vec<serde_json::Value>),
    Envelope { ocs: OcsData },
}

#[derive(Deserialize)]
struct OcsData {
    data: Vec<serde_json::Value>,
}

/// Parse a notification list: either a bare JSON array or the API response
/// envelope `{"ocs": {"data": [...]}}`.
///
/// Malformed entries are skipped with a warning; only a malformed document
/// is an error.
pub fn parse_notification_list(json: &str) -> Result<Vec<Notification>, serde_json::Error> {
    let items = match serde_json::from_str(json)? {
        NotificationList::Plain(items) => items,
        NotificationList::Envelope { ocs } => ocs.data,
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(notification) => Some(notification),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed notification entry");
                None
            }
        })
        .collect())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Builder for creating notifications
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    id: i64,
    datetime: DateTime<Utc>,
    subject: String,
    subject_rich: Option<String>,
    subject_rich_parameters: RichParameters,
    message: String,
    link: Option<String>,
    icon: Option<String>,
}

impl NotificationBuilder {
    /// Create a new notification builder
    pub fn new(id: i64, subject: impl Into<String>) -> Self {
        Self {
            id,
            datetime: Utc::now(),
            subject: subject.into(),
            subject_rich: None,
            subject_rich_parameters: RichParameters::new(),
            message: String::new(),
            link: None,
            icon: None,
        }
    }

    /// Set the creation time
    pub fn datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = datetime;
        self
    }

    /// Set the rich subject template
    pub fn subject_rich(mut self, subject_rich: impl Into<String>) -> Self {
        self.subject_rich = Some(subject_rich.into());
        self
    }

    /// Add a rich object parameter, keyed by its own key
    pub fn parameter(mut self, object: RichObject) -> Self {
        self.subject_rich_parameters
            .insert(object.key.clone(), object);
        self
    }

    /// Set the message body
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the external link
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Set the icon URI
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Build the notification
    pub fn build(self) -> Notification {
        Notification {
            id: self.id,
            datetime: self.datetime,
            subject: self.subject,
            subject_rich: self.subject_rich,
            subject_rich_parameters: self.subject_rich_parameters,
            message: self.message,
            link: self.link,
            icon: self.icon,
        }
    }
}
