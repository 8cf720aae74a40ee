use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RenderConfig;
use crate::notification::Notification;
use crate::template::{runs_to_string, StyledRun, SubstitutionEngine};

/// What clicking a row header does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "uri", rename_all = "camelCase")]
pub enum ClickAction {
    OpenLink(String),
}

/// Icon to load for a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconRequest {
    pub uri: String,
}

/// Display-ready form of one notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub id: i64,
    pub datetime: DateTime<Utc>,
    /// Header as plain text
    pub header_text: String,
    pub header_runs: Vec<StyledRun>,
    pub header_action: Option<ClickAction>,
    pub body_styled_runs: Vec<StyledRun>,
    pub body_opacity: f32,
    pub icon_request: Option<IconRequest>,
}

/// Builds render models from notifications
#[derive(Debug, Clone)]
pub struct Renderer {
    engine: SubstitutionEngine,
    message_opacity: f32,
    link_arrow: String,
}

impl Renderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            engine: SubstitutionEngine::new(config.emphasis_color).with_name_scan(config.name_scan),
            message_opacity: config.message_opacity,
            link_arrow: config.link_arrow.clone(),
        }
    }

    /// Build the model for one notification.
    ///
    /// A link wins over a rich subject: the header becomes the plain subject with
    /// an arrow, in bold, and opens the link when clicked. Otherwise a rich
    /// subject is substituted, and failing that the plain subject is shown as is.
    pub fn build(&self, notification: &Notification) -> RenderModel {
        let (header_runs, header_action) = match notification.link() {
            Some(link) => (
                vec![StyledRun::bold(format!(
                    "{} {}",
                    notification.subject, self.link_arrow
                ))],
                Some(ClickAction::OpenLink(link.to_string())),
            ),
            None => match notification.subject_rich() {
                Some(template) => (
                    self.engine
                        .substitute(template, &notification.subject_rich_parameters),
                    None,
                ),
                None => (vec![StyledRun::plain(notification.subject.clone())], None),
            },
        };

        RenderModel {
            id: notification.id,
            datetime: notification.datetime,
            header_text: runs_to_string(&header_runs),
            header_runs,
            header_action,
            body_styled_runs: vec![StyledRun::plain(notification.message.clone())],
            body_opacity: self.message_opacity,
            icon_request: notification.icon().map(|uri| IconRequest {
                uri: uri.to_string(),
            }),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::RichObject;
    use crate::template::Color;

    #[test]
    fn test_link_takes_precedence() {
        let notification = Notification::builder(1, "New file")
            .subject_rich("{user} shared a file")
            .parameter(RichObject::new("user", "Alice", "user"))
            .link("https://x")
            .build();

        let model = Renderer::default().build(&notification);

        assert_eq!(model.header_text, "New file ↗");
        assert_eq!(model.header_runs, vec![StyledRun::bold("New file ↗")]);
        assert_eq!(
            model.header_action,
            Some(ClickAction::OpenLink("https://x".to_string()))
        );
        assert_eq!(model.icon_request, None);
    }

    #[test]
    fn test_rich_subject_is_substituted() {
        let config = RenderConfig {
            emphasis_color: Color::rgb(0x11, 0x22, 0x33),
            ..RenderConfig::default()
        };
        let notification = Notification::builder(2, "Alice shared report.pdf")
            .subject_rich("{user} shared {file}")
            .parameter(RichObject::new("user", "Alice", "user"))
            .parameter(RichObject::new("file", "report.pdf", "file"))
            .build();

        let model = Renderer::new(&config).build(&notification);

        assert_eq!(model.header_text, "Alice shared report.pdf");
        assert_eq!(
            model.header_runs,
            vec![
                StyledRun::emphasized("Alice", Color::rgb(0x11, 0x22, 0x33)),
                StyledRun::plain(" shared "),
                StyledRun::emphasized("report.pdf", Color::rgb(0x11, 0x22, 0x33)),
            ]
        );
        assert_eq!(model.header_action, None);
    }

    #[test]
    fn test_plain_subject_verbatim() {
        let notification = Notification::builder(3, "Quota {almost} full").build();
        let model = Renderer::default().build(&notification);

        assert_eq!(model.header_runs, vec![StyledRun::plain("Quota {almost} full")]);
    }

    #[test]
    fn test_message_and_icon() {
        let notification = Notification::builder(4, "Update")
            .message("Version 2 is available")
            .icon("https://cloud.example.com/img/update.svg")
            .build();

        let model = Renderer::default().build(&notification);

        assert_eq!(model.body_styled_runs, vec![StyledRun::plain("Version 2 is available")]);
        assert!((model.body_opacity - 0.57).abs() < f32::EPSILON);
        assert_eq!(
            model.icon_request,
            Some(IconRequest {
                uri: "https://cloud.example.com/img/update.svg".to_string()
            })
        );
    }

    #[test]
    fn test_empty_link_and_icon_are_ignored() {
        let notification = Notification::builder(5, "Hello").link("").icon("").build();
        let model = Renderer::default().build(&notification);

        assert_eq!(model.header_action, None);
        assert_eq!(model.icon_request, None);
    }
}
