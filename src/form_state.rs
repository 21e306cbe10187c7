use std::path::Path;

use chrono::NaiveDate;
use reqwest::Url;

use crate::error::{ConfigError, FormError, TransportError};
use crate::guestbook_entry::{AttachedImage, DraftEntry, Field, Rating};
use crate::image::{load_image, MAX_IMAGE_BYTES};
use crate::transport::Transport;

pub const NETWORK_FAILURE_MESSAGE: &str =
    "Failed to send data. Please check your internet connection.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(String),
}

/// A serialized snapshot ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub endpoint: Url,
    pub body: String,
}

/// Why `begin_submit` did not hand out a [`Submission`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitRejected {
    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error(transparent)]
    Invalid(#[from] FormError),

    #[error(transparent)]
    Misconfigured(ConfigError),

    #[error("failed to serialize entry: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct FormController {
    draft: DraftEntry,
    status: Status,
    endpoint: Result<Url, ConfigError>,
}

impl FormController {
    pub fn new(endpoint: Result<Url, ConfigError>) -> Self {
        FormController {
            draft: DraftEntry::new(),
            status: Status::Idle,
            endpoint,
        }
    }

    pub fn draft(&self) -> &DraftEntry {
        &self.draft
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.status == Status::Submitting
    }

    pub fn set_text(&mut self, field: Field, value: String) {
        tracing::debug!(?field, len = value.len(), "Field updated");
        match field {
            Field::Name => self.draft.name = value,
            Field::Message => self.draft.message = value,
            Field::Date => {
                tracing::warn!("Ignoring free-text date entry; use the date picker");
            }
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        tracing::debug!(%date, "Date picked");
        self.draft.date = Some(date);
    }

    pub fn set_rating(&mut self, rating: Rating) {
        tracing::debug!(rating = rating.get(), "Rating selected");
        self.draft.rating = rating;
    }

    pub fn attach_image(&mut self, image: AttachedImage) {
        tracing::info!(file = %image.file_name, bytes = image.data_url.len(), "Photo attached");
        self.draft.image = Some(image.data_url);
        self.draft.image_name = image.file_name;
    }

    pub fn clear_image(&mut self) {
        self.draft.image = None;
        self.draft.image_name.clear();
    }

    /// Load and attach in one step. On error nothing changes.
    pub async fn attach_image_from(&mut self, path: &Path) -> Result<(), FormError> {
        let image = load_image(path, MAX_IMAGE_BYTES).await.inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Photo rejected");
        })?;
        self.attach_image(image);
        Ok(())
    }

    /// Move to `Submitting` and hand out the serialized snapshot.
    ///
    /// Missing fields and an in-flight request leave the status as it is.
    /// A misconfigured endpoint becomes an inline `Error` status.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitRejected> {
        if self.is_submitting() {
            tracing::debug!("Submit ignored while a request is in flight");
            return Err(SubmitRejected::AlreadySubmitting);
        }

        if let Some(field) = self.draft.missing_required() {
            return Err(FormError::MissingField(field).into());
        }

        let endpoint = match &self.endpoint {
            Ok(url) => url.clone(),
            Err(e) => {
                tracing::error!(error = %e, "Submission blocked by configuration");
                self.status = Status::Error(e.to_string());
                return Err(SubmitRejected::Misconfigured(e.clone()));
            }
        };

        let body = self.draft.to_payload()?;
        self.status = Status::Submitting;
        tracing::info!(bytes = body.len(), "Submitting guestbook entry");

        Ok(Submission { endpoint, body })
    }

    /// Apply the outcome of the request started by `begin_submit`.
    pub fn finish_submit(&mut self, outcome: Result<(), TransportError>) {
        if !self.is_submitting() {
            tracing::warn!(status = ?self.status, "Delivery finished with no submission in flight");
            return;
        }

        match outcome {
            Ok(()) => {
                tracing::info!("Guestbook entry delivered");
                self.status = Status::Success;
                self.draft = DraftEntry::new();
            }
            Err(e) => {
                tracing::error!(error = %e, "Submission error");
                self.status = Status::Error(NETWORK_FAILURE_MESSAGE.to_string());
            }
        }
    }

    pub async fn submit<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
    ) -> Result<(), SubmitRejected> {
        let submission = self.begin_submit()?;
        let outcome = transport
            .deliver(&submission.endpoint, submission.body)
            .await;
        self.finish_submit(outcome);
        Ok(())
    }

    /// "Write another": leave the thank-you state for a fresh form.
    pub fn acknowledge_success(&mut self) {
        if self.status == Status::Success {
            self.status = Status::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn endpoint() -> Result<Url, ConfigError> {
        Ok(Url::parse("http://guestbook.test/exec").unwrap())
    }

    fn filled() -> FormController {
        let mut controller = FormController::new(endpoint());
        controller.set_text(Field::Name, "Meera".into());
        controller.set_date(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap());
        controller.set_text(Field::Message, "Wonderful evening".into());
        controller
    }

    #[test]
    fn starts_idle_with_empty_draft() {
        let controller = FormController::new(endpoint());
        assert_eq!(controller.status(), &Status::Idle);
        assert_eq!(controller.draft(), &DraftEntry::new());
        assert_eq!(controller.draft().rating.get(), 5);
    }

    #[test]
    fn rating_touches_only_rating() {
        for value in 1..=5 {
            let mut controller = filled();
            let before = controller.draft().clone();

            controller.set_rating(Rating::new(value).unwrap());

            let after = controller.draft();
            assert_eq!(after.rating.get(), value);
            assert_eq!(
                DraftEntry {
                    rating: before.rating,
                    ..after.clone()
                },
                before
            );
        }
    }

    #[test]
    fn date_cannot_be_typed() {
        let mut controller = FormController::new(endpoint());
        controller.set_text(Field::Date, "2024-01-01".into());
        assert_eq!(controller.draft().date, None);
    }

    #[test]
    fn begin_submit_blocks_missing_fields() {
        let mut controller = FormController::new(endpoint());
        controller.set_text(Field::Name, "Meera".into());

        assert_matches!(
            controller.begin_submit(),
            Err(SubmitRejected::Invalid(FormError::MissingField(Field::Date)))
        );
        assert_eq!(controller.status(), &Status::Idle);
    }

    #[test]
    fn begin_submit_is_not_reentrant() {
        let mut controller = filled();
        let submission = controller.begin_submit().unwrap();
        assert_eq!(submission.endpoint.as_str(), "http://guestbook.test/exec");
        assert_eq!(controller.status(), &Status::Submitting);

        assert_matches!(
            controller.begin_submit(),
            Err(SubmitRejected::AlreadySubmitting)
        );
    }

    #[test]
    fn misconfigured_endpoint_becomes_inline_error() {
        let mut controller = FormController::new(Err(ConfigError::PlaceholderEndpoint));
        controller.set_text(Field::Name, "Meera".into());
        controller.set_date(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap());
        controller.set_text(Field::Message, "Hi".into());

        assert_matches!(
            controller.begin_submit(),
            Err(SubmitRejected::Misconfigured(ConfigError::PlaceholderEndpoint))
        );
        assert_matches!(controller.status(), Status::Error(msg) if msg.contains("placeholder"));
        assert_eq!(controller.draft().name, "Meera");
    }

    #[test]
    fn stray_completion_is_ignored() {
        let mut controller = filled();
        controller.finish_submit(Ok(()));
        assert_eq!(controller.status(), &Status::Idle);
        assert_eq!(controller.draft().name, "Meera");
    }

    #[test]
    fn success_resets_and_write_another_returns_to_idle() {
        let mut controller = filled();
        controller.begin_submit().unwrap();
        controller.finish_submit(Ok(()));

        assert_eq!(controller.status(), &Status::Success);
        assert_eq!(controller.draft(), &DraftEntry::new());

        controller.acknowledge_success();
        assert_eq!(controller.status(), &Status::Idle);
    }

    #[test]
    fn rejection_keeps_draft() {
        let mut controller = filled();
        controller.begin_submit().unwrap();
        controller.finish_submit(Err(TransportError::Rejected { status: 500 }));

        assert_eq!(
            controller.status(),
            &Status::Error(NETWORK_FAILURE_MESSAGE.to_string())
        );
        assert_eq!(controller.draft().message, "Wonderful evening");
    }

    #[test]
    fn clear_image_empties_both_fields() {
        let mut controller = filled();
        controller.attach_image(AttachedImage {
            file_name: "a.png".into(),
            data_url: "data:image/png;base64,AA==".into(),
        });
        controller.clear_image();
        assert_eq!(controller.draft().image, None);
        assert_eq!(controller.draft().image_name, "");
    }
}
