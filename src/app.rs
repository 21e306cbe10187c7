use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::config::Shell;
use crate::error::{FormError, TransportError};
use crate::form_state::FormController;
use crate::guestbook_entry::AttachedImage;
use crate::image::{load_image, MAX_IMAGE_BYTES};
use crate::input::{Effect, ViewState};
use crate::transport::Transport;
use crate::ui::UI;

/// Results of background work, delivered back to the UI task.
#[derive(Debug)]
pub enum Completion {
    ImageLoaded(Result<AttachedImage, FormError>),
    Delivered(Result<(), TransportError>),
}

pub struct App<T> {
    shell: Shell,
    controller: FormController,
    view: ViewState,
    transport: Arc<T>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<T: Transport + 'static> App<T> {
    pub fn new(shell: Shell, controller: FormController, transport: T, today: NaiveDate) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        App {
            shell,
            controller,
            view: ViewState::new(today),
            transport: Arc::new(transport),
            tx,
            rx,
        }
    }

    pub async fn run(mut self, ui: &mut UI) -> Result<()> {
        let mut events = EventStream::new();

        loop {
            ui.draw(&self.shell, &self.controller, &self.view)?;

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(effect) = self.view.handle_key(key, &mut self.controller) {
                            if self.dispatch(effect).is_break() {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(completion) = self.rx.recv() => self.apply(completion),
            }
        }

        tracing::info!("Guestbook closed");
        Ok(())
    }

    /// Start the background work an effect asks for.
    fn dispatch(&self, effect: Effect) -> ControlFlow<()> {
        match effect {
            Effect::Quit => return ControlFlow::Break(()),
            Effect::LoadImage(path) => {
                tracing::info!(path = %path.display(), "Reading photo");
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let loaded = load_image(&path, MAX_IMAGE_BYTES).await;
                    let _ = tx.send(Completion::ImageLoaded(loaded));
                });
            }
            Effect::Deliver(submission) => {
                let tx = self.tx.clone();
                let transport = Arc::clone(&self.transport);
                tokio::spawn(async move {
                    let outcome = transport
                        .deliver(&submission.endpoint, submission.body)
                        .await;
                    let _ = tx.send(Completion::Delivered(outcome));
                });
            }
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::ImageLoaded(Ok(image)) => self.controller.attach_image(image),
            Completion::ImageLoaded(Err(e)) => {
                tracing::warn!(error = %e, "Photo rejected");
                self.view.alert(e.to_string());
            }
            Completion::Delivered(outcome) => self.controller.finish_submit(outcome),
        }
    }
}
