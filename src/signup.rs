//! Submission flow of the early-access form.
//!
//! The form validates locally, talks to the relay over HTTP and announces every successful
//! signup on a broadcast channel which the confirmation overlay subscribes to.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, ensure, Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use url::Url;

use crate::{
    contact::{ContactRequest, Invalid},
    relay::contact::Added,
};

pub const GENERIC_TOAST: &str = "Something went wrong. Please try again.";

#[async_trait]
pub trait Relay: Send + Sync {
    /// Returns the confirmation message of the relay.
    async fn submit(&self, request: &ContactRequest) -> Result<String>;
}

pub struct HttpRelay {
    client: Client,
    url: Url,
}

impl HttpRelay {
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder().user_agent("meeveem signup").build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn submit(&self, request: &ContactRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let added = response.json::<Added>().await?;

            ensure!(added.success, "Relay did not confirm the signup");

            Ok(added.message)
        } else {
            let error = response
                .json::<Failure>()
                .await
                .map_or_else(|_err| "Malformed response".to_owned(), |failure| failure.error);

            bail!("Relay answered with status {}: {}", status, error)
        }
    }
}

#[derive(Deserialize)]
struct Failure {
    error: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl SignupForm {
    fn to_request(&self, list_ids: &[i64]) -> ContactRequest {
        ContactRequest::new(&self.first_name, &self.last_name, &self.email, list_ids)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug)]
pub enum SubmitError {
    InFlight,
    Invalid(Invalid),
    Failed(Error),
}

impl SubmitError {
    /// Message shown to the user, if any.
    ///
    /// Nothing is shown while a submission is in flight as the submit control is disabled.
    pub fn toast(&self) -> Option<&'static str> {
        match self {
            Self::InFlight => None,
            Self::Invalid(invalid) => Some(invalid.message()),
            Self::Failed(_) => Some(GENERIC_TOAST),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InFlight => fmt.write_str("Submission already in flight"),
            Self::Invalid(invalid) => write!(fmt, "{}", invalid),
            Self::Failed(err) => write!(fmt, "Submission failed: {:#}", err),
        }
    }
}

pub struct EarlyAccess<R> {
    relay: R,
    list_ids: Vec<i64>,
    submitting: AtomicBool,
    success: broadcast::Sender<()>,
}

impl<R> EarlyAccess<R>
where
    R: Relay,
{
    pub fn new(relay: R, list_ids: Vec<i64>) -> Self {
        let (success, _) = broadcast::channel(16);

        Self {
            relay,
            list_ids,
            submitting: AtomicBool::new(false),
            success,
        }
    }

    /// Whether the submit control is currently disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn overlay(&self) -> SuccessOverlay {
        SuccessOverlay {
            signals: self.success.subscribe(),
            open: false,
            shown: 0,
        }
    }

    /// Submits the form to the relay.
    ///
    /// The form is cleared and the overlay signalled only on success. On any failure, the form
    /// keeps its contents so that it can be resubmitted.
    #[tracing::instrument(skip_all)]
    pub async fn submit(&self, form: &mut SignupForm) -> Result<String, SubmitError> {
        let _submitting = Submitting::acquire(&self.submitting).ok_or(SubmitError::InFlight)?;

        let request = form.to_request(&self.list_ids);

        if let Err(invalid) = request.clone().validate() {
            tracing::debug!("Rejected form: {}", invalid);

            return Err(SubmitError::Invalid(invalid));
        }

        match self.relay.submit(&request).await {
            Ok(message) => {
                tracing::info!("Signup accepted: {}", message);

                form.clear();
                // Nobody listening is fine, the overlay might not be mounted.
                let _ = self.success.send(());

                Ok(message)
            }
            Err(err) => {
                tracing::warn!("Signup failed: {:#}", err);

                Err(SubmitError::Failed(err))
            }
        }
    }
}

struct Submitting<'a>(&'a AtomicBool);

impl<'a> Submitting<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Confirmation shown after a successful signup.
pub struct SuccessOverlay {
    signals: broadcast::Receiver<()>,
    open: bool,
    shown: usize,
}

impl SuccessOverlay {
    /// Waits for the next successful signup and opens the overlay.
    ///
    /// Returns `false` once the form flow is gone.
    pub async fn wait(&mut self) -> bool {
        match self.signals.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {
                self.show();
                true
            }
            Err(RecvError::Closed) => false,
        }
    }

    /// Handles pending signals without waiting and returns whether the overlay was opened.
    pub fn poll(&mut self) -> bool {
        let mut opened = false;

        loop {
            match self.signals.try_recv() {
                Ok(()) => {
                    self.show();
                    opened = true;
                }
                // Missed signals collapse into a single showing.
                Err(TryRecvError::Lagged(_)) => {
                    self.show();
                    opened = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        opened
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// How often the overlay was opened so far.
    pub fn shown(&self) -> usize {
        self.shown
    }

    fn show(&mut self) {
        self.open = true;
        self.shown += 1;
    }
}
