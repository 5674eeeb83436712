//! Dispatch of a conversion by id, delivery of its artifact, and
//! start/success/failure notifications.
//!
//! [`Dispatcher::run`] is the boundary where errors stop: every failure is
//! turned into a single user-facing message and never propagates further.

use crate::converter::{ConversionKind, Converter, OutputArtifact};
use crate::error::{ConversionError, Result};
use crate::source::ByteSource;
use tracing::{error, info};

/// Hands a finished artifact to the outside world (e.g. a browser
/// download). Takes the artifact by value: it is not retained afterwards.
pub trait Delivery {
    fn deliver(&self, artifact: OutputArtifact) -> Result<()>;
}

/// Presentation hooks called at fixed points of a dispatch.
pub trait ConversionObserver {
    fn on_start(&self, _kind: ConversionKind, _source_name: &str) {}
    fn on_success(&self, _filename: &str) {}
    fn on_failure(&self, _message: &str) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl ConversionObserver for SilentObserver {}

/// Observer that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ConversionObserver for LogObserver {
    fn on_start(&self, kind: ConversionKind, source_name: &str) {
        info!("Starting {} for {}", kind, source_name);
    }

    fn on_success(&self, filename: &str) {
        info!("Delivered {}", filename);
    }

    fn on_failure(&self, message: &str) {
        error!("{}", message);
    }
}

/// What a dispatch ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Delivered { filename: String },
    Failed { message: String },
}

impl ConversionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ConversionOutcome::Delivered { .. })
    }
}

/// Resolves a conversion id, runs it, delivers the result and notifies.
pub struct Dispatcher<'a, D: Delivery, O: ConversionObserver = SilentObserver> {
    converter: &'a Converter,
    delivery: D,
    observer: O,
}

impl<'a, D: Delivery> Dispatcher<'a, D> {
    pub fn new(converter: &'a Converter, delivery: D) -> Self {
        Self {
            converter,
            delivery,
            observer: SilentObserver,
        }
    }
}

impl<'a, D: Delivery, O: ConversionObserver> Dispatcher<'a, D, O> {
    /// Replace the observer.
    pub fn with_observer<P: ConversionObserver>(self, observer: P) -> Dispatcher<'a, D, P> {
        Dispatcher {
            converter: self.converter,
            delivery: self.delivery,
            observer,
        }
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Run the conversion registered under `kind_id` on `source`.
    pub async fn run<S: ByteSource + ?Sized>(&self, kind_id: &str, source: &S) -> ConversionOutcome {
        match self.try_run(kind_id, source).await {
            Ok(filename) => {
                self.observer.on_success(&filename);
                ConversionOutcome::Delivered { filename }
            }
            Err(e) => {
                let message = e.user_message();
                self.observer.on_failure(&message);
                ConversionOutcome::Failed { message }
            }
        }
    }

    async fn try_run<S: ByteSource + ?Sized>(&self, kind_id: &str, source: &S) -> Result<String> {
        let kind = ConversionKind::from_id(kind_id)?;
        self.observer.on_start(kind, source.name());
        let artifact = self.converter.convert(kind, source).await?;
        let filename = artifact.filename.clone();
        self.delivery.deliver(artifact)?;
        Ok(filename)
    }
}

/// Delivery that fails every time; useful where no download target exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelivery;

impl Delivery for NoDelivery {
    fn deliver(&self, artifact: OutputArtifact) -> Result<()> {
        Err(ConversionError::InvalidConfig(format!(
            "no delivery target for {}",
            artifact.filename
        )))
    }
}
