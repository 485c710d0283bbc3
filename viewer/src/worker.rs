use crate::buffer::DemoBuffer;
use analysis::timeline::Config;
use analysis::{BuildError, CachedDemoData};

/// Messages from a background parse. A parse sends any number of progress updates
/// followed by exactly one of the terminal messages.
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(f32),
    Failed(BuildError),
    Done(Box<CachedDemoData>),
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Parses `buffer` on the blocking thread pool. Dropping the receiver abandons the
/// parse, it stops at the next progress update.
pub fn spawn(
    buffer: DemoBuffer,
    config: Config,
) -> tokio::sync::mpsc::UnboundedReceiver<WorkerMessage> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<WorkerMessage>();

    // created here so the worker logs under the span of whoever started it
    let span = tracing::debug_span!("Worker", bytes = buffer.len());
    tokio::task::spawn_blocking(move || {
        let _guard = span.entered();

        let result = analysis::parse(buffer.data(), &config, |fraction| {
            match tx.send(WorkerMessage::Progress(fraction)) {
                Ok(()) => std::ops::ControlFlow::Continue(()),
                Err(_) => std::ops::ControlFlow::Break(()),
            }
        });
        drop(buffer);

        let message = match result {
            Ok(data) => WorkerMessage::Done(Box::new(data)),
            Err(BuildError::Cancelled) => {
                tracing::debug!("Parse abandoned");
                return;
            }
            Err(e) => {
                tracing::error!("Parsing demo: {}", e);
                WorkerMessage::Failed(e)
            }
        };

        if tx.send(message).is_err() {
            tracing::debug!("Parse result was not consumed");
        }
    });

    rx
}
