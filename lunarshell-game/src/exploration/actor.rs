//! Tokio driver: one task owns the session and serializes commands with timer firings.
use super::{ChoiceOutcome, CombatFollowUp, ExplorationSession, SessionSnapshot, TickToken};
use crate::entry::EntryId;
use crate::error::{ChoiceError, CombatFlowError};
use crate::player::PlayerPort;
use crate::ports::{Clock, Connectivity, Storage};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

const COMMAND_BUFFER: usize = 32;

/// Failures reported by a [`SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("exploration task has shut down")]
    Closed,
    #[error(transparent)]
    Choice(#[from] ChoiceError),
    #[error(transparent)]
    Combat(#[from] CombatFlowError),
}

/// Clock that follows tokio's time source, so paused-time tests drive it too.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    origin_epoch_ms: u64,
}

impl TokioClock {
    #[must_use]
    pub fn starting_at(epoch_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            origin_epoch_ms: epoch_ms,
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.origin_epoch_ms.saturating_add(elapsed)
    }
}

enum Command {
    Start(oneshot::Sender<bool>),
    Stop(oneshot::Sender<bool>),
    Pause(oneshot::Sender<bool>),
    Resume(oneshot::Sender<bool>),
    ResolveChoice {
        entry_id: EntryId,
        option_id: String,
        reply: oneshot::Sender<Result<ChoiceOutcome, ChoiceError>>,
    },
    ResolveCombat {
        entry_id: EntryId,
        reply: oneshot::Sender<Result<CombatFollowUp, CombatFlowError>>,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a session running on its own task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

/// Move `session` onto a tokio task and return a handle to it.
pub fn spawn_session<S, N, P, K>(session: ExplorationSession<S, N, P, K>) -> SessionHandle
where
    S: Storage + Send + 'static,
    N: Connectivity + Send + 'static,
    P: PlayerPort + Send + 'static,
    K: Clock + Send + 'static,
{
    let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(run(session, inbox));
    SessionHandle { commands }
}

async fn run<S, N, P, K>(
    mut session: ExplorationSession<S, N, P, K>,
    mut inbox: mpsc::Receiver<Command>,
) where
    S: Storage,
    N: Connectivity,
    P: PlayerPort,
    K: Clock,
{
    loop {
        let deadline = session.next_deadline().map(|(token, due_ms)| {
            let wait = due_ms.saturating_sub(session.services.clock.now_ms());
            (token, Instant::now() + Duration::from_millis(wait))
        });
        let timer = async {
            match deadline {
                Some((token, at)) => {
                    sleep_until(at).await;
                    token
                }
                None => std::future::pending::<TickToken>().await,
            }
        };

        tokio::select! {
            command = inbox.recv() => {
                let Some(command) = command else {
                    break;
                };
                if !handle(&mut session, command) {
                    break;
                }
            }
            token = timer => {
                session.fire(token);
            }
        }
    }
    log::debug!("exploration task finished");
}

fn handle<S, N, P, K>(session: &mut ExplorationSession<S, N, P, K>, command: Command) -> bool
where
    S: Storage,
    N: Connectivity,
    P: PlayerPort,
    K: Clock,
{
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Start(reply) => drop(reply.send(session.start())),
        Command::Stop(reply) => drop(reply.send(session.stop())),
        Command::Pause(reply) => drop(reply.send(session.pause())),
        Command::Resume(reply) => drop(reply.send(session.resume())),
        Command::ResolveChoice {
            entry_id,
            option_id,
            reply,
        } => drop(reply.send(session.resolve_choice(&entry_id, &option_id))),
        Command::ResolveCombat { entry_id, reply } => {
            drop(reply.send(session.resolve_combat(&entry_id)));
        }
        Command::Snapshot(reply) => drop(reply.send(session.snapshot())),
        Command::Shutdown(reply) => {
            session.stop();
            drop(reply.send(()));
            return false;
        }
    }
    true
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, HandleError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| HandleError::Closed)?;
        response.await.map_err(|_| HandleError::Closed)
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task has ended.
    pub async fn start(&self) -> Result<bool, HandleError> {
        self.request(Command::Start).await
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task has ended.
    pub async fn stop(&self) -> Result<bool, HandleError> {
        self.request(Command::Stop).await
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task has ended.
    pub async fn pause(&self) -> Result<bool, HandleError> {
        self.request(Command::Pause).await
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task has ended.
    pub async fn resume(&self) -> Result<bool, HandleError> {
        self.request(Command::Resume).await
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Choice`] when the session rejects the choice, or
    /// [`HandleError::Closed`] if the session task has ended.
    pub async fn resolve_choice(
        &self,
        entry_id: EntryId,
        option_id: impl Into<String>,
    ) -> Result<ChoiceOutcome, HandleError> {
        let option_id = option_id.into();
        self.request(|reply| Command::ResolveChoice {
            entry_id,
            option_id,
            reply,
        })
        .await?
        .map_err(HandleError::from)
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Combat`] when the entry cannot be fought, or
    /// [`HandleError::Closed`] if the session task has ended.
    pub async fn resolve_combat(&self, entry_id: EntryId) -> Result<CombatFollowUp, HandleError> {
        self.request(|reply| Command::ResolveCombat { entry_id, reply })
            .await?
            .map_err(HandleError::from)
    }

    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task has ended.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, HandleError> {
        self.request(Command::Snapshot).await
    }

    /// Stop the run and end the task.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Closed`] if the session task had already ended.
    pub async fn shutdown(&self) -> Result<(), HandleError> {
        self.request(Command::Shutdown).await
    }
}
