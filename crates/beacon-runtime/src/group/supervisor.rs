use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use beacon_core::group::{Member, ReadySignal};
use beacon_core::{BeaconError, Result};

/// Process group configuration.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// How long to wait for members to exit once stop was requested.
    pub drain_timeout: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of waiting for a freshly spawned member.
enum Startup {
    Ready,
    Exited(Id, Result<()>),
    Cancelled,
}

/// Supervises an ordered list of members as one unit.
///
/// Members start one at a time in list order; the next member is spawned
/// only after the previous one signalled readiness. Any member exit that
/// was not caused by a stop request aborts the whole group.
pub struct ProcessGroup {
    members: Vec<Member>,
    config: GroupConfig,
}

impl ProcessGroup {
    /// Create a new process group.
    pub fn new(members: Vec<Member>, config: GroupConfig) -> Self {
        Self { members, config }
    }

    /// Member names in start order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Start all members and supervise them until `shutdown` fires or a
    /// member dies. Returns once every started member has exited.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let ProcessGroup { members, config } = self;
        let stop = shutdown.child_token();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();
        let mut failures: Vec<String> = Vec::new();
        let mut stop_requested = false;

        for member in members {
            let (name, runner) = member.into_parts();
            let (ready, ready_rx) = ReadySignal::channel();

            tracing::info!(member = %name, "Starting member");
            let handle = tasks.spawn(runner.run(stop.clone(), ready));
            names.insert(handle.id(), name.clone());

            match await_ready(ready_rx, &mut tasks, &shutdown).await {
                Startup::Ready => {
                    tracing::info!(member = %name, "Member ready");
                }
                Startup::Exited(id, result) => {
                    let exited = take_name(&mut names, id);
                    let failure = if id == handle.id() {
                        startup_failure(&exited, result)
                    } else {
                        running_failure(exited, result)
                    };
                    failures.push(failure);
                    break;
                }
                Startup::Cancelled => {
                    tracing::info!(member = %name, "Stop requested during startup");
                    stop_requested = true;
                    break;
                }
            }
        }

        if failures.is_empty() && !stop_requested {
            tracing::info!(members = names.len(), "Process group started");

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Stop requested, stopping members");
                }
                Some(joined) = tasks.join_next_with_id() => {
                    let (name, result) = resolve_exit(&mut names, joined);
                    failures.push(running_failure(name, result));
                }
            }
        }

        stop.cancel();
        failures.extend(drain(&mut tasks, &mut names, config.drain_timeout).await);

        if failures.is_empty() {
            tracing::info!("Process group stopped");
            Ok(())
        } else {
            tracing::error!(failures = failures.len(), "Process group aborted");
            Err(BeaconError::GroupAborted(failures))
        }
    }
}

/// Wait for every remaining member to exit, aborting stragglers after the drain timeout.
async fn drain(
    tasks: &mut JoinSet<Result<()>>,
    names: &mut HashMap<Id, String>,
    timeout: Duration,
) -> Vec<String> {
    let mut failures = Vec::new();

    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = tasks.join_next_with_id().await {
            let (name, result) = resolve_exit(names, joined);
            match result {
                Ok(()) => tracing::info!(member = %name, "Member stopped"),
                Err(e) => failures.push(member_failure(&name, e)),
            }
        }
    })
    .await;

    if drained.is_err() {
        let mut stragglers: Vec<String> = names.drain().map(|(_, name)| name).collect();
        stragglers.sort();
        tracing::warn!(
            remaining = stragglers.len(),
            "Drain timeout reached, aborting members"
        );
        tasks.shutdown().await;
        for name in stragglers {
            failures.push(format!("Member {} did not stop within drain timeout", name));
        }
    }

    failures
}

/// Wait until the newest member is ready, any member exits, or a stop is requested.
async fn await_ready(
    mut ready_rx: oneshot::Receiver<()>,
    tasks: &mut JoinSet<Result<()>>,
    shutdown: &CancellationToken,
) -> Startup {
    let mut ready_pending = true;

    loop {
        tokio::select! {
            biased;
            Some(joined) = tasks.join_next_with_id() => {
                return match joined {
                    Ok((id, result)) => Startup::Exited(id, result),
                    Err(e) => Startup::Exited(e.id(), Err(join_failure(&e))),
                };
            }
            ready = &mut ready_rx, if ready_pending => {
                match ready {
                    Ok(()) => return Startup::Ready,
                    // signal dropped; the exit will show up on the join set
                    Err(_) => ready_pending = false,
                }
            }
            _ = shutdown.cancelled() => return Startup::Cancelled,
        }
    }
}

fn resolve_exit(
    names: &mut HashMap<Id, String>,
    joined: std::result::Result<(Id, Result<()>), JoinError>,
) -> (String, Result<()>) {
    match joined {
        Ok((id, result)) => (take_name(names, id), result),
        Err(e) => (take_name(names, e.id()), Err(join_failure(&e))),
    }
}

fn take_name(names: &mut HashMap<Id, String>, id: Id) -> String {
    names.remove(&id).unwrap_or_else(|| "unknown".to_string())
}

fn join_failure(e: &JoinError) -> BeaconError {
    if e.is_panic() {
        BeaconError::Internal("member panicked".to_string())
    } else {
        BeaconError::Internal("member task cancelled".to_string())
    }
}

fn startup_failure(name: &str, result: Result<()>) -> String {
    match result {
        Ok(()) => BeaconError::MemberNotReady(name.to_string()).to_string(),
        Err(e) => member_failure(name, e),
    }
}

fn running_failure(name: String, result: Result<()>) -> String {
    match result {
        Ok(()) => BeaconError::MemberExited(name).to_string(),
        Err(e) => member_failure(&name, e),
    }
}

fn member_failure(name: &str, error: BeaconError) -> String {
    tracing::error!(member = %name, error = %error, "Member exited with error");
    BeaconError::MemberFailed {
        name: name.to_string(),
        reason: error.to_string(),
    }
    .to_string()
}
