//! Arena task: owns the Arena, drives the fixed-rate tick and routes outbound messages

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::{ClientMsg, PlayerCounts, ServerMsg};

use super::arena::{Arena, Outbound, Recipient};

/// Outbound queue depth per session
pub const SESSION_QUEUE_CAPACITY: usize = 256;

/// Commands from sessions and HTTP handlers to the arena task
#[derive(Debug)]
pub enum ArenaCommand {
    Connect {
        session_id: Uuid,
        outbound: mpsc::Sender<ServerMsg>,
    },
    Client {
        session_id: Uuid,
        msg: ClientMsg,
    },
    Disconnect {
        session_id: Uuid,
    },
    QueryCounts {
        reply: oneshot::Sender<PlayerCounts>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("Arena task is not running")]
pub struct ArenaClosed;

/// Read-only figures published by the arena task
#[derive(Debug, Default)]
pub struct ArenaStats {
    players: AtomicUsize,
    tick: AtomicU64,
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    command_tx: mpsc::Sender<ArenaCommand>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    pub async fn connect(
        &self,
        session_id: Uuid,
        outbound: mpsc::Sender<ServerMsg>,
    ) -> Result<(), ArenaClosed> {
        self.send(ArenaCommand::Connect {
            session_id,
            outbound,
        })
        .await
    }

    pub async fn client_msg(&self, session_id: Uuid, msg: ClientMsg) -> Result<(), ArenaClosed> {
        self.send(ArenaCommand::Client { session_id, msg }).await
    }

    pub async fn disconnect(&self, session_id: Uuid) -> Result<(), ArenaClosed> {
        self.send(ArenaCommand::Disconnect { session_id }).await
    }

    pub async fn counts(&self) -> Result<PlayerCounts, ArenaClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(ArenaCommand::QueryCounts { reply }).await?;
        rx.await.map_err(|_| ArenaClosed)
    }

    pub fn player_count(&self) -> usize {
        self.stats.players.load(Ordering::Relaxed)
    }

    pub fn current_tick(&self) -> u64 {
        self.stats.tick.load(Ordering::Relaxed)
    }

    async fn send(&self, command: ArenaCommand) -> Result<(), ArenaClosed> {
        self.command_tx.send(command).await.map_err(|_| ArenaClosed)
    }
}

/// The single owner of the arena state
pub struct ArenaTask {
    arena: Arena,
    command_rx: mpsc::Receiver<ArenaCommand>,
    sessions: HashMap<Uuid, mpsc::Sender<ServerMsg>>,
    stats: Arc<ArenaStats>,
}

impl ArenaTask {
    pub fn new(config: Arc<GameConfig>, seed: u64) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(1024);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            command_tx,
            stats: stats.clone(),
        };

        let task = Self {
            arena: Arena::new(config, seed),
            command_rx,
            sessions: HashMap::new(),
            stats,
        };

        (task, handle)
    }

    /// Run the authoritative tick loop until every handle is dropped
    pub async fn run(mut self) {
        let tick_duration = self.arena.config().tick_interval;
        info!(tick_ms = tick_duration.as_secs_f32() * 1000.0, "Arena started");

        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    self.arena.tick();
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
            self.flush();
        }

        let (deltas_sent, idle_ticks) = self.arena.delta_stats();
        info!(
            ticks = self.arena.current_tick(),
            deltas_sent,
            idle_ticks,
            "Arena stopped"
        );
    }

    fn handle_command(&mut self, command: ArenaCommand) {
        match command {
            ArenaCommand::Connect {
                session_id,
                outbound,
            } => {
                self.sessions.insert(session_id, outbound);
                self.arena.connect(session_id);
            }
            ArenaCommand::Client { session_id, msg } => {
                if self.sessions.contains_key(&session_id) {
                    self.arena.handle(session_id, msg);
                } else {
                    debug!(session_id = %session_id, "Message from unknown session dropped");
                }
            }
            ArenaCommand::Disconnect { session_id } => {
                self.sessions.remove(&session_id);
                self.arena.disconnect(session_id);
            }
            ArenaCommand::QueryCounts { reply } => {
                let _ = reply.send(self.arena.counts());
            }
        }
    }

    /// Deliver queued messages. Sessions that cannot keep up are disconnected.
    fn flush(&mut self) {
        loop {
            let outbox = self.arena.drain_outbox();
            if outbox.is_empty() {
                break;
            }

            let mut stalled = Vec::new();
            for Outbound { to, msg } in outbox {
                match to {
                    Recipient::All => {
                        for (id, tx) in &self.sessions {
                            if !deliver(*id, tx, msg.clone()) {
                                stalled.push(*id);
                            }
                        }
                    }
                    Recipient::Audience => {
                        for id in &self.arena.audience {
                            if let Some(tx) = self.sessions.get(id) {
                                if !deliver(*id, tx, msg.clone()) {
                                    stalled.push(*id);
                                }
                            }
                        }
                    }
                    Recipient::Session(id) => {
                        if let Some(tx) = self.sessions.get(&id) {
                            if !deliver(id, tx, msg) {
                                stalled.push(id);
                            }
                        }
                    }
                }
            }

            // removals emit further messages; the loop delivers them to whoever is left
            for id in stalled {
                if self.sessions.remove(&id).is_some() {
                    self.arena.disconnect(id);
                }
            }
        }

        self.stats
            .players
            .store(self.arena.player_count(), Ordering::Relaxed);
        self.stats
            .tick
            .store(self.arena.current_tick(), Ordering::Relaxed);
    }
}

/// Queue one message for a session; false if the session must be dropped
fn deliver(session_id: Uuid, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) -> bool {
    match tx.try_send(msg) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(session_id = %session_id, "Client outbound queue full, disconnecting");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(session_id = %session_id, "Client outbound queue closed");
            false
        }
    }
}

/// Spawn the arena task and return its handle
pub fn spawn_arena(config: Arc<GameConfig>, seed: u64) -> ArenaHandle {
    let (task, handle) = ArenaTask::new(config, seed);
    tokio::spawn(task.run());
    handle
}
