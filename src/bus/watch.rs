//! # Standing signal subscriptions.
//!
//! A [`Watch`] describes which signals a producer cares about: object path
//! or path namespace, interface, one or more member names, positional
//! argument matches, or the canonical "any property changed" shortcut.
//!
//! [`Watch::start`] registers the match rules on the connection (one rule
//! set per member when members are given, otherwise one combined set) and
//! spawns a single listening task. The task receives every signal arriving
//! on the connection, discards signals whose path does not satisfy the
//! path / path-namespace condition and forwards the rest as [`Trigger`]
//! values. Cancelling the watch token removes the match rules and closes
//! the output queue.
//!
//! ## Example
//! ```no_run
//! # async fn demo(bus: hostlink::Bus, token: tokio_util::sync::CancellationToken)
//! #     -> Result<(), hostlink::BusError> {
//! use hostlink::Watch;
//!
//! let mut triggers = Watch::new()
//!     .path("/org/example/upower")
//!     .interface("org.example.UPower")
//!     .members(["DeviceAdded", "DeviceRemoved"])
//!     .start(token, &bus)
//!     .await?;
//!
//! while let Some(trigger) = triggers.recv().await {
//!     println!("{} on {}", trigger.signal, trigger.path);
//! }
//! # Ok(())
//! # }
//! ```

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::bus::connection::{Bus, MatchRule};
use crate::bus::value::BusValue;
use crate::bus::{PROP_CHANGED_MEMBER, PROP_INTERFACE};
use crate::error::BusError;

/// Output queue depth per watch.
const TRIGGER_QUEUE_CAPACITY: usize = 32;

/// One matched signal, delivered to exactly one watch subscriber.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    /// Fully-qualified name of the signal that fired.
    pub signal: String,
    /// Object path the signal was emitted from.
    pub path: String,
    /// Raw signal body.
    pub content: Vec<BusValue>,
}

/// Builder for a standing signal subscription.
#[derive(Clone, Debug, Default)]
pub struct Watch {
    path: Option<String>,
    path_namespace: Option<String>,
    matches: Vec<MatchRule>,
    members: Vec<String>,
}

impl Watch {
    /// Creates an empty watch. Add conditions with the builder methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches signals sent from or to the given object path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.matches.push(MatchRule::Path(path.clone()));
        self.path = Some(path);
        self
    }

    /// Matches signals whose object path is the given value or any path
    /// below it.
    pub fn path_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.matches
            .push(MatchRule::PathNamespace(namespace.clone()));
        self.path_namespace = Some(namespace);
        self
    }

    /// Matches signals on the given interface.
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.matches.push(MatchRule::Interface(interface.into()));
        self
    }

    /// Matches signals with any of the given member names. Each member
    /// generates a separate match rule set when the watch starts.
    pub fn members<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.extend(names.into_iter().map(Into::into));
        self
    }

    /// Matches on the value of a positional argument in the signal body.
    pub fn arg(mut self, index: u8, value: impl Into<String>) -> Self {
        self.matches.push(MatchRule::Arg(index, value.into()));
        self
    }

    /// Matches signals whose first argument is a name under the given
    /// namespace.
    pub fn arg0_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.matches
            .push(MatchRule::Arg0Namespace(namespace.into()));
        self
    }

    /// Canonical "any property changed" shortcut: matches the
    /// properties-changed signal of the standard properties interface.
    pub fn properties_changed(mut self) -> Self {
        self.matches
            .push(MatchRule::Interface(PROP_INTERFACE.to_owned()));
        self.matches
            .push(MatchRule::Member(PROP_CHANGED_MEMBER.to_owned()));
        self
    }

    /// Builds the rule sets to register: one per member name when members
    /// were given, otherwise the combined conditions as a single set.
    fn rule_sets(&self) -> Vec<Vec<MatchRule>> {
        if self.members.is_empty() {
            return vec![self.matches.clone()];
        }

        self.members
            .iter()
            .map(|member| {
                let mut rules = self.matches.clone();
                rules.push(MatchRule::Member(member.clone()));
                rules
            })
            .collect()
    }

    /// Registers the match rules and starts the listening task.
    ///
    /// Returns the queue of [`Trigger`] values. The task exits, removes its
    /// match rules and closes the queue when `token` is cancelled.
    pub async fn start(
        self,
        token: CancellationToken,
        bus: &Bus,
    ) -> Result<mpsc::Receiver<Trigger>, BusError> {
        let conn = bus.connection()?.clone();
        let rule_sets = self.rule_sets();

        for (idx, rules) in rule_sets.iter().enumerate() {
            if let Err(err) = conn.add_match(rules).await {
                // Partial registration would leak rules; undo before failing.
                for added in &rule_sets[..idx] {
                    if let Err(remove_err) = conn.remove_match(added).await {
                        trace!(bus = %bus.kind(), rules = ?added, error = %remove_err, "unable to remove match rules");
                    }
                }
                return Err(err);
            }
            trace!(bus = %bus.kind(), ?rules, "added bus watch");
        }

        let (out_tx, out_rx) = mpsc::channel(TRIGGER_QUEUE_CAPACITY);
        let mut signals = conn.signals();
        let kind = bus.kind();

        tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    _ = token.cancelled() => break,
                    received = signals.recv() => match received {
                        Ok(signal) => signal,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            trace!(bus = %kind, skipped, "watch lagged behind signal stream");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                if let Some(path) = &self.path {
                    if signal.path != *path {
                        trace!(bus = %kind, signal = %signal.path, want = %path, "ignoring mismatched path");
                        continue;
                    }
                }

                if let Some(namespace) = &self.path_namespace {
                    if !signal.path.starts_with(namespace.as_str()) {
                        trace!(bus = %kind, signal = %signal.path, want = %namespace, "ignoring mismatched path namespace");
                        continue;
                    }
                }

                let trigger = Trigger {
                    signal: signal.name,
                    path: signal.path,
                    content: signal.body,
                };

                let delivered = tokio::select! {
                    _ = token.cancelled() => break,
                    sent = out_tx.send(trigger) => sent.is_ok(),
                };
                if !delivered {
                    break;
                }
            }

            for rules in &rule_sets {
                if let Err(err) = conn.remove_match(rules).await {
                    trace!(bus = %kind, ?rules, error = %err, "unable to remove match rules");
                }
            }
        });

        Ok(out_rx)
    }
}
