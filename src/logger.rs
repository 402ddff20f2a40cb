//! §4.H: periodic, append-only snapshots of the root node, independent of
//! the `log` crate's diagnostic stream. Emission is triggered by whichever
//! fires first: a trial-count delta or a wall-time delta; missed triggers
//! are not batched (§4.H). Writers serialise through `logging_lock`, the
//! pool's second lock (§4.G).

use crate::env::Environment;
use crate::manager::Manager;
use crate::node::DecisionNode;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

struct LoggerState {
    writer: Box<dyn Write + Send>,
    header_written: bool,
    last_logged_time: Instant,
}

/// A CSV-like writer: `runtime_seconds, num_trials, num_backups, avg_return`
/// for UCB-family runs, with `soft_value, subtree_entropy` appended for the
/// softmax family (§6 "Logger output").
pub struct Logger {
    trial_interval: u64,
    time_interval: std::time::Duration,
    last_logged_trial: AtomicU64,
    started: Instant,
    state: Mutex<LoggerState>,
}

impl Logger {
    pub fn new(writer: Box<dyn Write + Send>, trial_interval: u64, time_interval: std::time::Duration) -> Self {
        Self {
            trial_interval: trial_interval.max(1),
            time_interval,
            last_logged_trial: AtomicU64::new(0),
            started: Instant::now(),
            state: Mutex::new(LoggerState {
                writer,
                header_written: false,
                last_logged_time: Instant::now(),
            }),
        }
    }

    pub fn stdout(trial_interval: u64, time_interval: std::time::Duration) -> Self {
        Self::new(Box::new(std::io::stdout()), trial_interval, time_interval)
    }

    fn should_log(&self, completed_trials: u64) -> bool {
        let last_trial = self.last_logged_trial.load(Ordering::SeqCst);
        if completed_trials.saturating_sub(last_trial) >= self.trial_interval {
            return true;
        }
        let state = self.state.lock().unwrap();
        state.last_logged_time.elapsed() >= self.time_interval
    }

    pub fn maybe_log<Env: Environment>(
        &self,
        completed_trials: u64,
        manager: &Manager<Env>,
        root: &DecisionNode<Env>,
    ) {
        if !self.should_log(completed_trials) {
            return;
        }
        self.last_logged_trial.store(completed_trials, Ordering::SeqCst);

        let (avg_return, soft_value) =
            root.with_inner(|inner| (inner.empirical_mean, inner.soft_value));
        let num_backups = root.get_num_backups();
        let runtime = self.started.elapsed().as_secs_f64();

        let mut state = self.state.lock().unwrap();
        state.last_logged_time = Instant::now();
        if !state.header_written {
            let header = if manager.config.algorithm.is_softmax_family() {
                "runtime_seconds,num_trials,num_backups,avg_return,soft_value,subtree_entropy\n"
            } else {
                "runtime_seconds,num_trials,num_backups,avg_return\n"
            };
            let _ = state.writer.write_all(header.as_bytes());
            state.header_written = true;
        }

        let line = if manager.config.algorithm.is_softmax_family() {
            let subtree_entropy = root.with_inner(|inner| inner.subtree_entropy);
            format!("{runtime:.3},{completed_trials},{num_backups},{avg_return:.6},{soft_value:.6},{subtree_entropy:.6}\n")
        } else {
            format!("{runtime:.3},{completed_trials},{num_backups},{avg_return:.6}\n")
        };
        let _ = state.writer.write_all(line.as_bytes());
        let _ = state.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::env::demo::ChainEnv;
    use std::sync::Arc;

    #[test]
    fn logs_header_once_and_respects_trial_interval() {
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        struct SharedBuf(Arc<Mutex<Vec<u8>>>);
        impl Write for SharedBuf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let logger = Logger::new(Box::new(SharedBuf(buf.clone())), 10, std::time::Duration::from_secs(3600));
        let config = SearchConfig { num_threads: 1, ..Default::default() };
        let env = Arc::new(ChainEnv::new(10));
        let manager = Manager::with_defaults(config, env.clone()).unwrap();
        let root = DecisionNode::root(env.initial_state());
        root.visit(&manager);

        logger.maybe_log(1, &manager, &root);
        logger.maybe_log(5, &manager, &root);
        logger.maybe_log(10, &manager, &root);

        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("runtime_seconds").count(), 1);
        assert_eq!(text.lines().count(), 2);
    }
}
